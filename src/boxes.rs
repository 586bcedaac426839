use crate::error::FieldError;
use crate::fixed::FixedPoint;
use crate::util::as_hex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

pub const HEADER_SIZE: u64 = 8;

#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    pub fn as_str_lossy(&self) -> String {
        self.0
            .iter()
            .map(|&c| if (32..=126).contains(&c) { c as char } else { '.' })
            .collect()
    }
}
impl FromStr for FourCC {
    type Err = FieldError;

    /// Exactly four bytes, e.g. `"moov"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <[u8; 4]>::try_from(s.as_bytes())
            .map(FourCC)
            .map_err(|_| FieldError::OutOfBounds {
                field: "fourcc",
                offset: 0,
                end: 4,
                available: s.len(),
            })
    }
}
impl fmt::Debug for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str_lossy())
    }
}
impl Serialize for FourCC {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.as_str_lossy())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BoxHeader {
    pub typ: FourCC,
    pub size: u32, // total size including the 8 byte header
    pub start: u64, // file offset of header start
}

impl BoxHeader {
    pub fn content_start(&self) -> u64 {
        self.start + HEADER_SIZE
    }

    pub fn content_len(&self) -> u64 {
        (self.size as u64).saturating_sub(HEADER_SIZE)
    }

    pub fn end(&self) -> u64 {
        self.start + self.size as u64
    }
}

/// Result of decoding one box's fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Decoded<T> {
    Valid(T),
    Invalid(FieldError),
}

/// A decoded box: shared header plus its typed payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node<T> {
    pub header: BoxHeader,
    pub decoded: Decoded<T>,
}

impl<T> Node<T> {
    pub fn valid(header: BoxHeader, value: T) -> Self {
        Self {
            header,
            decoded: Decoded::Valid(value),
        }
    }

    pub fn get(&self) -> Option<&T> {
        match &self.decoded {
            Decoded::Valid(v) => Some(v),
            Decoded::Invalid(_) => None,
        }
    }

    pub fn error(&self) -> Option<&FieldError> {
        match &self.decoded {
            Decoded::Valid(_) => None,
            Decoded::Invalid(e) => Some(e),
        }
    }
}

/// Closed set of box kinds the dispatcher can produce.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBox {
    Ftyp(Node<Ftyp>),
    Moov(Node<Moov>),
    Mvhd(Node<Mvhd>),
    Iods(Node<Iods>),
    Trak(Node<Trak>),
    Tkhd(Node<Tkhd>),
    Mdia(Node<Mdia>),
    Mdhd(Node<Mdhd>),
    Hdlr(Node<Hdlr>),
    Minf(Node<Minf>),
    Vmhd(Node<Vmhd>),
    Smhd(Node<Smhd>),
    Stbl(Node<Stbl>),
    Stsd(Node<Stsd>),
    /// No decoder registered for this tag; only the header is kept.
    Opaque(BoxHeader),
}

impl DecodedBox {
    pub fn header(&self) -> &BoxHeader {
        match self {
            DecodedBox::Ftyp(n) => &n.header,
            DecodedBox::Moov(n) => &n.header,
            DecodedBox::Mvhd(n) => &n.header,
            DecodedBox::Iods(n) => &n.header,
            DecodedBox::Trak(n) => &n.header,
            DecodedBox::Tkhd(n) => &n.header,
            DecodedBox::Mdia(n) => &n.header,
            DecodedBox::Mdhd(n) => &n.header,
            DecodedBox::Hdlr(n) => &n.header,
            DecodedBox::Minf(n) => &n.header,
            DecodedBox::Vmhd(n) => &n.header,
            DecodedBox::Smhd(n) => &n.header,
            DecodedBox::Stbl(n) => &n.header,
            DecodedBox::Stsd(n) => &n.header,
            DecodedBox::Opaque(h) => h,
        }
    }

    pub fn typ(&self) -> FourCC {
        self.header().typ
    }
}

// ---------- Leaf records ----------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ftyp {
    pub major_brand: FourCC,
    pub minor_version: FourCC,
    pub compatible_brands: Vec<FourCC>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mvhd {
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    pub rate: FixedPoint,
    pub volume: FixedPoint,
    pub next_track_id: u32,
}

impl Mvhd {
    pub fn duration_seconds(&self) -> Option<f64> {
        seconds(self.duration, self.timescale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Iods {
    #[serde(serialize_with = "as_hex")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tkhd {
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub track_id: u32,
    pub duration: u32,
    pub layer: i16,
    pub alternate_group: i16,
    pub volume: FixedPoint,
    /// Row-major `a b u / c d v / x y w`.
    pub matrix: [FixedPoint; 9],
    pub width: FixedPoint,
    pub height: FixedPoint,
}

/// ISO-639-2/T code packed as three 5-bit letters, plus the leading pad bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub code: u16,
    pub pad: bool,
}

impl Language {
    pub fn from_packed(raw: u16) -> Self {
        Self {
            code: raw & 0x7FFF,
            pad: raw & 0x8000 != 0,
        }
    }

    /// `"und"` for the all-zero code.
    pub fn to_iso639(&self) -> String {
        if self.code == 0 {
            return "und".to_string();
        }
        let c1 = ((self.code >> 10) & 0x1F) as u8 + 0x60;
        let c2 = ((self.code >> 5) & 0x1F) as u8 + 0x60;
        let c3 = (self.code & 0x1F) as u8 + 0x60;
        format!("{}{}{}", c1 as char, c2 as char, c3 as char)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_iso639())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mdhd {
    pub version: u8,
    pub flags: [u8; 3],
    pub creation_time: u32,
    pub modification_time: u32,
    pub timescale: u32,
    pub duration: u32,
    pub language: Language,
}

impl Mdhd {
    pub fn duration_seconds(&self) -> Option<f64> {
        seconds(self.duration, self.timescale)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Hdlr {
    pub version: u8,
    pub flags: [u8; 3],
    pub pre_defined: u32,
    pub handler_type: FourCC,
    pub track_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vmhd {
    pub version: u8,
    pub flags: [u8; 3],
    pub graphicsmode: u16,
    pub opcolor: [u16; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Smhd {
    pub version: u8,
    pub flags: [u8; 3],
    pub balance: i16,
}

/// Sample descriptions are not decoded; the entries stay raw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stsd {
    pub version: u8,
    pub flags: [u8; 3],
    pub entry_count: u32,
    #[serde(serialize_with = "as_hex")]
    pub entries: Vec<u8>,
}

// ---------- Containers ----------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Moov {
    pub mvhd: Option<Node<Mvhd>>,
    pub iods: Option<Node<Iods>>,
    pub traks: Vec<Node<Trak>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trak {
    pub tkhd: Option<Node<Tkhd>>,
    pub mdia: Option<Node<Mdia>>,
}

impl Trak {
    /// `vide`, `soun`, ... from `mdia/hdlr`, if it decoded.
    pub fn handler_type(&self) -> Option<FourCC> {
        let mdia = self.mdia.as_ref()?.get()?;
        Some(mdia.hdlr.as_ref()?.get()?.handler_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Mdia {
    pub mdhd: Option<Node<Mdhd>>,
    pub hdlr: Option<Node<Hdlr>>,
    pub minf: Option<Node<Minf>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Minf {
    pub vmhd: Option<Node<Vmhd>>,
    pub smhd: Option<Node<Smhd>>,
    pub stbl: Option<Node<Stbl>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stbl {
    pub stsd: Option<Node<Stsd>>,
}

fn seconds(duration: u32, timescale: u32) -> Option<f64> {
    if timescale == 0 {
        return None;
    }
    Some(duration as f64 / timescale as f64)
}
