use crate::boxes::{
    BoxHeader, DecodedBox, FourCC, Ftyp, Hdlr, Iods, Language, Mdhd, Mvhd, Smhd, Stsd, Tkhd, Vmhd,
};
use crate::containers;
use crate::error::{FieldError, Result};
use crate::fixed::FixedPoint;
use crate::parser::Walker;
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;

/// A decode routine: turns one header into a typed box, recursing through the
/// walker for containers. Only I/O errors may be returned.
pub type DecodeFn = fn(BoxHeader, &mut Walker<'_>) -> Result<DecodedBox>;

/// Dispatch table keyed by four-character tag.
///
/// The registry is immutable once constructed; use [`Registry::with_decoder`]
/// to build it fluently. Tags without an entry decode as
/// [`DecodedBox::Opaque`].
pub struct Registry {
    map: HashMap<FourCC, DecoderEntry>,
}

struct DecoderEntry {
    decode: DecodeFn,
    name: &'static str,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Return a new registry with the given routine added (or replaced).
    ///
    /// `name` is human-readable and used only for debugging / logging.
    pub fn with_decoder(mut self, typ: FourCC, name: &'static str, decode: DecodeFn) -> Self {
        self.map.insert(typ, DecoderEntry { decode, name });
        self
    }

    /// Return a new registry without an entry for `typ`, so it stays opaque.
    pub fn without_decoder(mut self, typ: FourCC) -> Self {
        self.map.remove(&typ);
        self
    }

    pub fn get(&self, typ: &FourCC) -> Option<DecodeFn> {
        self.map.get(typ).map(|e| e.decode)
    }

    pub fn name(&self, typ: &FourCC) -> Option<&'static str> {
        self.map.get(typ).map(|e| e.name)
    }

    pub fn contains(&self, typ: &FourCC) -> bool {
        self.map.contains_key(typ)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_registry() -> Registry {
    Registry::new()
        .with_decoder(FourCC(*b"ftyp"), "ftyp", |h, w| w.leaf(h, decode_ftyp).map(DecodedBox::Ftyp))
        .with_decoder(FourCC(*b"moov"), "moov", containers::moov)
        .with_decoder(FourCC(*b"mvhd"), "mvhd", |h, w| w.leaf(h, decode_mvhd).map(DecodedBox::Mvhd))
        .with_decoder(FourCC(*b"iods"), "iods", |h, w| w.leaf(h, decode_iods).map(DecodedBox::Iods))
        .with_decoder(FourCC(*b"trak"), "trak", containers::trak)
        .with_decoder(FourCC(*b"tkhd"), "tkhd", |h, w| w.leaf(h, decode_tkhd).map(DecodedBox::Tkhd))
        .with_decoder(FourCC(*b"mdia"), "mdia", containers::mdia)
        .with_decoder(FourCC(*b"mdhd"), "mdhd", |h, w| w.leaf(h, decode_mdhd).map(DecodedBox::Mdhd))
        .with_decoder(FourCC(*b"hdlr"), "hdlr", |h, w| w.leaf(h, decode_hdlr).map(DecodedBox::Hdlr))
        .with_decoder(FourCC(*b"minf"), "minf", containers::minf)
        .with_decoder(FourCC(*b"vmhd"), "vmhd", |h, w| w.leaf(h, decode_vmhd).map(DecodedBox::Vmhd))
        .with_decoder(FourCC(*b"smhd"), "smhd", |h, w| w.leaf(h, decode_smhd).map(DecodedBox::Smhd))
        .with_decoder(FourCC(*b"stbl"), "stbl", containers::stbl)
        .with_decoder(FourCC(*b"stsd"), "stsd", |h, w| w.leaf(h, decode_stsd).map(DecodedBox::Stsd))
}

// ---------- Helpers ----------

/// Bounds-checked big-endian cursor over a box's content.
struct Fields<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Fields<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, field: &'static str, n: usize) -> std::result::Result<&'a [u8], FieldError> {
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(FieldError::OutOfBounds {
                field,
                offset: self.pos,
                end,
                available: self.buf.len(),
            });
        }
        let s = &self.buf[self.pos..end];
        self.pos = end;
        Ok(s)
    }

    fn skip(&mut self, field: &'static str, n: usize) -> std::result::Result<(), FieldError> {
        self.take(field, n).map(|_| ())
    }

    fn u16(&mut self, field: &'static str) -> std::result::Result<u16, FieldError> {
        self.take(field, 2).map(BigEndian::read_u16)
    }

    fn i16(&mut self, field: &'static str) -> std::result::Result<i16, FieldError> {
        self.take(field, 2).map(BigEndian::read_i16)
    }

    fn u32(&mut self, field: &'static str) -> std::result::Result<u32, FieldError> {
        self.take(field, 4).map(BigEndian::read_u32)
    }

    fn fourcc(&mut self, field: &'static str) -> std::result::Result<FourCC, FieldError> {
        let b = self.take(field, 4)?;
        Ok(FourCC([b[0], b[1], b[2], b[3]]))
    }

    fn fixed_8_8(&mut self, field: &'static str) -> std::result::Result<FixedPoint, FieldError> {
        FixedPoint::from_8_8(self.take(field, 2)?)
    }

    fn fixed_16_16(&mut self, field: &'static str) -> std::result::Result<FixedPoint, FieldError> {
        FixedPoint::from_16_16(self.take(field, 4)?)
    }

    /// FullBox prefix. Only version 0 (32-bit times) is laid out here.
    fn version_flags(&mut self) -> std::result::Result<(u8, [u8; 3]), FieldError> {
        let b = self.take("version/flags", 4)?;
        Ok((b[0], [b[1], b[2], b[3]]))
    }

    fn version0_flags(&mut self) -> std::result::Result<(u8, [u8; 3]), FieldError> {
        let (version, flags) = self.version_flags()?;
        if version != 0 {
            return Err(FieldError::UnsupportedVersion(version));
        }
        Ok((version, flags))
    }

    fn rest(&mut self) -> &'a [u8] {
        let s = &self.buf[self.pos..];
        self.pos = self.buf.len();
        s
    }
}

// ---------- Decoders ----------

// ftyp: major + minor + compatible brands
pub fn decode_ftyp(buf: &[u8]) -> std::result::Result<Ftyp, FieldError> {
    let mut f = Fields::new(buf);
    let major_brand = f.fourcc("major_brand")?;
    let minor_version = f.fourcc("minor_version")?;

    let mut compatible_brands = Vec::new();
    while f.pos < buf.len() {
        compatible_brands.push(f.fourcc("compatible_brands")?);
    }

    Ok(Ftyp {
        major_brand,
        minor_version,
        compatible_brands,
    })
}

/// mvhd: header through `next_track_id`, matrix and pre_defined skipped.
///
/// Version 0 only. A version 1 box (64-bit times) fails with
/// [`FieldError::UnsupportedVersion`].
pub fn decode_mvhd(buf: &[u8]) -> std::result::Result<Mvhd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version0_flags()?;
    let creation_time = f.u32("creation_time")?;
    let modification_time = f.u32("modification_time")?;
    let timescale = f.u32("timescale")?;
    let duration = f.u32("duration")?;
    let rate = f.fixed_16_16("rate")?;
    let volume = f.fixed_8_8("volume")?;
    f.skip("reserved", 2 + 8)?;
    f.skip("matrix", 36)?;
    f.skip("pre_defined", 24)?;
    let next_track_id = f.u32("next_track_id")?;

    Ok(Mvhd {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        rate,
        volume,
        next_track_id,
    })
}

// iods: kept as-is
pub fn decode_iods(buf: &[u8]) -> std::result::Result<Iods, FieldError> {
    Ok(Iods { data: buf.to_vec() })
}

/// tkhd: version 0 layout, 84 bytes. Other versions fail with
/// [`FieldError::UnsupportedVersion`].
pub fn decode_tkhd(buf: &[u8]) -> std::result::Result<Tkhd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version0_flags()?;
    let creation_time = f.u32("creation_time")?;
    let modification_time = f.u32("modification_time")?;
    let track_id = f.u32("track_id")?;
    f.skip("reserved", 4)?;
    let duration = f.u32("duration")?;
    f.skip("reserved", 8)?;
    let layer = f.i16("layer")?;
    let alternate_group = f.i16("alternate_group")?;
    let volume = f.fixed_8_8("volume")?;
    f.skip("reserved", 2)?;

    let mut matrix = [FixedPoint::from_16_16(&[0; 4])?; 9];
    for m in matrix.iter_mut() {
        *m = f.fixed_16_16("matrix")?;
    }

    let width = f.fixed_16_16("width")?;
    let height = f.fixed_16_16("height")?;

    Ok(Tkhd {
        version,
        flags,
        creation_time,
        modification_time,
        track_id,
        duration,
        layer,
        alternate_group,
        volume,
        matrix,
        width,
        height,
    })
}

/// mdhd: times, timescale, duration, packed language. Version 0 only, like
/// [`decode_mvhd`].
pub fn decode_mdhd(buf: &[u8]) -> std::result::Result<Mdhd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version0_flags()?;
    let creation_time = f.u32("creation_time")?;
    let modification_time = f.u32("modification_time")?;
    let timescale = f.u32("timescale")?;
    let duration = f.u32("duration")?;
    let language = Language::from_packed(f.u16("language")?);

    Ok(Mdhd {
        version,
        flags,
        creation_time,
        modification_time,
        timescale,
        duration,
        language,
    })
}

// hdlr: handler type + name
pub fn decode_hdlr(buf: &[u8]) -> std::result::Result<Hdlr, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version_flags()?;
    let pre_defined = f.u32("pre_defined")?;
    let handler_type = f.fourcc("handler_type")?;
    f.skip("reserved", 12)?;

    // name: null-terminated string (or just rest of box)
    let mut name = f.rest();
    while let [head @ .., 0] = name {
        name = head;
    }

    Ok(Hdlr {
        version,
        flags,
        pre_defined,
        handler_type,
        track_name: String::from_utf8_lossy(name).into_owned(),
    })
}

// vmhd: graphics mode + opcolor
pub fn decode_vmhd(buf: &[u8]) -> std::result::Result<Vmhd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version_flags()?;
    let graphicsmode = f.u16("graphicsmode")?;
    let opcolor = [f.u16("opcolor")?, f.u16("opcolor")?, f.u16("opcolor")?];

    Ok(Vmhd {
        version,
        flags,
        graphicsmode,
        opcolor,
    })
}

// smhd: balance
pub fn decode_smhd(buf: &[u8]) -> std::result::Result<Smhd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version_flags()?;
    let balance = f.i16("balance")?;

    Ok(Smhd {
        version,
        flags,
        balance,
    })
}

// stsd: entry count, sample entries left raw
pub fn decode_stsd(buf: &[u8]) -> std::result::Result<Stsd, FieldError> {
    let mut f = Fields::new(buf);
    let (version, flags) = f.version_flags()?;
    let entry_count = f.u32("entry_count")?;

    Ok(Stsd {
        version,
        flags,
        entry_count,
        entries: f.rest().to_vec(),
    })
}
