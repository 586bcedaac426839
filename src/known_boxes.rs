use crate::boxes::FourCC;

/// Named view over the box types this crate knows about.
///
/// Anything not in this list becomes `KnownBox::Unknown(fourcc)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownBox {
    // File-level / top-level
    Ftyp,
    Moov,
    Mdat,
    Free,
    Skip,

    // moov children
    Mvhd,
    Iods,
    Trak,

    // trak children
    Tkhd,
    Mdia,

    // mdia children
    Mdhd,
    Hdlr,
    Minf,

    // minf children
    Vmhd,
    Smhd,
    Stbl,

    // stbl children
    Stsd,

    Unknown(FourCC),
}

impl From<FourCC> for KnownBox {
    fn from(cc: FourCC) -> Self {
        match &cc.0 {
            b"ftyp" => KnownBox::Ftyp,
            b"moov" => KnownBox::Moov,
            b"mdat" => KnownBox::Mdat,
            b"free" => KnownBox::Free,
            b"skip" => KnownBox::Skip,

            b"mvhd" => KnownBox::Mvhd,
            b"iods" => KnownBox::Iods,
            b"trak" => KnownBox::Trak,

            b"tkhd" => KnownBox::Tkhd,
            b"mdia" => KnownBox::Mdia,

            b"mdhd" => KnownBox::Mdhd,
            b"hdlr" => KnownBox::Hdlr,
            b"minf" => KnownBox::Minf,

            b"vmhd" => KnownBox::Vmhd,
            b"smhd" => KnownBox::Smhd,
            b"stbl" => KnownBox::Stbl,

            b"stsd" => KnownBox::Stsd,

            _ => KnownBox::Unknown(cc),
        }
    }
}

impl KnownBox {
    /// Does this box *contain* child boxes?
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            KnownBox::Moov | KnownBox::Trak | KnownBox::Mdia | KnownBox::Minf | KnownBox::Stbl
        )
    }

    /// May appear more than once under the same parent; paths index these.
    pub fn is_repeatable(&self) -> bool {
        matches!(self, KnownBox::Trak)
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            KnownBox::Ftyp => "File Type Box",
            KnownBox::Moov => "Movie Box",
            KnownBox::Mdat => "Media Data Box",
            KnownBox::Free => "Free Space Box",
            KnownBox::Skip => "Free Space Box",
            KnownBox::Mvhd => "Movie Header Box",
            KnownBox::Iods => "Initial Object Descriptor Box",
            KnownBox::Trak => "Track Box",
            KnownBox::Tkhd => "Track Header Box",
            KnownBox::Mdia => "Media Box",
            KnownBox::Mdhd => "Media Header Box",
            KnownBox::Hdlr => "Handler Reference Box",
            KnownBox::Minf => "Media Information Box",
            KnownBox::Vmhd => "Video Media Header Box",
            KnownBox::Smhd => "Sound Media Header Box",
            KnownBox::Stbl => "Sample Table Box",
            KnownBox::Stsd => "Sample Description Box",
            KnownBox::Unknown(_) => "Unknown Box",
        }
    }
}
