use serde::Serialize;

/// Fatal parse failure. Only I/O on the underlying source aborts a parse.
#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ParseError>;

/// A box's content did not match its declared layout.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FieldError {
    #[error("field `{field}` needs bytes {offset}..{end} but content has {available}")]
    OutOfBounds {
        field: &'static str,
        offset: usize,
        end: usize,
        available: usize,
    },
    #[error("fixed-point field needs {expected_bits} bits, got {actual_bits}")]
    FixedWidth { expected_bits: u32, actual_bits: u32 },
    /// A full box whose version changes its field widths. Only version 0
    /// (32-bit times and durations) is decoded for mvhd, tkhd and mdhd;
    /// version 1 boxes are reported here rather than read with the wrong
    /// layout.
    #[error("unsupported box version {0}")]
    UnsupportedVersion(u8),
}

/// Children of a region did not exactly tile it.
///
/// `offset` is where the offending header starts (the end of the last valid
/// sibling), `declared_size` is what that header claimed (None when fewer than
/// 8 bytes were left for a header at all).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("truncated region: box at {offset} declares size {declared_size:?} but region ends at {region_end}")]
pub struct TruncatedRegion {
    pub offset: u64,
    pub declared_size: Option<u32>,
    pub region_end: u64,
}

/// Non-fatal condition recorded against a path in the tree.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecodeError {
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Truncated(#[from] TruncatedRegion),
}

/// One `(path, error)` entry collected during a parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Slash separated box path, e.g. `/moov/trak[1]/mdia/mdhd`. `/` is the file itself.
    pub path: String,
    pub error: DecodeError,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.error)
    }
}
