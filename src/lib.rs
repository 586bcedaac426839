pub mod api;
pub mod boxes;
mod containers;
pub mod error;
pub mod fixed;
pub mod known_boxes;
pub mod parser;
pub mod registry;
pub mod source;
pub mod util;

pub use api::{Mp4File, parse, parse_file, parse_with};
pub use boxes::{BoxHeader, Decoded, DecodedBox, FourCC, Node};
pub use error::{DecodeError, Diagnostic, FieldError, ParseError, TruncatedRegion};
pub use fixed::{FixedPoint, decode_fixed};
pub use parser::{BoxScanner, ScanError, Walker, read_box_header};
pub use registry::{Registry, default_registry};
pub use source::{ByteSource, ReaderSource};
