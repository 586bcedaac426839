use crate::boxes::{BoxHeader, Decoded, DecodedBox, FourCC, HEADER_SIZE, Node};
use crate::error::{DecodeError, Diagnostic, FieldError, ParseError, Result, TruncatedRegion};
use crate::known_boxes::KnownBox;
use crate::registry::Registry;
use crate::source::ByteSource;
use byteorder::{BigEndian, ByteOrder};
use std::collections::HashMap;
use std::iter::FusedIterator;
use tracing::{debug, trace, warn};

/// Deepest box path the walker will dispatch into. Anything below is kept
/// opaque.
pub const MAX_DEPTH: usize = 16;

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Truncated(TruncatedRegion),
}

/// Decode the 8 byte header at `offset`.
pub fn read_box_header<S: ByteSource + ?Sized>(src: &S, offset: u64) -> std::io::Result<BoxHeader> {
    let buf = src.read_at(offset, HEADER_SIZE as usize)?;
    let size = BigEndian::read_u32(&buf[0..4]);
    let typ = FourCC([buf[4], buf[5], buf[6], buf[7]]);
    Ok(BoxHeader { typ, size, start: offset })
}

/// Lazy, single-pass walk over the immediate child headers of one region.
///
/// Headers come out in ascending offset order. A header that does not fit the
/// region ends the walk with one `ScanError::Truncated`; an I/O failure ends it
/// with `ScanError::Io`. [`BoxScanner::close`] stops it for good.
pub struct BoxScanner<'a, S: ?Sized> {
    src: &'a S,
    cursor: u64,
    end: u64,
    done: bool,
}

impl<'a, S: ByteSource + ?Sized> BoxScanner<'a, S> {
    pub fn new(src: &'a S, start: u64, len: u64) -> Self {
        Self {
            src,
            cursor: start,
            end: start.saturating_add(len),
            done: false,
        }
    }

    /// Scan the content region of `parent`.
    pub fn children(src: &'a S, parent: &BoxHeader) -> Self {
        Self::new(src, parent.content_start(), parent.content_len())
    }

    pub fn close(&mut self) {
        self.done = true;
    }

    pub fn position(&self) -> u64 {
        self.cursor
    }

    fn truncated(&mut self, declared_size: Option<u32>) -> ScanError {
        self.done = true;
        ScanError::Truncated(TruncatedRegion {
            offset: self.cursor,
            declared_size,
            region_end: self.end,
        })
    }
}

impl<S: ByteSource + ?Sized> Iterator for BoxScanner<'_, S> {
    type Item = std::result::Result<BoxHeader, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.end {
            self.done = true;
            return None;
        }
        if self.end - self.cursor < HEADER_SIZE {
            return Some(Err(self.truncated(None)));
        }
        let h = match read_box_header(self.src, self.cursor) {
            Ok(h) => h,
            Err(e) => {
                self.done = true;
                return Some(Err(ScanError::Io(e)));
            }
        };
        // size 0 (to end of file) and 1 (64-bit size) are not supported
        if (h.size as u64) < HEADER_SIZE || h.end() > self.end {
            return Some(Err(self.truncated(Some(h.size))));
        }
        trace!(typ = %h.typ, start = h.start, size = h.size, "box found");
        self.cursor = h.end();
        Some(Ok(h))
    }
}

impl<S: ByteSource + ?Sized> FusedIterator for BoxScanner<'_, S> {}

/// Recursive descent state: the source, the dispatch table, the current box
/// path and the diagnostics collected so far.
pub struct Walker<'a> {
    src: &'a dyn ByteSource,
    registry: &'a Registry,
    path: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Walker<'a> {
    pub fn new(src: &'a dyn ByteSource, registry: &'a Registry) -> Self {
        Self {
            src,
            registry,
            path: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Current position in the tree, `/` at the top level.
    pub fn path(&self) -> String {
        if self.path.is_empty() {
            "/".to_string()
        } else {
            format!("/{}", self.path.join("/"))
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    pub fn record(&mut self, error: impl Into<DecodeError>) {
        let diag = Diagnostic {
            path: self.path(),
            error: error.into(),
        };
        warn!(path = %diag.path, error = %diag.error, "box diagnostic");
        self.diagnostics.push(diag);
    }

    /// Route `hdr` to its registered decoder, or keep it opaque.
    pub fn dispatch(&mut self, hdr: BoxHeader) -> Result<DecodedBox> {
        if self.path.len() > MAX_DEPTH {
            warn!(path = %self.path(), "box nesting too deep, not decoded");
            return Ok(DecodedBox::Opaque(hdr));
        }
        match self.registry.get(&hdr.typ) {
            Some(decode) => decode(hdr, self),
            None => Ok(DecodedBox::Opaque(hdr)),
        }
    }

    /// Read `hdr`'s content and run a leaf decoder over it.
    ///
    /// A field error becomes an `Invalid` node plus a diagnostic at the
    /// current path; only I/O errors are returned.
    pub fn leaf<T>(
        &mut self,
        hdr: BoxHeader,
        decode: fn(&[u8]) -> std::result::Result<T, FieldError>,
    ) -> Result<Node<T>> {
        let content = self
            .src
            .read_at(hdr.content_start(), hdr.content_len() as usize)?;
        let decoded = match decode(&content) {
            Ok(v) => Decoded::Valid(v),
            Err(e) => {
                self.record(e.clone());
                Decoded::Invalid(e)
            }
        };
        Ok(Node { header: hdr, decoded })
    }

    /// Scan every child of `parent`, dispatch the ones listed in `accepts`
    /// and hand them to `route`.
    ///
    /// Children outside `accepts` are skipped without being decoded, except
    /// unknown tags the registry has a decoder for. `route` returns the box
    /// back when the parent has no slot for it; such boxes are logged and
    /// dropped.
    pub fn for_each_child<F>(
        &mut self,
        parent: &BoxHeader,
        accepts: &[KnownBox],
        route: F,
    ) -> Result<()>
    where
        F: FnMut(DecodedBox) -> Option<DecodedBox>,
    {
        self.scan_region(parent.content_start(), parent.content_len(), accepts, route)
    }

    pub fn scan_region<F>(
        &mut self,
        start: u64,
        len: u64,
        accepts: &[KnownBox],
        mut route: F,
    ) -> Result<()>
    where
        F: FnMut(DecodedBox) -> Option<DecodedBox>,
    {
        let src = self.src;
        let mut seen: HashMap<FourCC, usize> = HashMap::new();
        for item in BoxScanner::new(src, start, len) {
            let hdr = match item {
                Ok(hdr) => hdr,
                Err(ScanError::Io(e)) => return Err(ParseError::Io(e)),
                Err(ScanError::Truncated(t)) => {
                    self.record(t);
                    break;
                }
            };

            let kind = KnownBox::from(hdr.typ);
            let wanted = match kind {
                KnownBox::Unknown(tag) => self.registry.contains(&tag),
                known => accepts.contains(&known),
            };
            if !wanted {
                debug!(parent = %self.path(), typ = %hdr.typ, "box skipped");
                continue;
            }

            let index = seen.entry(hdr.typ).or_insert(0);
            let segment = if kind.is_repeatable() {
                format!("{}[{}]", hdr.typ, index)
            } else {
                hdr.typ.to_string()
            };
            *index += 1;

            self.path.push(segment);
            let decoded = self.dispatch(hdr);
            self.path.pop();

            if let Some(unhandled) = route(decoded?) {
                debug!(parent = %self.path(), typ = %unhandled.typ(), "unhandled box dropped");
            }
        }
        Ok(())
    }
}
