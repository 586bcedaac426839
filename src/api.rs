use crate::{
    boxes::{BoxHeader, DecodedBox, Ftyp, Moov, Node, Trak},
    containers::replace,
    error::{Diagnostic, Result},
    known_boxes::KnownBox,
    parser::Walker,
    registry::{Registry, default_registry},
    source::{ByteSource, ReaderSource},
};
use serde::Serialize;
use std::{fs::File, path::Path};
use tracing::debug;

/// Root of the parse tree.
///
/// Owns the source it was parsed from so raw regions (e.g. `mdat`) can be
/// read back later.
#[derive(Serialize)]
pub struct Mp4File<S> {
    #[serde(skip)]
    source: S,
    /// Total length of the source in bytes
    pub len: u64,
    pub ftyp: Option<Node<Ftyp>>,
    pub moov: Option<Node<Moov>>,
    /// Media data is never read, only located
    pub mdat: Option<BoxHeader>,
}

impl<S: ByteSource> Mp4File<S> {
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Decoded traks under `moov`, in file order.
    pub fn tracks(&self) -> impl Iterator<Item = &Trak> {
        self.moov
            .as_ref()
            .and_then(|m| m.get())
            .into_iter()
            .flat_map(|m| m.traks.iter())
            .filter_map(|t| t.get())
    }

    /// Pretty JSON rendering of the tree.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

const TOP_LEVEL: &[KnownBox] = &[KnownBox::Ftyp, KnownBox::Moov, KnownBox::Mdat];

/// Parse an MP4/ISOBMFF byte source with the default dispatch table.
///
/// Returns the (possibly partial) tree plus every non-fatal problem found,
/// each tagged with its box path. Only an I/O error on the source fails the
/// whole call.
///
/// # Example
/// ```no_run
/// use mp4tree::{parse, ReaderSource};
///
/// let src = ReaderSource::open("video.mp4")?;
/// let (file, diagnostics) = parse(src)?;
/// for d in &diagnostics {
///     eprintln!("{d}");
/// }
/// println!("{} tracks", file.tracks().count());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn parse<S: ByteSource>(source: S) -> Result<(Mp4File<S>, Vec<Diagnostic>)> {
    parse_with(source, &default_registry())
}

/// Like [`parse`], with a caller-supplied dispatch table.
pub fn parse_with<S: ByteSource>(
    source: S,
    registry: &Registry,
) -> Result<(Mp4File<S>, Vec<Diagnostic>)> {
    let len = source.len();
    debug!(len, "parsing");

    let mut ftyp = None;
    let mut moov = None;
    let mut mdat = None;

    let mut walker = Walker::new(&source, registry);
    walker.scan_region(0, len, TOP_LEVEL, |b| {
        match b {
            DecodedBox::Ftyp(n) => replace(&mut ftyp, n.header.typ, n),
            DecodedBox::Moov(n) => replace(&mut moov, n.header.typ, n),
            DecodedBox::Opaque(h) if &h.typ.0 == b"mdat" => replace(&mut mdat, h.typ, h),
            other => return Some(other),
        }
        None
    })?;
    let diagnostics = walker.into_diagnostics();
    debug!(diagnostics = diagnostics.len(), "parse finished");

    Ok((
        Mp4File {
            source,
            len,
            ftyp,
            moov,
            mdat,
        },
        diagnostics,
    ))
}

/// Open `path` and parse it.
pub fn parse_file(
    path: impl AsRef<Path>,
) -> Result<(Mp4File<ReaderSource<File>>, Vec<Diagnostic>)> {
    parse(ReaderSource::open(path)?)
}
