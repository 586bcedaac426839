use crate::util::read_slice;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Random-access byte provider the parser reads from. Never written through.
pub trait ByteSource {
    /// Return exactly `len` bytes starting at `offset`, or fail.
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>>;

    /// Total addressable size in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for [u8] {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let start = usize::try_from(offset)
            .map_err(|_| io::Error::new(io::ErrorKind::UnexpectedEof, "offset beyond buffer"))?;
        let end = start
            .checked_add(len)
            .filter(|&end| end <= <[u8]>::len(self))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("read of {len} bytes at {offset} past end of buffer"),
                )
            })?;
        Ok(self[start..end].to_vec())
    }

    fn len(&self) -> u64 {
        <[u8]>::len(self) as u64
    }
}

impl ByteSource for Vec<u8> {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.as_slice().read_at(offset, len)
    }

    fn len(&self) -> u64 {
        Vec::len(self) as u64
    }
}

impl<T: ByteSource + ?Sized> ByteSource for &T {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        (**self).read_at(offset, len)
    }

    fn len(&self) -> u64 {
        (**self).len()
    }
}

/// Adapts any `Read + Seek` (a `File`, a `Cursor`) into a [`ByteSource`].
///
/// Reads go through a `RefCell`, so one source serves one parse at a time.
pub struct ReaderSource<R> {
    inner: RefCell<R>,
    len: u64,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(mut inner: R) -> io::Result<Self> {
        let len = inner.seek(SeekFrom::End(0))?;
        inner.seek(SeekFrom::Start(0))?;
        Ok(Self {
            inner: RefCell::new(inner),
            len,
        })
    }
}

impl ReaderSource<File> {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(File::open(path)?)
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn read_at(&self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        let end = offset.checked_add(len as u64);
        if end.is_none_or(|end| end > self.len) {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("read of {len} bytes at {offset} past end of source"),
            ));
        }
        read_slice(&mut *self.inner.borrow_mut(), offset, len as u64)
    }

    fn len(&self) -> u64 {
        self.len
    }
}
