//! Mode-gated trace file handle.
//!
//! `File` owns the open/closed lifecycle and checks mode before every I/O
//! call. Backends implement the raw primitives and are only ever invoked on
//! an opened handle in the matching mode.

use std::path::{Path, PathBuf};

use crate::backend::Format;
use crate::offset::Offset;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
}

/// Raw primitives implemented by each compression backend.
///
/// Callers go through [`File`]; the `raw_*` methods assume the handle is
/// open and in the mode the operation requires.
pub trait Backend {
    fn format(&self) -> Format;

    fn supports_offsets(&self) -> bool;

    /// Acquires the backend resource. On error nothing stays acquired.
    fn raw_open(&mut self, path: &Path, mode: Mode) -> Result<()>;

    fn raw_write(&mut self, buf: &[u8]) -> Result<()>;

    /// Fills `buf` completely or fails.
    fn raw_read(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Reads up to `buf.len()` bytes. `Ok(0)` only at a clean end of stream
    /// (or for an empty `buf`); decode failures are errors.
    fn raw_read_some(&mut self, buf: &mut [u8]) -> Result<usize>;

    fn raw_getc(&mut self) -> Option<u8>;

    /// Releases the resource. Errors are logged, not returned.
    fn raw_close(&mut self);

    fn raw_flush(&mut self) -> Result<()>;

    fn raw_skip(&mut self, len: u64) -> Result<()>;

    fn current_offset(&mut self) -> Offset {
        Offset::default()
    }

    fn set_current_offset(&mut self, _offset: Offset) -> Result<()> {
        Ok(())
    }

    /// Share of the compressed input consumed so far, 0..=100.
    fn percent_read(&mut self) -> u8 {
        0
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn format(&self) -> Format {
        (**self).format()
    }

    fn supports_offsets(&self) -> bool {
        (**self).supports_offsets()
    }

    fn raw_open(&mut self, path: &Path, mode: Mode) -> Result<()> {
        (**self).raw_open(path, mode)
    }

    fn raw_write(&mut self, buf: &[u8]) -> Result<()> {
        (**self).raw_write(buf)
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<()> {
        (**self).raw_read(buf)
    }

    fn raw_read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).raw_read_some(buf)
    }

    fn raw_getc(&mut self) -> Option<u8> {
        (**self).raw_getc()
    }

    fn raw_close(&mut self) {
        (**self).raw_close()
    }

    fn raw_flush(&mut self) -> Result<()> {
        (**self).raw_flush()
    }

    fn raw_skip(&mut self, len: u64) -> Result<()> {
        (**self).raw_skip(len)
    }

    fn current_offset(&mut self) -> Offset {
        (**self).current_offset()
    }

    fn set_current_offset(&mut self, offset: Offset) -> Result<()> {
        (**self).set_current_offset(offset)
    }

    fn percent_read(&mut self) -> u8 {
        (**self).percent_read()
    }
}

/// A trace file stored under backend `B`.
///
/// One handle is either reading or writing, never both. Dropping an opened
/// handle closes it.
pub struct File<B: Backend> {
    filename: PathBuf,
    mode: Mode,
    opened: bool,
    backend: B,
}

impl<B: Backend> File<B> {
    pub fn new(backend: B) -> Self {
        Self {
            filename: PathBuf::new(),
            mode: Mode::Read,
            opened: false,
            backend,
        }
    }

    /// Binds a filename and mode without opening; see [`File::open_bound`].
    pub fn bound(backend: B, filename: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            filename: filename.into(),
            mode,
            opened: false,
            backend,
        }
    }

    pub fn is_opened(&self) -> bool {
        self.opened
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn filename(&self) -> &Path {
        &self.filename
    }

    pub fn format(&self) -> Format {
        self.backend.format()
    }

    pub fn supports_offsets(&self) -> bool {
        self.backend.supports_offsets()
    }

    /// Opens `filename` in `mode`, closing any previously opened handle.
    pub fn open(&mut self, filename: impl AsRef<Path>, mode: Mode) -> Result<()> {
        self.close();
        let filename = filename.as_ref();
        self.filename = filename.to_path_buf();
        self.mode = mode;
        self.backend.raw_open(filename, mode)?;
        self.opened = true;
        log::debug!(
            "opened {} for {:?} ({:?})",
            filename.display(),
            mode,
            self.backend.format()
        );
        Ok(())
    }

    /// Opens the filename and mode given to [`File::bound`].
    pub fn open_bound(&mut self) -> Result<()> {
        let filename = self.filename.clone();
        self.open(filename, self.mode)
    }

    pub fn write(&mut self, buf: &[u8]) -> Result<()> {
        self.check(Mode::Write)?;
        self.backend.raw_write(buf)
    }

    pub fn read(&mut self, buf: &mut [u8]) -> Result<()> {
        self.check(Mode::Read)?;
        self.backend.raw_read(buf)
    }

    /// Reads whatever is ready, up to `buf.len()` bytes. Returns 0 at the end
    /// of the stream; unlike [`File::getc`], a corrupt stream is an error.
    pub fn read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check(Mode::Read)?;
        self.backend.raw_read_some(buf)
    }

    /// Next byte of the stream; `None` at end of stream, on a backend
    /// failure, or when the handle is not opened for reading.
    pub fn getc(&mut self) -> Option<u8> {
        if self.check(Mode::Read).is_err() {
            return None;
        }
        self.backend.raw_getc()
    }

    pub fn skip(&mut self, len: u64) -> Result<()> {
        self.check(Mode::Read)?;
        self.backend.raw_skip(len)
    }

    /// No-op unless the handle is opened for writing.
    pub fn flush(&mut self) -> Result<()> {
        if !self.opened || self.mode != Mode::Write {
            return Ok(());
        }
        self.backend.raw_flush()
    }

    pub fn close(&mut self) {
        if self.opened {
            self.backend.raw_close();
            self.opened = false;
            log::debug!("closed {}", self.filename.display());
        }
    }

    /// Current position at chunk granularity. Start of stream when closed or
    /// when the backend has no offsets.
    pub fn current_offset(&mut self) -> Offset {
        if !self.opened || !self.backend.supports_offsets() {
            return Offset::default();
        }
        self.backend.current_offset()
    }

    pub fn set_current_offset(&mut self, offset: Offset) -> Result<()> {
        self.check(Mode::Read)?;
        if !self.backend.supports_offsets() {
            return Err(Error::OffsetsUnsupported);
        }
        self.backend.set_current_offset(offset)
    }

    pub fn percent_read(&mut self) -> u8 {
        if !self.opened || self.mode != Mode::Read {
            return 0;
        }
        self.backend.percent_read()
    }

    fn check(&self, expected: Mode) -> Result<()> {
        if !self.opened {
            return Err(Error::NotOpened);
        }
        if self.mode != expected {
            return Err(Error::WrongMode {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }
}

impl<B: Backend> Drop for File<B> {
    fn drop(&mut self) {
        self.close();
    }
}
