//! Compression backends.
//!
//! - `zlib`: a single gzip stream. No offsets.
//! - `snappy`, `zstd`: a chunked container where every chunk decodes on its
//!   own, so a reader can resume at any chunk boundary.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tracefile::{open_for_read, open_for_write, Format, WriteOptions};
//!
//! let mut out = open_for_write("app.trace", Format::Snappy, WriteOptions::default())?;
//! out.write(b"call")?;
//! out.close();
//!
//! // Format is sniffed from the magic bytes.
//! let mut input = open_for_read("app.trace")?;
//! ```

mod chunked;
mod snappy;
mod zlib;
mod zstd;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::detect::{is_snappy_compressed, is_zlib_compressed, is_zstd_compressed};
use crate::file::{Backend, File, Mode};
use crate::options::WriteOptions;
use crate::{Error, Result};

pub use chunked::{ChunkCodec, ChunkedFile, CHUNK_HEADER_LEN};
pub use snappy::{SnappyCodec, SnappyFile};
pub use zlib::ZlibFile;
pub use self::zstd::{ZstdCodec, ZstdFile};

/// File handle over a backend picked at runtime.
pub type AnyFile = File<Box<dyn Backend + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Format {
    Zlib,
    #[default]
    Snappy,
    Zstd,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Zlib, Format::Snappy, Format::Zstd];

    /// Sniffs the format of an existing file.
    pub fn detect(path: impl AsRef<Path>) -> Option<Format> {
        let path = path.as_ref();
        if is_snappy_compressed(path) {
            Some(Format::Snappy)
        } else if is_zstd_compressed(path) {
            Some(Format::Zstd)
        } else if is_zlib_compressed(path) {
            Some(Format::Zlib)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Format::Zlib => "zlib",
            Format::Snappy => "snappy",
            Format::Zstd => "zstd",
        }
    }

    pub fn new_backend(&self, options: WriteOptions) -> Box<dyn Backend + Send> {
        match self {
            Format::Zlib => Box::new(ZlibFile::with_options(options)),
            Format::Snappy => Box::new(SnappyFile::with_options(options)),
            Format::Zstd => Box::new(ZstdFile::with_options(options)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "zlib" | "gzip" | "gz" => Ok(Format::Zlib),
            "snappy" => Ok(Format::Snappy),
            "zstd" => Ok(Format::Zstd),
            _ => Err(Error::UnknownFormat),
        }
    }
}

/// Share of `len` covered by `pos`, clamped to 100. Empty files count as done.
pub(crate) fn percent(pos: u64, len: u64) -> u8 {
    if len == 0 {
        return 100;
    }
    (pos.min(len).saturating_mul(100) / len) as u8
}

/// Opens an existing trace for reading, picking the backend from its magic.
pub fn open_for_read(path: impl AsRef<Path>) -> Result<AnyFile> {
    let path = path.as_ref();
    let format = Format::detect(path).ok_or(Error::UnknownFormat)?;
    let mut file = File::new(format.new_backend(WriteOptions::default()));
    file.open(path, Mode::Read)?;
    Ok(file)
}

/// Creates (or truncates) a trace for writing under `format`.
pub fn open_for_write(
    path: impl AsRef<Path>,
    format: Format,
    options: WriteOptions,
) -> Result<AnyFile> {
    let mut file = File::new(format.new_backend(options));
    file.open(path, Mode::Write)?;
    Ok(file)
}
