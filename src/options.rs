//! Writer configuration.

use crate::{Error, Result};

/// Largest uncompressed chunk a chunked backend writes or accepts.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Options applied when a backend opens a file for writing.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WriteOptions {
    /// Uncompressed bytes buffered per chunk (snappy, zstd).
    /// Default: 1 MB
    pub chunk_size: usize,

    /// Deflate level 0-9 (zlib).
    /// Default: 6
    pub zlib_level: u32,

    /// Zstd compression level (1-22).
    /// Default: 3
    pub zstd_level: i32,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024, // 1 MB
            zlib_level: 6,
            zstd_level: 3,
        }
    }
}

impl WriteOptions {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0"));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(Error::InvalidConfig("chunk_size exceeds 64 MB"));
        }
        if self.zlib_level > 9 {
            return Err(Error::InvalidConfig("zlib_level must be 0-9"));
        }
        if !(1..=22).contains(&self.zstd_level) {
            return Err(Error::InvalidConfig("zstd_level must be 1-22"));
        }
        Ok(())
    }
}
