use std::io::Read;

use super::chunked::{ChunkCodec, ChunkedFile};
use super::Format;
use crate::detect::ZSTD_MAGIC;
use crate::options::{WriteOptions, MAX_CHUNK_SIZE};
use crate::{Error, Result};

/// Chunked backend where every chunk is an independent zstd frame.
pub type ZstdFile = ChunkedFile<ZstdCodec>;

#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdCodec;

impl ChunkCodec for ZstdCodec {
    const FORMAT: Format = Format::Zstd;
    const MAGIC: [u8; 2] = ZSTD_MAGIC;

    fn compress(&mut self, input: &[u8], options: &WriteOptions) -> Result<Vec<u8>> {
        Ok(::zstd::stream::encode_all(input, options.zstd_level)?)
    }

    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ::zstd::stream::read::Decoder::new(input)
            .map_err(|_| Error::Corrupt("zstd decoder init failed"))?;
        let mut out = Vec::new();
        // One byte past the limit tells an oversized frame from a full one.
        decoder
            .by_ref()
            .take(MAX_CHUNK_SIZE as u64 + 1)
            .read_to_end(&mut out)
            .map_err(|err| {
                log::debug!("zstd: decompress failed: {err}");
                Error::Corrupt("zstd frame failed to decode")
            })?;
        if out.len() > MAX_CHUNK_SIZE {
            return Err(Error::Corrupt("zstd frame exceeds chunk limit"));
        }
        Ok(out)
    }

    fn max_compressed_len(&self, len: usize) -> usize {
        ::zstd::zstd_safe::compress_bound(len)
    }
}
