use snap::raw::{decompress_len, max_compress_len, Decoder, Encoder};

use super::chunked::{ChunkCodec, ChunkedFile};
use super::Format;
use crate::detect::SNAPPY_MAGIC;
use crate::options::{WriteOptions, MAX_CHUNK_SIZE};
use crate::{Error, Result};

/// Chunked backend with raw snappy blocks.
pub type SnappyFile = ChunkedFile<SnappyCodec>;

pub struct SnappyCodec {
    encoder: Encoder,
    decoder: Decoder,
}

impl Default for SnappyCodec {
    fn default() -> Self {
        Self {
            encoder: Encoder::new(),
            decoder: Decoder::new(),
        }
    }
}

impl ChunkCodec for SnappyCodec {
    const FORMAT: Format = Format::Snappy;
    const MAGIC: [u8; 2] = SNAPPY_MAGIC;

    fn compress(&mut self, input: &[u8], _options: &WriteOptions) -> Result<Vec<u8>> {
        self.encoder.compress_vec(input).map_err(|err| {
            log::warn!("snappy: compress failed: {err}");
            Error::Corrupt("snappy compress failed")
        })
    }

    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        // The block header carries the decoded length; check it before allocating.
        let len = decompress_len(input).map_err(|_| Error::Corrupt("bad snappy block header"))?;
        if len > MAX_CHUNK_SIZE {
            return Err(Error::Corrupt("snappy block exceeds chunk limit"));
        }
        self.decoder.decompress_vec(input).map_err(|err| {
            log::debug!("snappy: decompress failed: {err}");
            Error::Corrupt("snappy block failed to decode")
        })
    }

    fn max_compressed_len(&self, len: usize) -> usize {
        max_compress_len(len)
    }
}
