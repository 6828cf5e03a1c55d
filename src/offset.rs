//! Chunk-addressed stream positions.

pub const OFFSET_ENCODED_LEN: usize = 12;

/// Position inside a compressed trace stream.
///
/// `chunk` names a point where the backend can resume decoding on its own
/// (for chunked backends, the file position of the chunk header) and
/// `offset_in_chunk` counts uncompressed bytes past that point. Offsets order
/// lexicographically: chunk first, then offset in chunk.
///
/// `Offset::default()` is the start of the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Offset {
    // Field order defines the derived ordering.
    pub chunk: u64,
    pub offset_in_chunk: u32,
}

impl Offset {
    pub const fn new(chunk: u64, offset_in_chunk: u32) -> Self {
        Self {
            chunk,
            offset_in_chunk,
        }
    }

    pub fn is_start(&self) -> bool {
        *self == Self::default()
    }

    /// Fixed little-endian layout for index files: chunk, then offset in chunk.
    pub fn to_bytes(&self) -> [u8; OFFSET_ENCODED_LEN] {
        let mut buf = [0u8; OFFSET_ENCODED_LEN];
        buf[0..8].copy_from_slice(&self.chunk.to_le_bytes());
        buf[8..12].copy_from_slice(&self.offset_in_chunk.to_le_bytes());
        buf
    }

    pub fn from_bytes(bytes: &[u8; OFFSET_ENCODED_LEN]) -> Self {
        let mut chunk = [0u8; 8];
        chunk.copy_from_slice(&bytes[0..8]);
        let mut offset_in_chunk = [0u8; 4];
        offset_in_chunk.copy_from_slice(&bytes[8..12]);
        Self {
            chunk: u64::from_le_bytes(chunk),
            offset_in_chunk: u32::from_le_bytes(offset_in_chunk),
        }
    }
}
