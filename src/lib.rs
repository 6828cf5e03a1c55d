//! Compressed, chunk-seekable trace files.
//!
//! A [`File`] gives one read-only or write-only handle over a trace stream
//! stored under a compression [`Backend`]. Backends with resumable chunks
//! expose an [`Offset`] that can be stored next to other trace metadata and
//! later handed to a fresh reader to continue decoding from that chunk.

pub mod backend;
pub mod detect;
pub mod error;
pub mod file;
pub mod offset;
pub mod options;

pub use backend::{
    open_for_read, open_for_write, AnyFile, ChunkCodec, ChunkedFile, Format, SnappyFile,
    ZlibFile, ZstdFile,
};
pub use detect::{is_snappy_compressed, is_zlib_compressed, is_zstd_compressed};
pub use error::{Error, Result};
pub use file::{Backend, File, Mode};
pub use offset::Offset;
pub use options::{WriteOptions, MAX_CHUNK_SIZE};
