//! Magic-byte checks for the supported backends.
//!
//! Checks open the path read-only, look at the leading bytes only, and turn
//! every failure into `false` so they can be chained.

use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const ZLIB_MAGIC: [u8; 2] = [0x1f, 0x8b];
pub const SNAPPY_MAGIC: [u8; 2] = *b"at";
pub const ZSTD_MAGIC: [u8; 2] = *b"zt";

pub fn is_zlib_compressed(path: impl AsRef<Path>) -> bool {
    has_magic(path.as_ref(), &ZLIB_MAGIC)
}

pub fn is_snappy_compressed(path: impl AsRef<Path>) -> bool {
    has_magic(path.as_ref(), &SNAPPY_MAGIC)
}

pub fn is_zstd_compressed(path: impl AsRef<Path>) -> bool {
    has_magic(path.as_ref(), &ZSTD_MAGIC)
}

fn has_magic(path: &Path, magic: &[u8]) -> bool {
    let Ok(file) = File::open(path) else {
        return false;
    };
    let mut head = Vec::with_capacity(magic.len());
    match file.take(magic.len() as u64).read_to_end(&mut head) {
        Ok(_) => head == magic,
        Err(_) => false,
    }
}
