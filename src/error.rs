use thiserror::Error;

use crate::file::Mode;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is not opened")]
    NotOpened,
    #[error("file opened for {actual:?}, operation requires {expected:?}")]
    WrongMode { expected: Mode, actual: Mode },
    #[error("backend does not support offsets")]
    OffsetsUnsupported,
    #[error("invalid offset: chunk {chunk}, offset in chunk {offset_in_chunk}")]
    InvalidOffset { chunk: u64, offset_in_chunk: u32 },
    #[error("unexpected end of stream")]
    UnexpectedEof,
    #[error("corrupt data: {0}")]
    Corrupt(&'static str),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("unknown trace file format")]
    UnknownFormat,
}

impl Error {
    /// True for errors raised by `File` before the backend is consulted.
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Error::NotOpened | Error::WrongMode { .. } | Error::OffsetsUnsupported
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
