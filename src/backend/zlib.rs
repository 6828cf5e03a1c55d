use std::fs::File;
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use super::{percent, Format};
use crate::file::{Backend, Mode};
use crate::options::WriteOptions;
use crate::{Error, Result};

/// Gzip-stream backend.
///
/// A deflate stream can only be resumed from its start, so this backend does
/// not expose offsets. Concatenated gzip members read back as one stream.
#[derive(Default)]
pub struct ZlibFile {
    options: WriteOptions,
    state: Option<State>,
}

enum State {
    Read {
        decoder: MultiGzDecoder<File>,
        file_len: u64,
        tail: Tail,
    },
    Write {
        encoder: GzEncoder<BufWriter<File>>,
    },
}

/// How the decoded stream ended. flate2 reads back `Ok(0)` after some
/// decode errors, so a failure has to stick.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Tail {
    Pending,
    Clean,
    Failed,
}

impl ZlibFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self {
            options,
            state: None,
        }
    }

    fn reader(&mut self) -> Result<(&mut MultiGzDecoder<File>, &mut Tail)> {
        match &mut self.state {
            Some(State::Read { decoder, tail, .. }) => Ok((decoder, tail)),
            _ => Err(Error::NotOpened),
        }
    }
}

/// A member cut short surfaces from flate2 as an io `UnexpectedEof`.
fn decode_err(err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::Corrupt("truncated gzip stream")
    } else {
        Error::Io(err)
    }
}

impl Backend for ZlibFile {
    fn format(&self) -> Format {
        Format::Zlib
    }

    fn supports_offsets(&self) -> bool {
        false
    }

    fn raw_open(&mut self, path: &Path, mode: Mode) -> Result<()> {
        let state = match mode {
            Mode::Read => {
                let file = File::open(path)?;
                let file_len = file.metadata()?.len();
                State::Read {
                    decoder: MultiGzDecoder::new(file),
                    file_len,
                    tail: Tail::Pending,
                }
            }
            Mode::Write => {
                self.options.validate()?;
                let file = File::create(path)?;
                State::Write {
                    encoder: GzEncoder::new(
                        BufWriter::new(file),
                        Compression::new(self.options.zlib_level),
                    ),
                }
            }
        };
        self.state = Some(state);
        Ok(())
    }

    fn raw_write(&mut self, buf: &[u8]) -> Result<()> {
        match &mut self.state {
            Some(State::Write { encoder }) => Ok(encoder.write_all(buf)?),
            _ => Err(Error::NotOpened),
        }
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.raw_read_some(&mut buf[filled..])? {
                0 => return Err(Error::UnexpectedEof),
                n => filled += n,
            }
        }
        Ok(())
    }

    fn raw_read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let (decoder, tail) = self.reader()?;
        if *tail == Tail::Failed {
            return Err(Error::Corrupt("gzip stream failed to decode"));
        }
        loop {
            match decoder.read(buf) {
                Ok(0) => {
                    *tail = Tail::Clean;
                    return Ok(0);
                }
                Ok(n) => return Ok(n),
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => {
                    *tail = Tail::Failed;
                    return Err(decode_err(err));
                }
            }
        }
    }

    fn raw_getc(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        self.raw_read(&mut byte).ok()?;
        Some(byte[0])
    }

    fn raw_close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if let State::Write { encoder } = state {
            let finished = encoder
                .finish()
                .and_then(|writer| writer.into_inner().map_err(|e| e.into_error()))
                .and_then(|file| file.sync_all());
            if let Err(err) = finished {
                log::warn!("zlib: failed to finish stream: {err}");
            }
        }
    }

    fn raw_flush(&mut self) -> Result<()> {
        match &mut self.state {
            Some(State::Write { encoder }) => {
                // Sync-flushes the deflate stream, then the buffered file.
                encoder.flush()?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn raw_skip(&mut self, len: u64) -> Result<()> {
        let (decoder, tail) = self.reader()?;
        if *tail == Tail::Failed {
            return Err(Error::Corrupt("gzip stream failed to decode"));
        }
        let skipped = match io::copy(&mut Read::by_ref(decoder).take(len), &mut io::sink()) {
            Ok(skipped) => skipped,
            Err(err) => {
                *tail = Tail::Failed;
                return Err(decode_err(err));
            }
        };
        if skipped != len {
            *tail = Tail::Clean;
            return Err(Error::UnexpectedEof);
        }
        Ok(())
    }

    fn percent_read(&mut self) -> u8 {
        match &mut self.state {
            Some(State::Read {
                tail: Tail::Clean, ..
            }) => 100,
            Some(State::Read {
                decoder, file_len, ..
            }) => {
                // The decoder buffers ahead, so the file position alone can
                // reach the end before a truncated member is found.
                let file_len = *file_len;
                match decoder.get_mut().stream_position() {
                    Ok(pos) => percent(pos, file_len).min(99),
                    Err(_) => 0,
                }
            }
            _ => 0,
        }
    }
}
