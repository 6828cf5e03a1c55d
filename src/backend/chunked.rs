//! Chunked container shared by the snappy and zstd backends.
//!
//! Layout: a 2-byte magic, then chunks of
//! `[u32 LE compressed length][compressed block]`. Every block decodes on its
//! own, so an [`Offset`] is the file position of a chunk header plus a byte
//! count into the decoded chunk.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{percent, Format};
use crate::file::{Backend, Mode};
use crate::offset::Offset;
use crate::options::{WriteOptions, MAX_CHUNK_SIZE};
use crate::{Error, Result};

pub const CHUNK_HEADER_LEN: usize = 4;

/// Block compressor for one chunked format.
pub trait ChunkCodec {
    const FORMAT: Format;
    const MAGIC: [u8; 2];

    fn compress(&mut self, input: &[u8], options: &WriteOptions) -> Result<Vec<u8>>;

    /// Decodes one block. Output larger than `MAX_CHUNK_SIZE` is corrupt.
    fn decompress(&mut self, input: &[u8]) -> Result<Vec<u8>>;

    /// Worst-case compressed size for `len` input bytes.
    fn max_compressed_len(&self, len: usize) -> usize;
}

pub struct ChunkedFile<C: ChunkCodec> {
    codec: C,
    options: WriteOptions,
    state: Option<State>,
}

enum State {
    Read(ReadState),
    Write(WriteState),
}

struct ReadState {
    file: BufReader<File>,
    file_len: u64,
    /// File position of the header of the chunk held in `cache`.
    chunk_start: u64,
    /// File position of the next chunk header.
    next_chunk: u64,
    cache: Vec<u8>,
    pos: usize,
    /// Set after a rejected offset; reads report end of stream.
    parked: bool,
}

struct WriteState {
    file: BufWriter<File>,
    /// Bytes written to the file so far, i.e. where the pending chunk lands.
    written: u64,
    cache: Vec<u8>,
}

impl<C: ChunkCodec + Default> Default for ChunkedFile<C> {
    fn default() -> Self {
        Self::with_codec(C::default(), WriteOptions::default())
    }
}

impl<C: ChunkCodec + Default> ChunkedFile<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: WriteOptions) -> Self {
        Self::with_codec(C::default(), options)
    }
}

impl<C: ChunkCodec> ChunkedFile<C> {
    pub fn with_codec(codec: C, options: WriteOptions) -> Self {
        Self {
            codec,
            options,
            state: None,
        }
    }

    fn open_read(&mut self, path: &Path) -> Result<ReadState> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut file = BufReader::new(file);
        let mut magic = [0u8; 2];
        if read_full(&mut file, &mut magic)? != magic.len() || magic != C::MAGIC {
            return Err(Error::Corrupt("magic mismatch"));
        }
        let first = C::MAGIC.len() as u64;
        Ok(ReadState {
            file,
            file_len,
            chunk_start: first,
            next_chunk: first,
            cache: Vec::new(),
            pos: 0,
            parked: false,
        })
    }

    fn open_write(&mut self, path: &Path) -> Result<WriteState> {
        self.options.validate()?;
        let mut file = BufWriter::new(File::create(path)?);
        file.write_all(&C::MAGIC)?;
        Ok(WriteState {
            file,
            written: C::MAGIC.len() as u64,
            cache: Vec::with_capacity(self.options.chunk_size),
        })
    }

    fn split(&mut self) -> (&mut C, &WriteOptions, Option<&mut State>) {
        (&mut self.codec, &self.options, self.state.as_mut())
    }

    fn reader(&mut self) -> Result<(&mut C, &mut ReadState)> {
        match self.split() {
            (codec, _, Some(State::Read(read))) => Ok((codec, read)),
            _ => Err(Error::NotOpened),
        }
    }

    fn writer(&mut self) -> Result<(&mut C, &WriteOptions, &mut WriteState)> {
        match self.split() {
            (codec, options, Some(State::Write(write))) => Ok((codec, options, write)),
            _ => Err(Error::NotOpened),
        }
    }
}

impl ReadState {
    fn available(&self) -> &[u8] {
        &self.cache[self.pos..]
    }

    /// Loads the chunk whose header starts at the reader's current file
    /// position. Returns false at a clean end of file.
    fn load_next<C: ChunkCodec>(&mut self, codec: &mut C) -> Result<bool> {
        if self.parked {
            return Ok(false);
        }
        let start = self.next_chunk;
        let mut header = [0u8; CHUNK_HEADER_LEN];
        match read_full(&mut self.file, &mut header)? {
            0 => return Ok(false),
            CHUNK_HEADER_LEN => {}
            _ => return Err(Error::Corrupt("truncated chunk header")),
        }
        let compressed_len = u32::from_le_bytes(header) as usize;
        if compressed_len > codec.max_compressed_len(MAX_CHUNK_SIZE) {
            return Err(Error::Corrupt("chunk length exceeds limit"));
        }
        let mut compressed = vec![0u8; compressed_len];
        if read_full(&mut self.file, &mut compressed)? != compressed_len {
            return Err(Error::Corrupt("truncated chunk"));
        }
        self.cache = codec.decompress(&compressed)?;
        self.pos = 0;
        self.chunk_start = start;
        self.next_chunk = start + (CHUNK_HEADER_LEN + compressed_len) as u64;
        log::trace!(
            "{}: loaded chunk at {} ({} -> {} bytes)",
            C::FORMAT,
            start,
            compressed_len,
            self.cache.len()
        );
        Ok(true)
    }

    /// Makes at least one unread byte available. False at end of stream.
    fn fill<C: ChunkCodec>(&mut self, codec: &mut C) -> Result<bool> {
        while self.pos >= self.cache.len() {
            if !self.load_next(codec)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn park(&mut self) {
        self.cache.clear();
        self.pos = 0;
        self.parked = true;
    }
}

impl WriteState {
    fn emit_chunk<C: ChunkCodec>(&mut self, codec: &mut C, options: &WriteOptions) -> Result<()> {
        if self.cache.is_empty() {
            return Ok(());
        }
        let compressed = codec.compress(&self.cache, options)?;
        let compressed_len = u32::try_from(compressed.len())
            .map_err(|_| Error::Corrupt("compressed chunk exceeds u32 limit"))?;
        self.file.write_all(&compressed_len.to_le_bytes())?;
        self.file.write_all(&compressed)?;
        log::trace!(
            "{}: wrote chunk at {} ({} -> {} bytes)",
            C::FORMAT,
            self.written,
            self.cache.len(),
            compressed.len()
        );
        self.written += (CHUNK_HEADER_LEN + compressed.len()) as u64;
        self.cache.clear();
        Ok(())
    }
}

impl<C: ChunkCodec> Backend for ChunkedFile<C> {
    fn format(&self) -> Format {
        C::FORMAT
    }

    fn supports_offsets(&self) -> bool {
        true
    }

    fn raw_open(&mut self, path: &Path, mode: Mode) -> Result<()> {
        let state = match mode {
            Mode::Read => State::Read(self.open_read(path)?),
            Mode::Write => State::Write(self.open_write(path)?),
        };
        self.state = Some(state);
        Ok(())
    }

    fn raw_write(&mut self, mut buf: &[u8]) -> Result<()> {
        let (codec, options, write) = self.writer()?;
        while !buf.is_empty() {
            let room = options.chunk_size - write.cache.len();
            let take = room.min(buf.len());
            write.cache.extend_from_slice(&buf[..take]);
            buf = &buf[take..];
            if write.cache.len() >= options.chunk_size {
                write.emit_chunk(codec, options)?;
            }
        }
        Ok(())
    }

    fn raw_read(&mut self, buf: &mut [u8]) -> Result<()> {
        let (codec, read) = self.reader()?;
        let mut filled = 0;
        while filled < buf.len() {
            if !read.fill(codec)? {
                return Err(Error::UnexpectedEof);
            }
            let available = read.available();
            let take = available.len().min(buf.len() - filled);
            buf[filled..filled + take].copy_from_slice(&available[..take]);
            read.pos += take;
            filled += take;
        }
        Ok(())
    }

    /// Never crosses a chunk boundary, so `current_offset` afterwards names
    /// the chunk the returned bytes came from.
    fn raw_read_some(&mut self, buf: &mut [u8]) -> Result<usize> {
        let (codec, read) = self.reader()?;
        if buf.is_empty() || !read.fill(codec)? {
            return Ok(0);
        }
        let available = read.available();
        let take = available.len().min(buf.len());
        buf[..take].copy_from_slice(&available[..take]);
        read.pos += take;
        Ok(take)
    }

    fn raw_getc(&mut self) -> Option<u8> {
        let (codec, read) = self.reader().ok()?;
        match read.fill(codec) {
            Ok(true) => {
                let byte = read.cache[read.pos];
                read.pos += 1;
                Some(byte)
            }
            Ok(false) => None,
            Err(err) => {
                log::debug!("{}: getc failed: {err}", C::FORMAT);
                None
            }
        }
    }

    fn raw_close(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        if let State::Write(mut write) = state {
            let finished = write
                .emit_chunk(&mut self.codec, &self.options)
                .and_then(|()| {
                    let file = write.file.into_inner().map_err(|e| e.into_error())?;
                    file.sync_all()?;
                    Ok(())
                });
            if let Err(err) = finished {
                log::warn!("{}: failed to finish file: {err}", C::FORMAT);
            }
        }
    }

    fn raw_flush(&mut self) -> Result<()> {
        let (codec, options, write) = self.writer()?;
        write.emit_chunk(codec, options)?;
        write.file.flush()?;
        Ok(())
    }

    fn raw_skip(&mut self, len: u64) -> Result<()> {
        let (codec, read) = self.reader()?;
        let mut remaining = len;
        while remaining > 0 {
            if !read.fill(codec)? {
                return Err(Error::UnexpectedEof);
            }
            let take = (read.available().len() as u64).min(remaining);
            read.pos += take as usize;
            remaining -= take;
        }
        Ok(())
    }

    fn current_offset(&mut self) -> Offset {
        match &self.state {
            Some(State::Read(read)) => Offset::new(read.chunk_start, read.pos as u32),
            Some(State::Write(write)) => Offset::new(write.written, write.cache.len() as u32),
            None => Offset::default(),
        }
    }

    /// Seeks to `offset.chunk` and decodes that chunk. Chunk 0 means the
    /// first chunk. A chunk position at end of file with `offset_in_chunk`
    /// 0 is the end of the stream. Anything that fails to decode, or an
    /// offset past the decoded chunk, is rejected and parks the reader at
    /// end of stream until a valid offset is set.
    fn set_current_offset(&mut self, offset: Offset) -> Result<()> {
        let (codec, read) = self.reader()?;
        let invalid = Error::InvalidOffset {
            chunk: offset.chunk,
            offset_in_chunk: offset.offset_in_chunk,
        };
        let target = match offset.chunk {
            0 => C::MAGIC.len() as u64,
            chunk => chunk,
        };
        if target > read.file_len {
            read.park();
            return Err(invalid);
        }
        read.file.seek(SeekFrom::Start(target))?;
        read.parked = false;
        read.next_chunk = target;
        read.cache.clear();
        read.pos = 0;
        read.chunk_start = target;
        match read.load_next(codec) {
            Ok(true) if offset.offset_in_chunk as usize <= read.cache.len() => {
                read.pos = offset.offset_in_chunk as usize;
                Ok(())
            }
            Ok(false) if offset.offset_in_chunk == 0 => Ok(()),
            Ok(_) => {
                read.park();
                Err(invalid)
            }
            Err(err) => {
                log::debug!("{}: rejected offset {offset:?}: {err}", C::FORMAT);
                read.park();
                Err(invalid)
            }
        }
    }

    fn percent_read(&mut self) -> u8 {
        match &self.state {
            Some(State::Read(read)) if read.parked => 100,
            Some(State::Read(read)) => percent(read.next_chunk, read.file_len),
            _ => 0,
        }
    }
}

/// Reads until `buf` is full or the reader hits end of file.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(filled)
}
