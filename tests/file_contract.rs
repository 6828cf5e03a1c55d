use tempfile::tempdir;
use tracefile::{
    open_for_read, Error, File, Format, Mode, SnappyFile, WriteOptions, ZlibFile, ZstdFile,
};

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 251) as u8).collect()
}

/// Small chunks so multi-chunk paths get exercised.
fn options() -> WriteOptions {
    WriteOptions::default().with_chunk_size(1000)
}

fn write_trace(path: &std::path::Path, format: Format, parts: &[&[u8]]) {
    let mut file = File::new(format.new_backend(options()));
    file.open(path, Mode::Write).expect("open for write");
    for part in parts {
        file.write(part).expect("write");
    }
    file.flush().expect("flush");
    file.close();
}

#[test]
fn write_then_read_round_trip() {
    let dir = tempdir().expect("tempdir");
    let data = sample(10_000);
    for format in Format::ALL {
        let path = dir.path().join(format!("trace.{format}"));
        write_trace(&path, format, &[&data[..3], &data[3..4500], &data[4500..]]);

        let mut file = open_for_read(&path).expect("open for read");
        assert_eq!(file.format(), format);
        let mut first = vec![0u8; 1234];
        let mut rest = vec![0u8; data.len() - first.len()];
        file.read(&mut first).expect("read first");
        file.read(&mut rest).expect("read rest");
        assert_eq!(first, &data[..1234]);
        assert_eq!(rest, &data[1234..]);
        assert!(matches!(file.read(&mut [0u8; 1]), Err(Error::UnexpectedEof)));
    }
}

#[test]
fn read_some_drains_every_format() {
    let dir = tempdir().expect("tempdir");
    let data = sample(7_777);
    for format in Format::ALL {
        let path = dir.path().join(format!("some.{format}"));
        write_trace(&path, format, &[&data]);

        let mut file = open_for_read(&path).expect("open");
        let mut out = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = file.read_some(&mut buf).expect("read_some");
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, data, "{format}");
        assert_eq!(file.read_some(&mut buf).expect("read_some at end"), 0);
        assert_eq!(file.percent_read(), 100, "{format}");
    }
}

#[test]
fn getc_returns_bytes_then_end_of_stream() {
    let dir = tempdir().expect("tempdir");
    for format in Format::ALL {
        let path = dir.path().join(format!("getc.{format}"));
        write_trace(&path, format, &[&[0x01, 0x02, 0x03]]);

        let mut file = File::new(format.new_backend(WriteOptions::default()));
        file.open(&path, Mode::Read).expect("open");
        assert_eq!(file.getc(), Some(1));
        assert_eq!(file.getc(), Some(2));
        assert_eq!(file.getc(), Some(3));
        assert_eq!(file.getc(), None);
    }
}

#[test]
fn short_read_fails() {
    let dir = tempdir().expect("tempdir");
    for format in Format::ALL {
        let path = dir.path().join(format!("short.{format}"));
        write_trace(&path, format, &[b"abc"]);

        let mut file = open_for_read(&path).expect("open");
        assert!(file.read(&mut [0u8; 4]).is_err());
    }
}

#[test]
fn skip_matches_read_and_discard() {
    let dir = tempdir().expect("tempdir");
    let data = sample(5_000);
    for format in Format::ALL {
        let path = dir.path().join(format!("skip.{format}"));
        write_trace(&path, format, &[&data]);

        for n in [0u64, 1, 999, 1000, 1001, 4_000] {
            let mut skipped = open_for_read(&path).expect("open");
            skipped.skip(n).expect("skip");
            let mut after_skip = [0u8; 64];
            skipped.read(&mut after_skip).expect("read after skip");

            let mut discarded = open_for_read(&path).expect("open");
            let mut scratch = vec![0u8; n as usize];
            discarded.read(&mut scratch).expect("read discard");
            let mut after_read = [0u8; 64];
            discarded.read(&mut after_read).expect("read after discard");

            assert_eq!(after_skip, after_read, "{format} skip {n}");
            assert_eq!(&after_skip[..], &data[n as usize..n as usize + 64]);
        }

        let mut file = open_for_read(&path).expect("open");
        assert!(matches!(file.skip(5_001), Err(Error::UnexpectedEof)));
    }
}

#[test]
fn wrong_mode_is_rejected_without_closing() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("mode.trace");

    let mut writer = File::new(SnappyFile::new());
    writer.open(&path, Mode::Write).expect("open write");
    assert!(matches!(
        writer.read(&mut [0u8; 1]),
        Err(Error::WrongMode { expected: Mode::Read, actual: Mode::Write })
    ));
    assert_eq!(writer.getc(), None);
    assert!(writer.skip(1).is_err());
    assert!(writer.is_opened());
    writer.write(b"payload").expect("write still works");
    writer.close();

    let mut reader = File::new(SnappyFile::new());
    reader.open(&path, Mode::Read).expect("open read");
    let err = reader.write(b"x").unwrap_err();
    assert!(err.is_misuse());
    assert!(reader.is_opened());
    let mut buf = [0u8; 7];
    reader.read(&mut buf).expect("read");
    assert_eq!(&buf, b"payload");
}

#[test]
fn close_is_idempotent() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("close.gz");

    let mut never_opened = File::new(ZlibFile::new());
    never_opened.close();
    never_opened.close();
    assert!(!never_opened.is_opened());

    let mut file = File::new(ZlibFile::new());
    file.open(&path, Mode::Write).expect("open");
    file.write(b"data").expect("write");
    file.close();
    file.close();
    assert!(!file.is_opened());
    assert!(matches!(file.write(b"more"), Err(Error::NotOpened)));
}

#[test]
fn drop_finishes_the_stream() {
    let dir = tempdir().expect("tempdir");
    for format in Format::ALL {
        let path = dir.path().join(format!("drop.{format}"));
        {
            let mut file = File::new(format.new_backend(WriteOptions::default()));
            file.open(&path, Mode::Write).expect("open");
            file.write(b"unflushed tail").expect("write");
        }
        let mut file = open_for_read(&path).expect("open");
        let mut buf = [0u8; 14];
        file.read(&mut buf).expect("read");
        assert_eq!(&buf, b"unflushed tail");
    }
}

#[test]
fn reopen_switches_file_and_mode() {
    let dir = tempdir().expect("tempdir");
    let first = dir.path().join("first.zst");
    let second = dir.path().join("second.zst");

    let mut file = File::bound(ZstdFile::new(), &first, Mode::Write);
    assert!(!file.is_opened());
    file.open_bound().expect("open bound");
    file.write(b"one").expect("write");

    file.open(&second, Mode::Write).expect("reopen");
    file.write(b"two").expect("write");

    file.open(&first, Mode::Read).expect("reopen first for read");
    assert_eq!(file.filename(), first.as_path());
    let mut buf = [0u8; 3];
    file.read(&mut buf).expect("read");
    assert_eq!(&buf, b"one");
    file.close();

    file.open(&second, Mode::Read).expect("open second");
    file.read(&mut buf).expect("read");
    assert_eq!(&buf, b"two");
}

#[test]
fn failed_open_leaves_handle_closed() {
    let dir = tempdir().expect("tempdir");
    let missing = dir.path().join("missing.trace");

    let mut file = File::new(SnappyFile::new());
    assert!(matches!(file.open(&missing, Mode::Read), Err(Error::Io(_))));
    assert!(!file.is_opened());

    let gz = dir.path().join("not-snappy.gz");
    write_trace(&gz, Format::Zlib, &[b"gzip"]);
    assert!(matches!(file.open(&gz, Mode::Read), Err(Error::Corrupt(_))));
    assert!(!file.is_opened());
}

#[test]
fn invalid_options_fail_open_for_write() {
    let dir = tempdir().expect("tempdir");
    for format in Format::ALL {
        let path = dir.path().join(format!("bad.{format}"));
        let options = WriteOptions {
            zlib_level: 42,
            ..WriteOptions::default()
        };
        let mut file = File::new(format.new_backend(options));
        assert!(matches!(
            file.open(&path, Mode::Write),
            Err(Error::InvalidConfig(_))
        ));
        assert!(!file.is_opened());
        assert!(!path.exists());
    }
}

#[test]
fn flush_makes_data_readable_before_close() {
    let dir = tempdir().expect("tempdir");
    for format in [Format::Snappy, Format::Zstd] {
        let path = dir.path().join(format!("flush.{format}"));
        let mut writer = File::new(format.new_backend(WriteOptions::default()));
        writer.open(&path, Mode::Write).expect("open");
        writer.write(b"visible").expect("write");
        writer.flush().expect("flush");

        let mut reader = open_for_read(&path).expect("open reader");
        let mut buf = [0u8; 7];
        reader.read(&mut buf).expect("read flushed bytes");
        assert_eq!(&buf, b"visible");
        writer.close();
    }
}
