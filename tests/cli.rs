#![cfg(feature = "cli")]

use std::process::Command;

use tempfile::tempdir;
use tracefile::{open_for_read, open_for_write, Format, WriteOptions};

fn tracefile() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tracefile"))
}

#[test]
fn repack_then_info_reports_the_new_format() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("input.trace");
    let output = dir.path().join("output.gz");
    let data: Vec<u8> = (0..70_000).map(|i| (i % 199) as u8).collect();

    let options = WriteOptions::default().with_chunk_size(16 * 1024);
    let mut file = open_for_write(&input, Format::Snappy, options).expect("open");
    file.write(&data).expect("write");
    file.close();

    let status = tracefile()
        .args(["repack", "--format", "zlib"])
        .arg(&input)
        .arg(&output)
        .status()
        .expect("run repack");
    assert!(status.success());

    let mut repacked = open_for_read(&output).expect("open output");
    assert_eq!(repacked.format(), Format::Zlib);
    let mut buf = vec![0u8; data.len()];
    repacked.read(&mut buf).expect("read");
    assert_eq!(buf, data);
    assert_eq!(repacked.getc(), None);

    let out = tracefile()
        .args(["info", "--json", "--chunks"])
        .arg(&input)
        .output()
        .expect("run info");
    assert!(out.status.success());
    let report: serde_json::Value = serde_json::from_slice(&out.stdout).expect("json");
    assert_eq!(report["format"], "snappy");
    assert_eq!(report["uncompressed_len"], 70_000);
    assert_eq!(report["supports_offsets"], true);
    let chunks = report["chunks"].as_array().expect("chunks");
    assert_eq!(chunks.len(), 5);
    assert_eq!(chunks[0]["chunk"], 2);
}

#[test]
fn info_fails_on_unknown_input() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"not a trace").expect("write");

    let status = tracefile().arg("info").arg(&path).status().expect("run info");
    assert!(!status.success());
}

#[test]
fn repack_fails_on_truncated_gzip() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("cut.gz");
    let output = dir.path().join("out.trace");
    let data: Vec<u8> = (0..20_000u32).map(|i| (i * 7 % 253) as u8).collect();

    let mut file = open_for_write(&input, Format::Zlib, WriteOptions::default()).expect("open");
    file.write(&data).expect("write");
    file.close();
    let bytes = std::fs::read(&input).expect("read");
    std::fs::write(&input, &bytes[..bytes.len() / 2]).expect("truncate");

    let out = tracefile()
        .arg("repack")
        .arg(&input)
        .arg(&output)
        .output()
        .expect("run repack");
    assert!(!out.status.success());
    assert!(!out.stderr.is_empty());

    let status = tracefile().arg("info").arg(&input).status().expect("run info");
    assert!(!status.success());
}
