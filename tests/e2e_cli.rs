//! CLI end-to-end tests
//!
//! Tests for streamforged command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the streamforged binary
#[allow(deprecated)]
fn streamforged_cmd() -> Command {
    let mut cmd = Command::cargo_bin("streamforged").unwrap();
    cmd.env("RUST_LOG", "off");
    cmd
}

fn chunk(id: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend((payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn list(id: &[u8; 4], sub_type: &[u8; 4], children: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.extend(((children.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(sub_type);
    out.extend_from_slice(children);
    out
}

fn dwords(values: &[u32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// One 320x240 video stream, 10 frames at 33333us.
fn avi_bytes() -> Vec<u8> {
    let mut strh = b"vidsDIB ".to_vec();
    strh.extend(dwords(&[0, 0, 0, 1, 30, 0, 10, 0, 0, 0]));
    let strl = list(b"LIST", b"strl", &chunk(b"strh", &strh));

    let mut hdrl = chunk(
        b"avih",
        &dwords(&[33333, 0, 0, 0, 10, 0, 1, 0, 320, 240, 0, 0, 0, 0]),
    );
    hdrl.extend(strl);

    let mut body = list(b"LIST", b"hdrl", &hdrl);
    body.extend(list(b"LIST", b"movi", &chunk(b"00dc", b"frame")));
    list(b"RIFF", b"AVI ", &body)
}

/// A single Vorbis stream lasting 2 seconds.
fn ogg_bytes() -> Vec<u8> {
    let mut vorbis = b"\x01vorbis".to_vec();
    vorbis.extend(0u32.to_le_bytes());
    vorbis.push(2);
    vorbis.extend(44_100u32.to_le_bytes());
    vorbis.extend([0u8; 14]);

    let page = |flags: u8, granule: u64, sequence: u32, payload: &[u8]| {
        let mut out = b"OggS\0".to_vec();
        out.push(flags);
        out.extend(granule.to_le_bytes());
        out.extend(0x51u32.to_le_bytes());
        out.extend(sequence.to_le_bytes());
        out.extend(0u32.to_le_bytes());
        out.push(1);
        out.push(payload.len() as u8);
        out.extend_from_slice(payload);
        out
    };

    let mut out = page(0x02, 0, 0, &vorbis);
    out.extend(page(0x04, 88_200, 1, b"audio"));
    out
}

fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn write_config(dir: &Path, content: &str) -> PathBuf {
    let path = dir.join("streamforged.toml");
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = streamforged_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = streamforged_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("streamforged"))
        .stdout(predicate::str::contains("records"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = streamforged_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("streamforged"));
}

#[test]
fn test_cli_probe_avi() {
    let dir = tempdir().unwrap();
    let avi = write_fixture(&dir, "clip.avi", &avi_bytes());

    let mut cmd = streamforged_cmd();
    cmd.arg("probe")
        .arg(&avi)
        .assert()
        .success()
        .stdout(predicate::str::contains("Container: RIFF (AVI)"))
        .stdout(predicate::str::contains("Duration: 00:00:00.333"))
        .stdout(predicate::str::contains("Declared streams: 1"))
        .stdout(predicate::str::contains("video DIB 320x240"));
}

#[test]
fn test_cli_probe_json() {
    let dir = tempdir().unwrap();
    let ogg = write_fixture(&dir, "audio.ogg", &ogg_bytes());

    let output = streamforged_cmd()
        .args(["probe", "--json"])
        .arg(&ogg)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["container"], "Ogg");
    assert_eq!(json["tracks"][0]["media_kind"], "audio");
    assert_eq!(json["tracks"][0]["id"], 0x51);
    assert_eq!(json["duration"]["secs"], 2);
}

#[test]
fn test_cli_probe_missing_file() {
    let mut cmd = streamforged_cmd();
    cmd.args(["probe", "/nonexistent/clip.avi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_records_nesting() {
    let dir = tempdir().unwrap();
    let avi = write_fixture(&dir, "clip.avi", &avi_bytes());

    let mut cmd = streamforged_cmd();
    cmd.arg("records")
        .arg(&avi)
        .assert()
        .success()
        .stdout(predicate::str::contains("RIFFAVI "))
        .stdout(predicate::str::contains("    avih"))
        .stdout(predicate::str::contains("      strh"));
}

#[test]
fn test_cli_records_limit_from_config() {
    let dir = tempdir().unwrap();
    let avi = write_fixture(&dir, "clip.avi", &avi_bytes());
    let config = write_config(dir.path(), "[output]\nrecord_limit = 2\n");

    let mut cmd = streamforged_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("records")
        .arg(&avi)
        .assert()
        .success()
        .stdout(predicate::str::contains("LISThdrl"))
        .stdout(predicate::str::contains("avih").not());
}

#[test]
fn test_cli_records_ogg_names() {
    let dir = tempdir().unwrap();
    let ogg = write_fixture(&dir, "audio.ogg", &ogg_bytes());

    let mut cmd = streamforged_cmd();
    cmd.args(["records", "--limit", "5"])
        .arg(&ogg)
        .assert()
        .success()
        .stdout(predicate::str::contains("vorbis"))
        .stdout(predicate::str::contains("OggS"));
}

#[test]
fn test_cli_tracks() {
    let dir = tempdir().unwrap();
    let ogg = write_fixture(&dir, "audio.ogg", &ogg_bytes());

    let mut cmd = streamforged_cmd();
    cmd.arg("tracks")
        .arg(&ogg)
        .assert()
        .success()
        .stdout(predicate::str::contains("Tracks: 1"))
        .stdout(predicate::str::contains("audio vorbis 2ch 44100 Hz"));
}

#[test]
fn test_cli_tracks_payload_limit() {
    let dir = tempdir().unwrap();
    let avi = write_fixture(&dir, "clip.avi", &avi_bytes());
    let config = write_config(dir.path(), "[reader]\nmax_payload_size = 16\n");

    let mut cmd = streamforged_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("tracks")
        .arg(&avi)
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds maximum"));
}

#[test]
fn test_cli_detect() {
    let dir = tempdir().unwrap();
    let avi = write_fixture(&dir, "clip.avi", &avi_bytes());
    let ogg = write_fixture(&dir, "audio.bin", &ogg_bytes());
    let wav = write_fixture(&dir, "empty.wav", b"");
    let other = write_fixture(&dir, "notes.txt", b"hello world");

    let mut cmd = streamforged_cmd();
    cmd.arg("detect")
        .args([&avi, &ogg, &wav, &other])
        .assert()
        .success()
        .stdout(predicate::str::contains("clip.avi: RIFF"))
        .stdout(predicate::str::contains("audio.bin: Ogg"))
        .stdout(predicate::str::contains("empty.wav: RIFF"))
        .stdout(predicate::str::contains("notes.txt: unknown"));
}

#[test]
fn test_cli_validate_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[reader]\nmax_payload_size = 4096\n");

    let mut cmd = streamforged_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("4096"));
}

#[test]
fn test_cli_validate_rejects_zero_payload_size() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), "[reader]\nmax_payload_size = 0\n");

    let mut cmd = streamforged_cmd();
    cmd.arg("validate")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_payload_size"));
}
