// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end runs of the `otdr` binary.
#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use otdr_dry_tests::{metadata_only_file, single_wavelength_file, two_wavelength_file};
use predicates::prelude::*;
use tempfile::TempDir;

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

fn otdr() -> Command {
    let mut cmd = Command::cargo_bin("otdr").unwrap();
    cmd.arg("--no-config").env_remove("RUST_LOG");
    cmd
}

#[test]
fn inspect_prints_link_summary() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "span.sor", &two_wavelength_file());
    otdr()
        .arg("inspect")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("F012/CABLE-07"))
        .stdout(predicate::str::contains("Acme Photonics OT-9000 (4.2.1) - SN123456"))
        .stdout(predicate::str::contains("1.750 dB"))
        .stdout(predicate::str::contains("info: vendor blocks preserved (AcmeTrace)"));
}

#[test]
fn inspect_json_is_the_decoded_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "span.sor", &two_wavelength_file());
    let output = otdr()
        .args(["inspect", "--json"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["general"]["fiber_id"], "F012");
    assert_eq!(json["traces"].as_array().map(Vec::len), Some(2));
}

#[test]
fn inspect_derives_unreported_loss() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "single.sor", &single_wavelength_file());
    otdr()
        .args(["inspect", "--unit", "m"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("1.250 dB (derived)"))
        .stdout(predicate::str::contains(" m "));
}

#[test]
fn blocks_lists_directory() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "span.sor", &two_wavelength_file());
    otdr()
        .arg("blocks")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("GenParams"))
        .stdout(predicate::str::contains("AcmeTrace"))
        .stdout(predicate::str::contains("opaque"))
        .stdout(predicate::str::contains("Cksum"));
}

#[test]
fn events_lists_key_events() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "span.sor", &two_wavelength_file());
    otdr()
        .arg("events")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("end of fiber"))
        .stdout(predicate::str::contains("non-reflective"));
}

#[test]
fn trace_emits_tsv() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "span.sor", &two_wavelength_file());
    let output = otdr()
        .args(["trace", "--stride", "32", "--format", "tsv"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "distance_m\tpower_db");
    assert_eq!(lines[1], "0.0000\t2.0000");
}

#[test]
fn trace_out_of_range_fails() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "meta.sor", &metadata_only_file());
    otdr()
        .arg("trace")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("has no trace 0 (0 traces)"));
}

#[test]
fn bad_magic_exits_with_chain() {
    let dir = TempDir::new().unwrap();
    let mut bytes = two_wavelength_file();
    bytes[..4].copy_from_slice(b"XXXX");
    let path = write(&dir, "bad.sor", &bytes);
    otdr()
        .arg("inspect")
        .arg(&path)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot load"))
        .stderr(predicate::str::contains("bad magic"));
}

#[test]
fn missing_file_fails() {
    let dir = TempDir::new().unwrap();
    otdr()
        .arg("blocks")
        .arg(dir.path().join("absent.sor"))
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("absent.sor"));
}

#[test]
fn batch_reports_every_file_and_fails_on_any_error() {
    let dir = TempDir::new().unwrap();
    let good = write(&dir, "good.sor", &two_wavelength_file());
    let meta = write(&dir, "meta.sod", &metadata_only_file());
    let bad = write(&dir, "bad.sor", b"not a trace");
    otdr()
        .arg("batch")
        .args([&good, &meta, &bad])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("good.sor"))
        .stdout(predicate::str::contains("meta.sod"))
        .stdout(predicate::str::contains("bad.sor"))
        .stdout(predicate::str::contains("error: load failed (failed to decode bad.sor"))
        .stderr(predicate::str::contains("1 of 3 files failed to load"));
}

#[test]
fn batch_of_good_files_succeeds() {
    let dir = TempDir::new().unwrap();
    let a = write(&dir, "a.sor", &two_wavelength_file());
    let b = write(&dir, "b.sor", &single_wavelength_file());
    otdr()
        .arg("batch")
        .args([&a, &b])
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}
