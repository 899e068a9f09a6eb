//! End-to-end workflow tests for provmark.
//!
//! These tests run embed, extract and validate against real image folders
//! in a temporary workspace and check the files they leave behind.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::{DynamicImage, ImageBuffer, Rgb};
use predicates::prelude::*;
use tempfile::TempDir;

fn provmark(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("provmark").unwrap();
    cmd.env("PROVMARK_HOME", home.path())
        .env_remove("PROVMARK_ORIGINALS_DIR")
        .env_remove("PROVMARK_WATERMARKED_DIR")
        .env_remove("PROVMARK_EXTRACTED_DIR")
        .env_remove("PROVMARK_LOG_DIR")
        .env_remove("PROVMARK_STRENGTH")
        .env_remove("PROVMARK_HASH")
        .env_remove("RUST_LOG");
    cmd
}

/// Mid-range gradient large enough for a full provenance payload.
fn write_image(path: &Path, seed: u32) {
    let img = ImageBuffer::from_fn(512, 384, |x, y| {
        Rgb([
            (60 + (x + seed) % 120) as u8,
            (70 + (y * 2 + seed) % 110) as u8,
            (80 + (x + y) % 100) as u8,
        ])
    });
    DynamicImage::ImageRgb8(img).save(path).unwrap();
}

fn originals(home: &TempDir) -> std::path::PathBuf {
    let dir = home.path().join("images").join("originals");
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn ledger_text(home: &TempDir) -> String {
    fs::read_to_string(home.path().join("logs").join("watermark_log.log")).unwrap()
}

fn identifiers(ledger: &str) -> Vec<String> {
    ledger
        .lines()
        .filter_map(|line| {
            let start = line.find("UUID=")? + "UUID=".len();
            let rest = &line[start..];
            Some(rest[..rest.find(',')?].to_string())
        })
        .collect()
}

// ============================================================================
// Complete Workflow Tests: Embed → Extract → Validate
// ============================================================================

#[test]
fn test_e2e_embed_extract_validate() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("harbour.png"), 0);

    // Step 1: Embed
    provmark(&home)
        .arg("embed")
        .assert()
        .success()
        .stdout(predicate::str::contains("Processing: harbour.png (1/1)"));

    let marked = home
        .path()
        .join("images")
        .join("watermarked")
        .join("watermarked_harbour.png");
    assert!(marked.exists(), "watermarked image should exist");

    let ledger = ledger_text(&home);
    assert!(ledger.contains("INFO: Image 'harbour.png' was watermarked. UUID="));
    assert!(ledger.contains("Folder='originals'"));
    assert!(ledger.contains("len_wm="));

    // Step 2: Extract
    provmark(&home)
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("[WATERMARK EXTRACT] Extracted Watermark:"))
        .stdout(predicate::str::contains("Watermark is valid"));

    let extraction_log =
        fs::read_to_string(home.path().join("logs").join("extraction_log.log")).unwrap();
    assert!(extraction_log.contains("Watermark extracted from 'harbour.png'"));
    assert!(extraction_log.contains("[WATERMARK EMBED]"));

    // Step 3: Validate the recorded identifier
    let ids = identifiers(&ledger);
    assert_eq!(ids.len(), 1);
    provmark(&home)
        .args(["validate", &ids[0]])
        .assert()
        .success()
        .stdout(predicate::str::contains("harbour.png"));
}

#[test]
fn test_e2e_batch_of_mixed_formats() {
    let home = TempDir::new().unwrap();
    let dir = originals(&home);
    write_image(&dir.join("a.png"), 1);
    write_image(&dir.join("b.jpg"), 2);
    fs::write(dir.join("notes.txt"), "not an image").unwrap();

    provmark(&home)
        .args(["embed", "--hash", "sha3-256"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(2/2)"));

    let ledger = ledger_text(&home);
    assert_eq!(ledger.lines().count(), 2);
    let ids = identifiers(&ledger);
    assert_ne!(ids[0], ids[1]);
    // SHA3-256 hex digests are 64 characters, like SHA-256
    assert!(ledger.lines().all(|l| l.split("Hash=").nth(1).map(str::len) == Some(64)));

    provmark(&home).arg("extract").assert().success();
}

#[test]
fn test_e2e_md5_hashes_for_legacy_ledgers() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("a.png"), 8);

    provmark(&home)
        .args(["embed", "--hash", "md5"])
        .assert()
        .success();

    let ledger = ledger_text(&home);
    let digest = ledger.trim_end().split("Hash=").nth(1).unwrap();
    assert_eq!(digest.len(), 32);
    provmark(&home).arg("extract").assert().success();
}

#[test]
fn test_e2e_prefixed_original_roundtrips() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("watermarked_pier.png"), 10);

    provmark(&home).arg("embed").assert().success();
    assert!(home
        .path()
        .join("images")
        .join("watermarked")
        .join("watermarked_watermarked_pier.png")
        .exists());

    provmark(&home)
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("Watermark is valid"))
        .stdout(predicate::str::contains("Skipped").not());
}

#[test]
fn test_e2e_workspace_and_debug_log() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("a.png"), 11);

    provmark(&home).arg("embed").assert().success();

    assert!(home.path().join("images").join("extracted").is_dir());
    let debug_log = fs::read_to_string(home.path().join("logs").join("debug_log.log")).unwrap();
    assert!(debug_log.contains("Starting embed batch"), "{debug_log}");
    assert!(debug_log.contains("DEBUG"));

    // Later runs append to the same trace
    provmark(&home).arg("extract").assert().success();
    let debug_log = fs::read_to_string(home.path().join("logs").join("debug_log.log")).unwrap();
    assert!(debug_log.contains("Starting embed batch"));
    assert!(debug_log.contains("Starting extract batch"));
}

#[test]
fn test_e2e_json_events() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("a.png"), 3);

    let output = provmark(&home)
        .args(["embed", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let events: Vec<serde_json::Value> = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().map(|e| e["event"].as_str().unwrap()).collect();
    assert_eq!(kinds, ["started", "processing", "embedded", "finished"]);
    assert_eq!(events[0]["mode"], "embed");
    assert_eq!(events[2]["image_name"], "a.png");
    assert_eq!(events[3]["embedded"], 1);
}

// ============================================================================
// Validation Failures
// ============================================================================

#[test]
fn test_e2e_revoked_identifier_fails_extract() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("a.png"), 4);
    provmark(&home).arg("embed").assert().success();

    // Drop the identifier but keep the bit length so extraction still runs
    let path = home.path().join("logs").join("watermark_log.log");
    let ledger = ledger_text(&home);
    let id = identifiers(&ledger).remove(0);
    fs::write(&path, ledger.replace(&id, "revoked")).unwrap();

    provmark(&home)
        .arg("extract")
        .assert()
        .failure()
        .code(65)
        .stdout(predicate::str::contains("Watermark is NOT valid"));

    provmark(&home).args(["validate", &id]).assert().failure().code(65);
}

#[test]
fn test_e2e_unknown_image_is_skipped() {
    let home = TempDir::new().unwrap();
    let watermarked = home.path().join("images").join("watermarked");
    fs::create_dir_all(&watermarked).unwrap();
    write_image(&watermarked.join("watermarked_stray.png"), 5);

    provmark(&home)
        .arg("extract")
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped"))
        .stdout(predicate::str::contains("stray.png"));

    // Nothing was extracted, so nothing was logged
    assert!(!home.path().join("logs").join("extraction_log.log").exists());
}

#[test]
fn test_e2e_fixed_length_override() {
    let home = TempDir::new().unwrap();
    write_image(&originals(&home).join("a.png"), 6);
    provmark(&home).arg("embed").assert().success();

    let ledger = ledger_text(&home);
    let bit_len: usize = ledger
        .split("len_wm=")
        .nth(1)
        .and_then(|rest| rest.split(',').next())
        .unwrap()
        .parse()
        .unwrap();

    provmark(&home)
        .args(["extract", "--wm-len", &bit_len.to_string()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Watermark is valid"));
}

#[test]
fn test_e2e_custom_folders() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("shoot");
    let output = home.path().join("out");
    let logs = home.path().join("audit");
    fs::create_dir_all(&input).unwrap();
    write_image(&input.join("a.png"), 7);

    provmark(&home)
        .args(["embed", "--originals"])
        .arg(&input)
        .arg("--watermarked")
        .arg(&output)
        .arg("--log-dir")
        .arg(&logs)
        .assert()
        .success();

    assert!(output.join("watermarked_a.png").exists());
    let ledger = fs::read_to_string(logs.join("watermark_log.log")).unwrap();
    assert!(ledger.contains("Folder='shoot'"));

    provmark(&home)
        .args(["extract", "--watermarked"])
        .arg(&output)
        .arg("--log-dir")
        .arg(&logs)
        .assert()
        .success();
}
