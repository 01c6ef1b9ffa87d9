//! Integration tests for the `ocr-worker` binary.

use std::process::Command;

fn ocr_worker() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_ocr-worker"));
    cmd.env("RUST_LOG", "warn");
    cmd
}

#[test]
fn test_extract_missing_file_fails() {
    let output = ocr_worker()
        .args(["extract", "/nonexistent/datasheet.pdf"])
        .output()
        .expect("Failed to run ocr-worker");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to read /nonexistent/datasheet.pdf"));
}

#[test]
fn test_extract_garbage_prints_degraded_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.pdf");
    std::fs::write(&path, b"definitely not a pdf").unwrap();

    let output = ocr_worker()
        .current_dir(dir.path())
        .args(["extract", "--compact"])
        .arg(&path)
        .output()
        .expect("Failed to run ocr-worker");

    assert!(output.status.success());
    let envelope: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(envelope["pages"].as_u64().unwrap() >= 1);
    assert!(envelope["tables"].as_array().unwrap().is_empty());
    assert_eq!(envelope["text_blocks"][0]["extraction_method"], "error");
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.pdf");
    std::fs::write(&path, b"").unwrap();

    let output = ocr_worker()
        .current_dir(dir.path())
        .arg("extract")
        .arg(&path)
        .output()
        .expect("Failed to run ocr-worker");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Empty PDF payload"));
}
