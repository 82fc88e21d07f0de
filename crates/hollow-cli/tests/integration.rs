//! Integration tests for hollow CLI commands.
//!
//! These tests run the actual binary and verify end-to-end behavior.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const BOARD: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100mm" height="100mm" viewBox="0 0 100 100">
  <style>.pad { fill: #b87333; }</style>
  <rect x="0" y="0" width="20" height="100"/>
  <rect class="pad" x="40" y="40" width="10" height="10"/>
  <rect x="60" y="60" width="20" height="0.2"/>
  <path d="M 0,90 L 10,90 L 10,90.4064 L 0,90.4064 Z"/>
</svg>"#;

fn hollow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hollow"))
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn board(dir: &Path) -> PathBuf {
    let path = dir.join("board.svg");
    fs::write(&path, BOARD).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn invert_writes_masked_svg_to_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());

    let output = hollow(&["invert", arg(&input)]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<?xml"), "Should have XML declaration");
    assert!(stdout.contains(r#"<mask id="inverted-mask""#), "Should define the shape mask");
    assert!(stdout.contains("url(#inverted-mask)"), "Should reference the shape mask");
    assert!(stdout.contains(r#"viewBox="0 0 100 100""#), "Should keep the viewBox");
    assert!(stdout.contains(r#"width="100mm""#), "Should keep the display width");
    assert!(stdout.contains(".pad"), "Should pass styles through");
}

#[test]
fn evenodd_inversion_has_no_masks() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());

    let output = hollow(&["invert", arg(&input), "--mode", "evenodd"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(r#"fill-rule="evenodd""#));
    assert!(!stdout.contains("<mask"));
}

#[test]
fn run_writes_three_documents() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());
    let out_dir = dir.path().join("out");

    let output = hollow(&["run", arg(&input), "--out-dir", arg(&out_dir)]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    for name in ["inverted.svg", "enclosed.svg", "subtracted.svg"] {
        let content = fs::read_to_string(out_dir.join(name)).unwrap();
        assert!(content.contains("<svg"), "{} should be an SVG", name);
    }
    let enclosed = fs::read_to_string(out_dir.join("enclosed.svg")).unwrap();
    assert!(enclosed.contains("boundary-interior-mask"));
}

#[test]
fn subtract_reports_missing_masks() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());

    let output = hollow(&["subtract", arg(&input), arg(&input)]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mask `inverted-mask` not found"));
    assert!(stderr.contains("mask `boundary-interior-mask` not found"));
}

#[test]
fn cut_removes_connectors() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());
    let cut = dir.path().join("cut.svg");

    let output = hollow(&["cut", arg(&input), "-o", arg(&cut)]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Removed 1 connectors"), "{}", stderr);

    let content = fs::read_to_string(&cut).unwrap();
    assert!(!content.contains("90.4064"));
    assert!(content.contains(r#"class="pad""#), "Should keep attributes");
}

#[test]
fn analyze_json_has_totals() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());

    let output = hollow(&["analyze", arg(&input), "--json"]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totals"]["shapes"], 4);
    assert_eq!(json["totals"]["connectors"], 1);
    assert_eq!(json["histogram"].as_array().map(|a| a.len()), Some(10));
}

#[test]
fn raster_writes_png_of_requested_size() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());
    let png = dir.path().join("board.png");

    let output = hollow(&["raster", arg(&input), "-o", arg(&png), "--width", "50", "--height", "50"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let img = image::open(&png).unwrap().to_luma8();
    assert_eq!(img.dimensions(), (50, 50));
    // Inverted export: shapes are black.
    assert_eq!(img.get_pixel(2, 25).0[0], 0);
    assert_eq!(img.get_pixel(45, 5).0[0], 255);
}

#[test]
fn verify_reports_agreement() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());

    let output = hollow(&["verify", arg(&input), "--width", "100", "--height", "100"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["result"]["width"], 100);
    assert!(json["result"]["agreement_percent"].as_f64().unwrap() > 95.0);
}

#[test]
fn config_file_and_flags() {
    let dir = tempfile::tempdir().unwrap();
    let input = board(dir.path());
    let config = dir.path().join("hollow.yaml");
    fs::write(&config, "policy:\n  min_dimension: 0.1\nfill: \"#ff0000\"\n").unwrap();

    let output = hollow(&["--config", arg(&config), "invert", arg(&input)]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("#ff0000"));

    let output = hollow(&["analyze", arg(&input), "--json", "--min-dimension", "0.1"]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["totals"]["thin"], 0);
}

#[test]
fn broken_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.svg");
    fs::write(&path, "<svg><rect></svg>").unwrap();

    let output = hollow(&["invert", arg(&path)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error"));
}

#[test]
fn help_command_shows_usage() {
    let output = hollow(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("invert"), "Should mention invert command");
    assert!(stdout.contains("extract"), "Should mention extract command");
    assert!(stdout.contains("verify"), "Should mention verify command");
}
