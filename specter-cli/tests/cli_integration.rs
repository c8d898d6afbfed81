//! CLI integration tests for specter.
//!
//! These tests run the actual binary against images in a temporary directory
//! and check outputs, exit codes, and file artifacts. The recompression tools
//! are skipped so the tests do not depend on pngquant or jpegoptim.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use image::codecs::gif::GifEncoder;
use image::{Delay, DynamicImage, Frame, Rgba, RgbaImage};
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the specter binary.
fn specter() -> Command {
    Command::cargo_bin("specter").unwrap()
}

fn write_png(path: &Path, seed: u32) {
    let img = RgbaImage::from_fn(40, 32, |x, y| {
        let v = ((x * 7 + y * 13 + seed * 29) % 251) as u8;
        Rgba([v, 255 - v, (x * 6) as u8, 255])
    });
    DynamicImage::ImageRgba8(img).save(path).unwrap();
}

fn write_animated_gif(path: &Path) {
    let file = fs::File::create(path).unwrap();
    let mut encoder = GifEncoder::new(file);
    for shade in [0u8, 128, 255] {
        let frame = RgbaImage::from_pixel(6, 6, Rgba([shade, shade, 0, 255]));
        encoder
            .encode_frame(Frame::from_parts(frame, 0, 0, Delay::from_numer_denom_ms(40, 1)))
            .unwrap();
    }
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    specter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Frequency-domain image obfuscation"))
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--parallel"))
        .stdout(predicate::str::contains("--in-process"));
}

#[test]
fn test_version_displays_version() {
    specter()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("specter"));
}

#[test]
fn test_help_shows_exit_codes() {
    specter()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("66"));
}

#[test]
fn test_source_is_required() {
    specter()
        .assert()
        .failure()
        .stderr(predicate::str::contains("--source"));
}

// ============================================================================
// Error Exit Codes
// ============================================================================

#[test]
fn test_missing_source_exits_66() {
    let temp = TempDir::new().unwrap();
    specter()
        .args(["--skip-recompress", "--source"])
        .arg(temp.path().join("nope.png"))
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Failed to access source"));
}

#[test]
fn test_unsupported_extension_exits_65_and_leaves_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("picture.bmp");
    fs::write(&path, b"BM not really").unwrap();

    specter()
        .args(["--skip-recompress", "--source"])
        .arg(&path)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("bmp"));

    assert_eq!(fs::read(&path).unwrap(), b"BM not really");
}

#[test]
fn test_animated_gif_exits_65_and_leaves_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("anim.gif");
    write_animated_gif(&path);
    let before = fs::read(&path).unwrap();

    specter()
        .args(["--skip-recompress", "--source"])
        .arg(&path)
        .assert()
        .code(65)
        .stderr(predicate::str::contains("Animated"));

    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_output_with_directory_is_usage_error() {
    let temp = TempDir::new().unwrap();
    specter()
        .args(["--skip-recompress", "--source"])
        .arg(temp.path())
        .arg("--output")
        .arg(temp.path().join("out.png"))
        .assert()
        .code(64);
}

#[test]
fn test_zero_parallelism_is_usage_error() {
    let temp = TempDir::new().unwrap();
    specter()
        .args(["--skip-recompress", "--parallel", "0", "--source"])
        .arg(temp.path())
        .assert()
        .code(64);
}

// ============================================================================
// File Mode
// ============================================================================

#[test]
fn test_file_in_place() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("photo.png");
    write_png(&path, 1);
    let before = fs::read(&path).unwrap();

    specter()
        .args(["--skip-recompress", "--source"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Image obfuscated"));

    let after = fs::read(&path).unwrap();
    assert_ne!(before, after);
    let decoded = image::open(&path).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (40, 32));
}

#[test]
fn test_file_to_separate_output() {
    let temp = TempDir::new().unwrap();
    let input = temp.path().join("in.png");
    let output = temp.path().join("out.png");
    write_png(&input, 2);
    let before = fs::read(&input).unwrap();

    specter()
        .args(["--skip-recompress", "--quiet", "--source"])
        .arg(&input)
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(fs::read(&input).unwrap(), before);
    assert!(output.exists());
}

#[test]
fn test_file_json_report() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("photo.png");
    write_png(&path, 3);

    let assert = specter()
        .args(["--skip-recompress", "--json", "--source"])
        .arg(&path)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["outcome"]["format"], "png");
    assert_eq!(report["outcome"]["width"], 40);
    assert_eq!(
        report["outcome"]["perturbation"]["samples_per_channel"],
        (20 * 16) / 4
    );
}

#[test]
fn test_seed_makes_output_reproducible() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a.png");
    let b = temp.path().join("b.png");
    write_png(&a, 4);
    write_png(&b, 4);

    for path in [&a, &b] {
        specter()
            .args(["--skip-recompress", "--quiet", "--seed", "7", "--source"])
            .arg(path)
            .assert()
            .success();
    }

    assert_eq!(fs::read(&a).unwrap(), fs::read(&b).unwrap());
}

// ============================================================================
// Directory Mode
// ============================================================================

fn populate(root: &Path) -> Vec<std::path::PathBuf> {
    let nested = root.join("nested");
    fs::create_dir_all(&nested).unwrap();
    let images = vec![root.join("a.png"), root.join("b.png"), nested.join("c.png")];
    for (i, path) in images.iter().enumerate() {
        write_png(path, 10 + i as u32);
    }
    fs::write(root.join("notes.txt"), b"keep").unwrap();
    images
}

#[test]
fn test_directory_in_process() {
    let temp = TempDir::new().unwrap();
    let images = populate(temp.path());
    let before: Vec<_> = images.iter().map(|p| fs::read(p).unwrap()).collect();

    specter()
        .args(["--skip-recompress", "--in-process", "-t", "2", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("3 of 3 images obfuscated"));

    for (path, before) in images.iter().zip(&before) {
        assert_ne!(&fs::read(path).unwrap(), before, "{}", path.display());
    }
    assert_eq!(fs::read(temp.path().join("notes.txt")).unwrap(), b"keep");
}

#[test]
fn test_directory_with_child_processes() {
    let temp = TempDir::new().unwrap();
    let images = populate(temp.path());
    let before: Vec<_> = images.iter().map(|p| fs::read(p).unwrap()).collect();

    specter()
        .args(["--skip-recompress", "--json", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"succeeded\": 3"));

    for (path, before) in images.iter().zip(&before) {
        assert_ne!(&fs::read(path).unwrap(), before, "{}", path.display());
    }
}

#[test]
fn test_directory_failure_exits_1_after_all_jobs() {
    let temp = TempDir::new().unwrap();
    let images = populate(temp.path());
    let before: Vec<_> = images.iter().map(|p| fs::read(p).unwrap()).collect();
    let broken = temp.path().join("broken.png");
    fs::write(&broken, b"not a png").unwrap();

    specter()
        .args(["--skip-recompress", "--source"])
        .arg(temp.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains("3 of 4 images obfuscated"))
        .stdout(predicate::str::contains("broken.png"))
        .stderr(predicate::str::contains("1 of 4 images failed"));

    for (path, before) in images.iter().zip(&before) {
        assert_ne!(&fs::read(path).unwrap(), before, "{}", path.display());
    }
}

#[test]
fn test_empty_directory_succeeds() {
    let temp = TempDir::new().unwrap();
    specter()
        .args(["--skip-recompress", "--source"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("0 of 0 images obfuscated"));
}
