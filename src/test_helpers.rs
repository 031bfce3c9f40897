//! Shared test utilities for the folio test suite.
//!
//! Writes synthetic images and markdown posts into temp directories so tests
//! exercise real files without checked-in fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let site = setup_site();
//! write_test_jpeg(&site.path().join("images/dawn.jpg"), 640, 480);
//! write_post(&site.path().join("blog/posts"), "hello.md", "# Hi");
//! ```

use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Empty site root with the default `images/` and `blog/posts/` directories.
pub fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("images")).unwrap();
    fs::create_dir_all(tmp.path().join("blog/posts")).unwrap();
    tmp
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    })
}

fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
}

/// Write a gradient JPEG of the given size.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let file = fs::File::create(path).unwrap();
    let encoder = JpegEncoder::new_with_quality(std::io::BufWriter::new(file), 90);
    gradient(width, height).write_with_encoder(encoder).unwrap();
}

/// Write a gradient PNG of the given size.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

/// Write a markdown post into `dir`, creating it if needed.
pub fn write_post(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// Front matter + body for a post.
pub fn post_source(title: &str, date: &str, tags: &str, body: &str) -> String {
    format!("---\ntitle: \"{title}\"\ndate: \"{date}\"\ntags: {tags}\n---\n{body}\n")
}

/// Create empty placeholder files (content is irrelevant to `MockBackend`).
pub fn touch_files(dir: &Path, names: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    for name in names {
        fs::write(dir.join(name), b"").unwrap();
    }
}

/// Read and parse a JSON file.
pub fn read_json(path: &Path) -> serde_json::Value {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&content).unwrap()
}
