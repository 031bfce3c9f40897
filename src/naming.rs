//! Centralized filename conventions.
//!
//! Every derived name in the pipeline comes from a source filename, which is
//! the only true identity of an image or post:
//!
//! - `sunset.JPG` → title `"sunset"`, preview `preview_sunset.JPG`
//! - `hello-world.md` → slug `"hello-world"`
//! - `images/sunset.jpg` (on any platform) → URL path `images/sunset.jpg`

use std::path::{Component, Path};

/// Extensions accepted as source images, compared case-insensitively.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Prefix prepended to a source filename to name its preview.
pub const PREVIEW_PREFIX: &str = "preview_";

/// Whether `path` has a recognized image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Whether `path` is a markdown post.
pub fn is_markdown_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("md")
}

/// Filename without its final extension.
///
/// - `"sunset.jpg"` → `"sunset"`
/// - `"archive.tar.png"` → `"archive.tar"`
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Preview filename for a source filename.
pub fn preview_filename(file_name: &str) -> String {
    format!("{PREVIEW_PREFIX}{file_name}")
}

/// Render a relative path with `/` separators for use in JSON and URLs.
pub fn to_url_path(path: &Path) -> String {
    path.components()
        .map(|c| match c {
            Component::RootDir => String::new(),
            other => other.as_os_str().to_string_lossy().to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Derive a slug from a title: lowercase, each whitespace run becomes `-`.
///
/// Runs at either end are kept, so links built from older feeds stay stable.
///
/// - `"Hello World"` → `"hello-world"`
/// - `" A   B "` → `"-a-b-"`
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_run = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_run {
                slug.push('-');
            }
            in_run = true;
        } else {
            slug.extend(c.to_lowercase());
            in_run = false;
        }
    }
    slug
}

/// Percent-encode a path segment the way browsers' `encodeURIComponent` does.
///
/// Unreserved: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`. Everything else is encoded
/// as UTF-8 bytes.
pub fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
