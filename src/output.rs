//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity (image, post) is shown by its identity first: a positional
//! index and its title. Paths, camera settings and tags follow as indented
//! context lines, so the output reads as a content inventory that can still
//! be traced back to files.
//!
//! # Output Format
//!
//! ## Images
//!
//! ```text
//! Images
//! 001 sunset
//!     Source: images/sunset.jpg
//!     Preview: images/previews/preview_sunset.jpg
//!     Camera: Leica Q2, f/1.7, 1/250, 2021-01-02T03:04:05
//!     Tags: Unsorted
//! 002 harbor
//!     Source: images/harbor.png
//!     Preview: images/previews/preview_harbor.png
//!     Tags: Travel, Sea
//! Indexed 2 images (1 without camera metadata)
//! ```
//!
//! ## Blog
//!
//! ```text
//! Posts
//! 001 Hello World → hello-world.html
//!     Date: 2024-03-01
//!     Tags: intro, meta
//!     Reading time: 2 min
//! Rendered 1 post
//! ```
//!
//! ## Feeds
//!
//! ```text
//! Feeds
//!     rss.xml: 3 items
//!     atom.xml: 3 entries
//!     sitemap.xml: 7 pages
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::feeds::Feeds;
use crate::metadata::{CameraMetadata, UNKNOWN};
use crate::types::{BlogPost, ImageRecord};

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Format an entity header: positional index + title, with optional target.
///
/// ```text
/// 001 sunset
/// 001 Hello World → hello-world.html
/// ```
fn entity_header(index: usize, title: &str, target: Option<&str>) -> String {
    match target {
        Some(t) => format!("{} {} \u{2192} {}", format_index(index), title, t),
        None => format!("{} {}", format_index(index), title),
    }
}

/// `count` followed by the matching noun form.
fn plural(count: usize, singular: &str, many: &str) -> String {
    let noun = if count == 1 { singular } else { many };
    format!("{} {}", count, noun)
}

/// Known camera fields joined by `, `, or `None` when nothing is known.
fn camera_summary(metadata: &CameraMetadata) -> Option<String> {
    let known: Vec<&str> = [
        &metadata.device_model,
        &metadata.f_number,
        &metadata.exposure_time,
        &metadata.date_taken,
    ]
    .into_iter()
    .map(String::as_str)
    .filter(|v| *v != UNKNOWN)
    .collect();
    (!known.is_empty()).then(|| known.join(", "))
}

// ============================================================================
// Stage 1: Images output
// ============================================================================

/// Format the manifest stage output, one block per indexed image.
pub fn format_manifest_output(records: &[ImageRecord]) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    let mut without_metadata = 0;

    for (i, record) in records.iter().enumerate() {
        lines.push(entity_header(i + 1, &record.title, None));
        lines.push(format!("{}Source: {}", indent(1), record.full_image_path));
        lines.push(format!("{}Preview: {}", indent(1), record.preview_path));
        match camera_summary(&record.metadata) {
            Some(summary) => lines.push(format!("{}Camera: {}", indent(1), summary)),
            None => without_metadata += 1,
        }
        if !record.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), record.tags.join(", ")));
        }
    }

    let mut summary = format!("Indexed {}", plural(records.len(), "image", "images"));
    if without_metadata > 0 {
        summary.push_str(&format!(" ({} without camera metadata)", without_metadata));
    }
    lines.push(summary);
    lines
}

/// Print manifest output to stdout.
pub fn print_manifest_output(records: &[ImageRecord]) {
    for line in format_manifest_output(records) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Blog output
// ============================================================================

/// Format blog stage output in publication order.
pub fn format_blog_output(posts: &[BlogPost]) -> Vec<String> {
    let mut lines = vec!["Posts".to_string()];

    for (i, post) in posts.iter().enumerate() {
        let page = format!("{}.html", post.slug);
        lines.push(entity_header(i + 1, &post.title, Some(&page)));
        lines.push(format!("{}Date: {}", indent(1), post.date));
        if !post.tags.is_empty() {
            lines.push(format!("{}Tags: {}", indent(1), post.tags.join(", ")));
        }
        lines.push(format!("{}Reading time: {} min", indent(1), post.reading_time));
    }

    lines.push(format!("Rendered {}", plural(posts.len(), "post", "posts")));
    lines
}

/// Print blog output to stdout.
pub fn print_blog_output(posts: &[BlogPost]) {
    for line in format_blog_output(posts) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 3: Feeds output
// ============================================================================

/// Format feed stage output: one line per written document.
pub fn format_feeds_output(post_count: usize, feeds: &Feeds) -> Vec<String> {
    vec![
        "Feeds".to_string(),
        format!("{}{}: {}", indent(1), Feeds::RSS_FILE, plural(post_count, "item", "items")),
        format!("{}{}: {}", indent(1), Feeds::ATOM_FILE, plural(post_count, "entry", "entries")),
        format!("{}{}: {}", indent(1), Feeds::SITEMAP_FILE, plural(feeds.page_count, "page", "pages")),
    ]
}

/// Print feeds output to stdout.
pub fn print_feeds_output(post_count: usize, feeds: &Feeds) {
    for line in format_feeds_output(post_count, feeds) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, metadata: CameraMetadata, tags: &[&str]) -> ImageRecord {
        ImageRecord {
            full_image_path: format!("images/{title}.jpg"),
            preview_path: format!("images/previews/preview_{title}.jpg"),
            title: title.to_string(),
            metadata,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn post(slug: &str, title: &str, tags: &[&str], reading_time: usize) -> BlogPost {
        BlogPost {
            slug: slug.to_string(),
            title: title.to_string(),
            date: "2024-03-01".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            content: String::new(),
            excerpt: String::new(),
            reading_time,
        }
    }

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_pads_to_three() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(100), "100");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(1), "    ");
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn entity_header_with_target() {
        assert_eq!(
            entity_header(2, "Hello", Some("hello.html")),
            "002 Hello \u{2192} hello.html"
        );
    }

    #[test]
    fn entity_header_without_target() {
        assert_eq!(entity_header(1, "sunset", None), "001 sunset");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "image", "images"), "1 image");
        assert_eq!(plural(0, "image", "images"), "0 images");
        assert_eq!(plural(3, "entry", "entries"), "3 entries");
    }

    #[test]
    fn camera_summary_skips_unknown_fields() {
        let metadata = CameraMetadata {
            device_model: "Leica Q2".to_string(),
            date_taken: "2021-01-02T03:04:05".to_string(),
            ..CameraMetadata::unknown()
        };
        assert_eq!(
            camera_summary(&metadata).as_deref(),
            Some("Leica Q2, 2021-01-02T03:04:05")
        );
        assert_eq!(camera_summary(&CameraMetadata::unknown()), None);
    }

    // =========================================================================
    // Stage output tests
    // =========================================================================

    #[test]
    fn manifest_output_lists_each_image() {
        let known = CameraMetadata {
            device_model: "Leica Q2".to_string(),
            f_number: "f/1.7".to_string(),
            exposure_time: "1/250".to_string(),
            date_taken: "2021-01-02T03:04:05".to_string(),
        };
        let records = vec![
            record("sunset", known, &["Unsorted"]),
            record("harbor", CameraMetadata::unknown(), &["Travel", "Sea"]),
        ];

        let lines = format_manifest_output(&records);
        assert_eq!(
            lines,
            vec![
                "Images",
                "001 sunset",
                "    Source: images/sunset.jpg",
                "    Preview: images/previews/preview_sunset.jpg",
                "    Camera: Leica Q2, f/1.7, 1/250, 2021-01-02T03:04:05",
                "    Tags: Unsorted",
                "002 harbor",
                "    Source: images/harbor.jpg",
                "    Preview: images/previews/preview_harbor.jpg",
                "    Tags: Travel, Sea",
                "Indexed 2 images (1 without camera metadata)",
            ]
        );
    }

    #[test]
    fn manifest_output_empty() {
        assert_eq!(format_manifest_output(&[]), vec!["Images", "Indexed 0 images"]);
    }

    #[test]
    fn blog_output_shows_target_page() {
        let posts = vec![
            post("hello-world", "Hello World", &["intro"], 2),
            post("bare", "Bare", &[], 0),
        ];
        let lines = format_blog_output(&posts);
        assert_eq!(
            lines,
            vec![
                "Posts",
                "001 Hello World \u{2192} hello-world.html",
                "    Date: 2024-03-01",
                "    Tags: intro",
                "    Reading time: 2 min",
                "002 Bare \u{2192} bare.html",
                "    Date: 2024-03-01",
                "    Reading time: 0 min",
                "Rendered 2 posts",
            ]
        );
    }

    #[test]
    fn feeds_output_counts() {
        let feeds = Feeds {
            rss: String::new(),
            atom: String::new(),
            sitemap: String::new(),
            page_count: 7,
        };
        assert_eq!(
            format_feeds_output(1, &feeds),
            vec![
                "Feeds",
                "    rss.xml: 1 item",
                "    atom.xml: 1 entry",
                "    sitemap.xml: 7 pages",
            ]
        );
        assert_eq!(format_feeds_output(3, &feeds)[2], "    atom.xml: 3 entries");
    }
}
