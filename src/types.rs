//! Shared types persisted between pipeline stages.
//!
//! Both records are written as JSON with camelCase keys, the shape the
//! browsing UI and the feed generator read.

use crate::metadata::CameraMetadata;
use serde::{Deserialize, Serialize};

/// Tag assigned to images that have never been tagged.
pub const DEFAULT_TAG: &str = "Unsorted";

/// One entry of `images.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    /// Site-root-relative path of the source image. Unique within a manifest.
    pub full_image_path: String,
    /// Site-root-relative path of the generated preview.
    pub preview_path: String,
    /// Filename without extension.
    pub title: String,
    #[serde(flatten)]
    pub metadata: CameraMetadata,
    /// User-assigned labels, carried across rebuilds.
    pub tags: Vec<String>,
}

/// One entry of `posts.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    /// Rendered HTML body.
    pub content: String,
    pub excerpt: String,
    /// Minutes, rounded up.
    pub reading_time: usize,
}
