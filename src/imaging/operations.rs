//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take configuration, compute parameters, and call the backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::preview_dimensions;
use super::params::{Quality, ResizeParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for preview generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConfig {
    pub width: u32,
    pub quality: Quality,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 300,
            quality: Quality::default(),
        }
    }
}

/// A generated preview and its final size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPreview {
    pub width: u32,
    pub height: u32,
}

/// Plan a preview resize without executing it.
pub fn plan_preview(
    source: &Path,
    output: &Path,
    original: (u32, u32),
    config: &PreviewConfig,
) -> ResizeParams {
    let (width, height) = preview_dimensions(original, config.width);
    ResizeParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: config.quality,
    }
}

/// Create a preview of `source` at `output`.
///
/// Reads the original size, scales to the configured width keeping the
/// aspect ratio, and writes in the format implied by `output`'s extension.
pub fn create_preview(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    config: &PreviewConfig,
) -> Result<GeneratedPreview> {
    let original = get_dimensions(backend, source)?;
    let params = plan_preview(source, output, original, config);
    backend.resize(&params)?;
    Ok(GeneratedPreview {
        width: params.width,
        height: params.height,
    })
}
