//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the pipeline needs
//! from an imaging library: identify, read EXIF, and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), built on the `image` and
//! `kamadak-exif` crates. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("EXIF read failed: {0}")]
    Exif(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Raw EXIF tags as read from the file, before normalization.
///
/// Values are already decoded out of the EXIF library's own types so nothing
/// downstream depends on it. Normalization into display strings happens in
/// [`crate::metadata::CameraMetadata::from_tags`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExifTags {
    /// `Model` (0x0110).
    pub model: Option<String>,
    /// `FNumber` (0x829D) as a decimal.
    pub f_number: Option<f64>,
    /// `ExposureTime` (0x829A) as (numerator, denominator) seconds.
    pub exposure_time: Option<(u32, u32)>,
    /// `DateTimeOriginal` (0x9003), raw `YYYY:MM:DD HH:MM:SS`.
    pub date_time_original: Option<String>,
}

/// Trait for image processing backends.
///
/// `Sync` because the manifest builder calls it from rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Read the EXIF tags the manifest cares about.
    ///
    /// Errors when the file has no readable EXIF container. Callers treat
    /// that as "all tags unknown".
    fn read_exif(&self, path: &Path) -> Result<ExifTags, BackendError>;

    /// Execute a resize operation.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
