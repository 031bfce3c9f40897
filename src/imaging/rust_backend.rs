//! Pure Rust imaging backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image::ImageReader` |
//! | Identify | `image::image_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode JPEG | `image::codecs::jpeg::JpegEncoder` at the configured quality |
//! | Encode PNG | `image::ImageFormat::Png` (lossless) |
//! | EXIF | `kamadak-exif` container reader |

use super::backend::{BackendError, Dimensions, ExifTags, ImageBackend};
use super::params::ResizeParams;
use exif::{In, Tag, Value};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Backend using the `image` crate for pixels and `kamadak-exif` for tags.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" => save_jpeg(img, path, quality),
        "png" => img
            .save_with_format(path, ImageFormat::Png)
            .map_err(|e| BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))),
        other => Err(BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            other
        ))),
    }
}

/// JPEG has no alpha channel, so everything is flattened to RGB8 first.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let file = File::create(path)?;
    let writer = std::io::BufWriter::new(file);
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(writer, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => {
            let joined = parts
                .iter()
                .map(|p| String::from_utf8_lossy(p).trim_end_matches('\0').to_string())
                .collect::<Vec<_>>()
                .join(" ");
            Some(joined)
        }
        _ => None,
    }
}

fn primary_value(exif: &exif::Exif, tag: Tag) -> Option<&Value> {
    exif.get_field(tag, In::PRIMARY).map(|f| &f.value)
}

fn first_rational(value: &Value) -> Option<(u32, u32)> {
    match value {
        Value::Rational(v) => v.first().map(|r| (r.num, r.denom)),
        _ => None,
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "Failed to read dimensions of {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Dimensions { width, height })
    }

    fn read_exif(&self, path: &Path) -> Result<ExifTags, BackendError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let exif = exif::Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| BackendError::Exif(format!("{}: {}", path.display(), e)))?;

        let field = |tag| primary_value(&exif, tag);

        Ok(ExifTags {
            model: field(Tag::Model).and_then(ascii_value),
            f_number: field(Tag::FNumber)
                .and_then(first_rational)
                .filter(|&(_, d)| d != 0)
                .map(|(n, d)| n as f64 / d as f64),
            exposure_time: field(Tag::ExposureTime).and_then(first_rational),
            date_time_original: field(Tag::DateTimeOriginal).and_then(ascii_value),
        })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, params.height, FilterType::Lanczos3);
        save_image(&resized, &params.output, params.quality.value())
    }
}
