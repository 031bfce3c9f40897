//! Camera metadata normalization.
//!
//! Every image in the manifest carries four camera fields: device model,
//! f-number, exposure time and capture date. They come from EXIF through
//! [`ImageBackend::read_exif`](crate::imaging::ImageBackend::read_exif), which
//! hands back raw optional values. This module turns them into the one fixed
//! shape the rest of the pipeline sees, [`CameraMetadata`].
//!
//! ## Sentinels
//!
//! Each field resolves independently. A missing, empty or malformed value
//! becomes [`UNKNOWN`]; an unreadable file becomes
//! [`CameraMetadata::unknown()`]. Downstream code never has to ask whether a
//! field exists.
//!
//! ## Display formats
//!
//! ```text
//! model:          "Canon EOS R5"          (trimmed)
//! f-number:       2.8  → "f/2.8", 8.0 → "f/8"
//! exposure time:  1/250 → "1/250", 10/2500 → "1/250", 2/1 → "2s", 3/10 → "1/3"
//! date taken:     "2024:06:01 18:30:00" → "2024-06-01T18:30:00"
//! ```

use crate::imaging::ExifTags;
use serde::{Deserialize, Serialize};

/// Sentinel for any metadata field that could not be determined.
pub const UNKNOWN: &str = "Unknown";

/// Normalized camera metadata for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraMetadata {
    pub device_model: String,
    pub f_number: String,
    pub exposure_time: String,
    pub date_taken: String,
}

impl CameraMetadata {
    /// All four fields set to the sentinel.
    pub fn unknown() -> Self {
        Self {
            device_model: UNKNOWN.to_string(),
            f_number: UNKNOWN.to_string(),
            exposure_time: UNKNOWN.to_string(),
            date_taken: UNKNOWN.to_string(),
        }
    }

    /// Normalize raw EXIF tags, falling back to the sentinel per field.
    pub fn from_tags(tags: &ExifTags) -> Self {
        Self {
            device_model: or_unknown(tags.model.as_deref().map(str::trim).map(String::from)),
            f_number: or_unknown(tags.f_number.and_then(format_f_number)),
            exposure_time: or_unknown(tags.exposure_time.and_then(format_exposure_time)),
            date_taken: or_unknown(tags.date_time_original.as_deref().and_then(format_exif_date)),
        }
    }
}

impl Default for CameraMetadata {
    fn default() -> Self {
        Self::unknown()
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Format an aperture as `f/<n>` with at most one decimal.
pub fn format_f_number(value: f64) -> Option<String> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        Some(format!("f/{}", rounded as u32))
    } else {
        Some(format!("f/{:.1}", rounded))
    }
}

/// Format an exposure time given as a rational number of seconds.
///
/// Sub-second exposures read as `1/<n>` (the usual camera notation),
/// longer ones as whole or decimal seconds.
pub fn format_exposure_time((num, denom): (u32, u32)) -> Option<String> {
    if num == 0 || denom == 0 {
        return None;
    }
    if num < denom {
        let reciprocal = (denom as f64 / num as f64).round() as u64;
        return Some(format!("1/{}", reciprocal));
    }
    let seconds = num as f64 / denom as f64;
    if seconds.fract() == 0.0 {
        Some(format!("{}s", seconds as u64))
    } else {
        Some(format!("{:.1}s", seconds))
    }
}

/// Convert an EXIF `YYYY:MM:DD HH:MM:SS` timestamp into ISO 8601 local time.
///
/// Returns `None` for blank timestamps (cameras write `"    :  :     :  :  "`
/// when the clock was never set) and anything that does not parse.
pub fn format_exif_date(raw: &str) -> Option<String> {
    let dt = exif::DateTime::from_ascii(raw.trim().as_bytes()).ok()?;
    if dt.year == 0 {
        return None;
    }
    Some(format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
        dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
    ))
}
