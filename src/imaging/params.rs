//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They sit between
//! [`operations`](super::operations), which decides what previews to create,
//! and the [`backend`](super::backend), which does the pixel work. Tests swap
//! in a mock backend without touching the planning logic.

use std::path::PathBuf;

/// Quality setting for lossy encoding (1-100). Ignored by lossless formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Parameters for a single resize: read `source`, write `output` at exactly
/// `width`x`height`. The output format follows the output file extension.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
