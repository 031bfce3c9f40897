//! Image processing: preview generation and EXIF reading.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **EXIF** | `kamadak-exif` container reader |
//! | **Preview** | Lanczos3 resize → JPEG or PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ExifTags, ImageBackend};
pub use calculations::preview_dimensions;
pub use operations::{GeneratedPreview, PreviewConfig, create_preview, get_dimensions};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
