//! Site configuration.
//!
//! Loads, merges and validates `config.toml`. Stock defaults are
//! the base layer; a `config.toml` in the site root overrides any subset of
//! them. The `SITE_URL` environment variable, when set, wins over
//! `site.base_url`.
//!
//! ## Where the file lives
//!
//! ```text
//! public/
//! ├── config.toml          # optional, overrides stock defaults
//! ├── images/
//! │   ├── previews/
//! │   └── sunset.jpg
//! └── blog/
//!     ├── posts/
//!     └── generated/
//! ```
//!
//! ## Keys and defaults
//!
//! ```toml
//! # every key may be omitted; these are the defaults
//!
//! [site]
//! base_url = "https://example.com"
//! title = "Portfolio"
//! description = "Photography and writing"
//! author = "Site Author"
//! email = "author@example.com"
//!
//! [images]
//! source_dir = "images"            # relative to the site root
//! preview_dir = "images/previews"
//! manifest = "images.json"
//! preview_width = 300              # pixels, every preview this wide
//! quality = 85                     # JPEG preview quality (1-100)
//!
//! [blog]
//! posts_dir = "blog/posts"
//! output_dir = "blog/generated"
//! excerpt_length = 200             # characters before "..."
//! words_per_minute = 200           # reading-time speed
//!
//! [processing]
//! max_processes = 4                # omit for auto = CPU cores
//!
//! [server]
//! port = 3000
//! ```
//!
//! A key that is not listed here is an error.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable that overrides `site.base_url`.
pub const SITE_URL_ENV: &str = "SITE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Identity of the site, used in feeds and page headers.
    pub site: SiteMeta,
    /// Source images, previews and the manifest.
    pub images: ImagesConfig,
    /// Markdown posts and their rendered output.
    pub blog: BlogConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
    /// Image listing server.
    pub server: ServerConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "site.base_url must not be empty".into(),
            ));
        }
        if self.images.preview_width == 0 {
            return Err(ConfigError::Validation(
                "images.preview_width must be greater than 0".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.blog.excerpt_length == 0 {
            return Err(ConfigError::Validation(
                "blog.excerpt_length must be greater than 0".into(),
            ));
        }
        if self.blog.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "blog.words_per_minute must be greater than 0".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Replace `site.base_url` when `site_url` is set and non-blank.
    pub fn override_base_url(mut self, site_url: Option<String>) -> Self {
        if let Some(url) = site_url.filter(|u| !u.trim().is_empty()) {
            self.site.base_url = normalize_base_url(&url);
        }
        self
    }

    /// Apply the `SITE_URL` environment override.
    pub fn with_env_overrides(self) -> Self {
        self.override_base_url(std::env::var(SITE_URL_ENV).ok())
    }
}

/// Site identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteMeta {
    /// Absolute site URL without a trailing slash.
    pub base_url: String,
    /// Feed and blog index title.
    pub title: String,
    /// Feed description.
    pub description: String,
    /// Atom author name.
    pub author: String,
    /// Atom author email.
    pub email: String,
}

impl Default for SiteMeta {
    fn default() -> Self {
        Self {
            base_url: "https://example.com".to_string(),
            title: "Portfolio".to_string(),
            description: "Photography and writing".to_string(),
            author: "Site Author".to_string(),
            email: "author@example.com".to_string(),
        }
    }
}

/// Image manifest settings. Paths are relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Directory holding the source photographs.
    pub source_dir: String,
    /// Directory previews are written to.
    pub preview_dir: String,
    /// Manifest file path.
    pub manifest: String,
    /// Preview width in pixels.
    pub preview_width: u32,
    /// JPEG preview quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            source_dir: "images".to_string(),
            preview_dir: "images/previews".to_string(),
            manifest: "images.json".to_string(),
            preview_width: 300,
            quality: 85,
        }
    }
}

/// Blog rendering settings. Paths are relative to the site root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlogConfig {
    /// Directory of markdown posts.
    pub posts_dir: String,
    /// Directory for rendered pages and `posts.json`.
    pub output_dir: String,
    /// Excerpt length in characters, before the ellipsis.
    pub excerpt_length: usize,
    /// Reading speed used for `readingTime`.
    pub words_per_minute: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            posts_dir: "blog/posts".to_string(),
            output_dir: "blog/generated".to_string(),
            excerpt_length: 200,
            words_per_minute: 200,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Upper bound on preview workers. `None` means one per core; larger
    /// values are capped at the core count.
    pub max_processes: Option<usize>,
}

/// Worker count for the rayon pool: `min(max_processes, cores)`, or all
/// cores when unset.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Image listing server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3000 }
    }
}

/// Strip trailing slashes so URLs can be joined with `/`.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Join a root-relative config path onto the site root.
pub fn site_path(root: &Path, relative: &str) -> PathBuf {
    root.join(relative)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read `<root>/config.toml` as an untyped TOML value.
///
/// A missing file is `Ok(None)`; a file that does not parse is an error.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Layer `overlay` over `base`, deserialize, normalize `base_url` and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let mut config: SiteConfig = merged.try_into()?;
    config.site.base_url = normalize_base_url(&config.site.base_url);
    config.validate()?;
    Ok(config)
}

/// Stock defaults overlaid with `<root>/config.toml`, validated.
///
/// `SITE_URL` is not consulted here; see [`SiteConfig::with_env_overrides`].
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Documented stock `config.toml`, printed by `folio gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# Every key is optional and shows its default value.
# Put this file in the site root (public/config.toml by default).
# Misspelled or unknown keys are reported as errors.

# ---------------------------------------------------------------------------
# Site identity (feeds, page titles)
# ---------------------------------------------------------------------------
[site]
# Absolute URL of the published site. The SITE_URL environment variable
# overrides this value.
base_url = "https://example.com"
title = "Portfolio"
description = "Photography and writing"
author = "Site Author"
email = "author@example.com"

# ---------------------------------------------------------------------------
# Image manifest (paths relative to the site root)
# ---------------------------------------------------------------------------
[images]
source_dir = "images"
preview_dir = "images/previews"
manifest = "images.json"

# Preview width in pixels. Narrower images are enlarged to it.
preview_width = 300

# JPEG preview quality (1 = worst, 100 = best). PNG previews are lossless.
quality = 85

# ---------------------------------------------------------------------------
# Blog (paths relative to the site root)
# ---------------------------------------------------------------------------
[blog]
posts_dir = "blog/posts"
output_dir = "blog/generated"

# Excerpt length in characters; longer text is cut and gets "...".
excerpt_length = 200

# Reading speed for the reading-time estimate.
words_per_minute = 200

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Preview workers running at once. Leave unset to use one per CPU core.
# max_processes = 4

# ---------------------------------------------------------------------------
# Image listing server (folio serve)
# ---------------------------------------------------------------------------
[server]
port = 3000
"##
}
