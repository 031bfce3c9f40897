//! Image manifest builder.
//!
//! First stage of the build. Lists the source image directory, generates a
//! preview for every image, reads its camera metadata, merges in the tags a
//! user assigned in the previous manifest, and writes `images.json`.
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── images.json                    # Manifest (array of ImageRecord)
//! └── images/
//!     ├── sunset.jpg                 # Source
//!     └── previews/
//!         └── preview_sunset.jpg     # 300px wide preview
//! ```
//!
//! ## Tag preservation
//!
//! Tags are the only state carried from one build to the next. The previous
//! manifest is read before anything is written; records are matched on
//! `fullImagePath` and their `tags` arrays are copied verbatim. Images seen for
//! the first time get `["Unsorted"]`. A missing or unparseable previous
//! manifest simply means there is nothing to carry over.
//!
//! ## Failure policy
//!
//! - Unreadable EXIF: logged, the record gets `"Unknown"` metadata.
//! - A preview that fails to encode: logged, the record is still written so
//!   its tags survive until the source is fixed.
//! - Unreadable source directory: the build stops and the existing manifest
//!   is left untouched.
//!
//! ## Parallel Processing
//!
//! Images are processed in parallel using [rayon](https://docs.rs/rayon). Each
//! worker produces one isolated record; results are collected in sorted
//! filename order, and the manifest is written once all of them are done.

use crate::config::{SiteConfig, site_path};
use crate::imaging::{ImageBackend, PreviewConfig, Quality, create_preview};
use crate::metadata::CameraMetadata;
use crate::naming::{file_stem, is_image_file, preview_filename, to_url_path};
use crate::types::{DEFAULT_TAG, ImageRecord};
use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Cannot read image directory {path}: {source}")]
    SourceDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The full list of image records, in sorted filename order.
pub type Manifest = Vec<ImageRecord>;

/// Settings for a manifest build.
#[derive(Debug, Clone)]
pub struct ManifestOptions {
    pub preview: PreviewConfig,
    /// Directory that record paths are made relative to.
    pub site_root: PathBuf,
}

impl ManifestOptions {
    pub fn from_site_config(config: &SiteConfig, site_root: &Path) -> Self {
        Self {
            preview: PreviewConfig {
                width: config.images.preview_width,
                quality: Quality::new(config.images.quality),
            },
            site_root: site_root.to_path_buf(),
        }
    }
}

/// Source, preview and manifest locations for a site.
#[derive(Debug, Clone)]
pub struct ManifestPaths {
    pub source_dir: PathBuf,
    pub preview_dir: PathBuf,
    pub manifest: PathBuf,
}

impl ManifestPaths {
    pub fn from_site_config(config: &SiteConfig, site_root: &Path) -> Self {
        Self {
            source_dir: site_path(site_root, &config.images.source_dir),
            preview_dir: site_path(site_root, &config.images.preview_dir),
            manifest: site_path(site_root, &config.images.manifest),
        }
    }
}

/// Prior manifest entry. Only the merge key and the tags matter.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriorRecord {
    full_image_path: String,
    tags: Option<Vec<String>>,
}

/// Build the manifest and write it to `paths.manifest`.
pub fn build(
    paths: &ManifestPaths,
    options: &ManifestOptions,
    backend: &impl ImageBackend,
) -> Result<Manifest, ManifestError> {
    let previous_tags = load_previous_tags(&paths.manifest);
    let files = list_images(&paths.source_dir)?;
    info!(
        "Found {} images in {}",
        files.len(),
        paths.source_dir.display()
    );

    fs::create_dir_all(&paths.preview_dir)?;

    let records = files
        .par_iter()
        .map(|source| build_record(backend, source, &paths.preview_dir, options, &previous_tags))
        .collect::<Vec<_>>();

    write_manifest(&paths.manifest, &records)?;
    Ok(records)
}

/// Recognized image files directly inside `source_dir`, sorted by name.
///
/// Symlinks are followed; a link to an image counts as an image.
pub fn list_images(source_dir: &Path) -> Result<Vec<PathBuf>, ManifestError> {
    let entries = fs::read_dir(source_dir).map_err(|source| ManifestError::SourceDir {
        path: source_dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && is_image_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn build_record(
    backend: &impl ImageBackend,
    source: &Path,
    preview_dir: &Path,
    options: &ManifestOptions,
    previous_tags: &HashMap<String, Vec<String>>,
) -> ImageRecord {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let preview = preview_dir.join(preview_filename(&file_name));

    match create_preview(backend, source, &preview, &options.preview) {
        Ok(generated) => debug!(
            "{} -> {} ({}x{})",
            file_name,
            preview.display(),
            generated.width,
            generated.height
        ),
        Err(e) => warn!("Preview generation failed for {}: {}", file_name, e),
    }

    let metadata = match backend.read_exif(source) {
        Ok(tags) => CameraMetadata::from_tags(&tags),
        Err(e) => {
            warn!("No metadata for {}: {}", file_name, e);
            CameraMetadata::unknown()
        }
    };

    let full_image_path = site_relative(&options.site_root, source);
    let tags = previous_tags
        .get(&full_image_path)
        .cloned()
        .unwrap_or_else(|| vec![DEFAULT_TAG.to_string()]);

    ImageRecord {
        preview_path: site_relative(&options.site_root, &preview),
        title: file_stem(source),
        full_image_path,
        metadata,
        tags,
    }
}

/// Path relative to the site root with `/` separators.
///
/// Paths outside the root are kept as given.
fn site_relative(site_root: &Path, path: &Path) -> String {
    to_url_path(path.strip_prefix(site_root).unwrap_or(path))
}

/// Tags from the previous manifest, keyed by `fullImagePath`.
///
/// Never fails: a missing file, invalid JSON or a non-array document all
/// yield an empty map. Individual malformed entries are skipped.
pub fn load_previous_tags(manifest: &Path) -> HashMap<String, Vec<String>> {
    let content = match fs::read_to_string(manifest) {
        Ok(content) => content,
        Err(e) => {
            debug!("No previous manifest at {}: {}", manifest.display(), e);
            return HashMap::new();
        }
    };

    let entries: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(
                "Ignoring unreadable previous manifest {}: {}",
                manifest.display(),
                e
            );
            return HashMap::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|value| serde_json::from_value::<PriorRecord>(value).ok())
        .filter_map(|record| record.tags.map(|tags| (record.full_image_path, tags)))
        .collect()
}

/// Write the manifest through a temporary sibling file, then rename it into
/// place so readers never see a partial document.
pub fn write_manifest(path: &Path, records: &[ImageRecord]) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let json = serde_json::to_string_pretty(records)?;
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ExifTags;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::metadata::UNKNOWN;
    use crate::test_helpers::{read_json, setup_site, touch_files};

    fn paths_for(root: &Path) -> ManifestPaths {
        ManifestPaths::from_site_config(&SiteConfig::default(), root)
    }

    fn options_for(root: &Path) -> ManifestOptions {
        ManifestOptions::from_site_config(&SiteConfig::default(), root)
    }

    fn record<'a>(manifest: &'a Manifest, full: &str) -> &'a ImageRecord {
        manifest
            .iter()
            .find(|r| r.full_image_path == full)
            .unwrap_or_else(|| panic!("no record for {full}"))
    }

    #[test]
    fn one_record_per_recognized_image() {
        let site = setup_site();
        let images = site.path().join("images");
        touch_files(&images, &["b.JPG", "a.jpeg", "c.png", "notes.txt", "anim.gif"]);
        fs::create_dir_all(images.join("nested.jpg")).unwrap();

        let manifest = build(
            &paths_for(site.path()),
            &options_for(site.path()),
            &MockBackend::new(),
        )
        .unwrap();

        let full: Vec<&str> = manifest.iter().map(|r| r.full_image_path.as_str()).collect();
        assert_eq!(full, vec!["images/a.jpeg", "images/b.JPG", "images/c.png"]);
    }

    #[test]
    fn record_fields_derived_from_filename() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["sunset.jpg"]);

        let manifest = build(
            &paths_for(site.path()),
            &options_for(site.path()),
            &MockBackend::new(),
        )
        .unwrap();

        let r = record(&manifest, "images/sunset.jpg");
        assert_eq!(r.preview_path, "images/previews/preview_sunset.jpg");
        assert_eq!(r.title, "sunset");
        assert_eq!(r.tags, vec!["Unsorted"]);
    }

    #[test]
    fn previews_requested_at_configured_width() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["wide.jpg", "small.png"]);
        let backend = MockBackend::new()
            .with_dimensions("wide.jpg", 3000, 2000)
            .with_dimensions("small.png", 120, 90);

        build(&paths_for(site.path()), &options_for(site.path()), &backend).unwrap();

        let mut resizes: Vec<(String, u32, u32)> = backend
            .resize_ops()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Resize {
                    output,
                    width,
                    height,
                    ..
                } => Some((output, width, height)),
                _ => None,
            })
            .collect();
        resizes.sort();

        let previews = site.path().join("images/previews");
        assert_eq!(
            resizes,
            vec![
                (
                    previews.join("preview_small.png").to_string_lossy().to_string(),
                    300,
                    225
                ),
                (
                    previews.join("preview_wide.jpg").to_string_lossy().to_string(),
                    300,
                    200
                ),
            ]
        );
    }

    #[test]
    fn preview_dir_created() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg"]);
        assert!(!site.path().join("images/previews").exists());

        build(
            &paths_for(site.path()),
            &options_for(site.path()),
            &MockBackend::new(),
        )
        .unwrap();
        assert!(site.path().join("images/previews").is_dir());
    }

    #[test]
    fn metadata_normalized_from_exif() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg"]);
        let backend = MockBackend::new().with_exif(
            "a.jpg",
            ExifTags {
                model: Some("X100V".into()),
                f_number: Some(2.0),
                exposure_time: Some((1, 500)),
                date_time_original: Some("2022:08:14 06:12:00".into()),
            },
        );

        let manifest = build(&paths_for(site.path()), &options_for(site.path()), &backend).unwrap();

        let m = &manifest[0].metadata;
        assert_eq!(m.device_model, "X100V");
        assert_eq!(m.f_number, "f/2");
        assert_eq!(m.exposure_time, "1/500");
        assert_eq!(m.date_taken, "2022-08-14T06:12:00");
    }

    #[test]
    fn exif_failure_yields_sentinels_and_keeps_image() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg", "b.jpg"]);
        let backend = MockBackend::new().with_failing_exif("a.jpg");

        let manifest = build(&paths_for(site.path()), &options_for(site.path()), &backend).unwrap();

        assert_eq!(manifest.len(), 2);
        let r = record(&manifest, "images/a.jpg");
        assert_eq!(r.metadata.device_model, UNKNOWN);
        assert_eq!(r.metadata.f_number, UNKNOWN);
        assert_eq!(r.metadata.exposure_time, UNKNOWN);
        assert_eq!(r.metadata.date_taken, UNKNOWN);
    }

    #[test]
    fn rebuild_preserves_tags() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg", "b.jpg"]);
        let paths = paths_for(site.path());
        let options = options_for(site.path());

        let mut first = build(&paths, &options, &MockBackend::new()).unwrap();
        first[0].tags = vec!["Travel".into(), "Japan".into()];
        first[1].tags = vec![];
        write_manifest(&paths.manifest, &first).unwrap();

        touch_files(&site.path().join("images"), &["c.jpg"]);
        let second = build(&paths, &options, &MockBackend::new()).unwrap();

        assert_eq!(record(&second, "images/a.jpg").tags, vec!["Travel", "Japan"]);
        assert!(record(&second, "images/b.jpg").tags.is_empty());
        assert_eq!(record(&second, "images/c.jpg").tags, vec!["Unsorted"]);

        let third = build(&paths, &options, &MockBackend::new()).unwrap();
        assert_eq!(second, third);
    }

    #[test]
    fn vanished_images_dropped() {
        let site = setup_site();
        let images = site.path().join("images");
        touch_files(&images, &["a.jpg", "b.jpg"]);
        let paths = paths_for(site.path());
        build(&paths, &options_for(site.path()), &MockBackend::new()).unwrap();

        fs::remove_file(images.join("b.jpg")).unwrap();
        let manifest = build(&paths, &options_for(site.path()), &MockBackend::new()).unwrap();
        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest[0].full_image_path, "images/a.jpg");
    }

    #[test]
    fn invalid_previous_manifest_treated_as_empty() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg"]);
        let paths = paths_for(site.path());
        fs::write(&paths.manifest, "{ not json").unwrap();

        let manifest = build(&paths, &options_for(site.path()), &MockBackend::new()).unwrap();
        assert_eq!(manifest[0].tags, vec!["Unsorted"]);
    }

    #[test]
    fn load_previous_tags_variants() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("images.json");
        assert!(load_previous_tags(&path).is_empty());

        fs::write(&path, r#"{"fullImagePath": "images/a.jpg"}"#).unwrap();
        assert!(load_previous_tags(&path).is_empty());

        fs::write(
            &path,
            r#"[
                {"fullImagePath": "images/a.jpg", "tags": ["x"]},
                {"fullImagePath": "images/b.jpg"},
                {"title": "no key", "tags": ["y"]}
            ]"#,
        )
        .unwrap();
        let tags = load_previous_tags(&path);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags["images/a.jpg"], vec!["x"]);
    }

    #[test]
    fn manifest_written_as_camel_case_array() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg"]);
        let paths = paths_for(site.path());
        build(&paths, &options_for(site.path()), &MockBackend::new()).unwrap();

        let json = read_json(&paths.manifest);
        let first = &json.as_array().unwrap()[0];
        assert_eq!(first["fullImagePath"], "images/a.jpg");
        assert_eq!(first["deviceModel"], "Unknown");
        assert!(!site.path().join("images.json.tmp").exists());
    }

    #[test]
    fn missing_source_dir_is_fatal_and_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = paths_for(tmp.path());

        let result = build(&paths, &options_for(tmp.path()), &MockBackend::new());
        assert!(matches!(result, Err(ManifestError::SourceDir { .. })));
        assert!(!paths.manifest.exists());
    }

    #[test]
    fn preview_failure_keeps_record_and_tags() {
        let site = setup_site();
        touch_files(&site.path().join("images"), &["a.jpg", "bad.jpg"]);
        let paths = paths_for(site.path());
        fs::write(
            &paths.manifest,
            r#"[{"fullImagePath": "images/bad.jpg", "tags": ["Keep"]}]"#,
        )
        .unwrap();

        let backend = MockBackend::new().with_failing_resize("bad.jpg");
        let manifest = build(&paths, &options_for(site.path()), &backend).unwrap();

        let full: Vec<&str> = manifest.iter().map(|r| r.full_image_path.as_str()).collect();
        assert_eq!(full, vec!["images/a.jpg", "images/bad.jpg"]);
        let bad = record(&manifest, "images/bad.jpg");
        assert_eq!(bad.preview_path, "images/previews/preview_bad.jpg");
        assert_eq!(bad.tags, vec!["Keep"]);
        assert_eq!(read_json(&paths.manifest).as_array().unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_images_are_listed() {
        let site = setup_site();
        let images = site.path().join("images");
        touch_files(&images, &["a.jpg"]);
        touch_files(&site.path().join("elsewhere"), &["b.jpg"]);
        fs::create_dir_all(site.path().join("elsewhere/dir.png")).unwrap();
        std::os::unix::fs::symlink(site.path().join("elsewhere/b.jpg"), images.join("b.jpg"))
            .unwrap();
        std::os::unix::fs::symlink(
            site.path().join("elsewhere/dir.png"),
            images.join("dir.png"),
        )
        .unwrap();
        std::os::unix::fs::symlink(site.path().join("missing.jpg"), images.join("dangling.jpg"))
            .unwrap();

        let manifest = build(
            &paths_for(site.path()),
            &options_for(site.path()),
            &MockBackend::new(),
        )
        .unwrap();

        let full: Vec<&str> = manifest.iter().map(|r| r.full_image_path.as_str()).collect();
        assert_eq!(full, vec!["images/a.jpg", "images/b.jpg"]);
    }

    #[test]
    fn empty_source_dir_writes_empty_manifest() {
        let site = setup_site();
        let paths = paths_for(site.path());
        let manifest = build(&paths, &options_for(site.path()), &MockBackend::new()).unwrap();
        assert!(manifest.is_empty());
        assert_eq!(read_json(&paths.manifest), serde_json::json!([]));
    }

    #[test]
    fn site_relative_outside_root_kept() {
        assert_eq!(
            site_relative(Path::new("/site"), Path::new("/elsewhere/a.jpg")),
            "/elsewhere/a.jpg"
        );
    }
}
