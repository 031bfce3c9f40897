//! Optional HTTP server for browsing the built site.
//!
//! | Route | Response |
//! |---|---|
//! | `GET /images` | JSON list of the source images with size and camera info |
//! | anything else | static files from the site root, `index.html` as directory index |
//!
//! The listing is computed on every request. Any failure while reading the
//! directory or an image answers `500 {"error": "Internal server error"}`;
//! the real cause goes to the log only.

use crate::imaging::{BackendError, ImageBackend, get_dimensions};
use crate::manifest::{ManifestError, list_images as list_image_files};
use crate::metadata::CameraMetadata;
use crate::naming::file_stem;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, ResponseError, web};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Listing failed: {0}")]
    Listing(#[from] ManifestError),
    #[error("Image read failed: {0}")]
    Image(#[from] BackendError),
    #[error("Worker failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        log::error!("Request failed: {}", self);
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": "Internal server error",
        }))
    }
}

/// One entry of the `/images` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedImage {
    pub src: String,
    pub title: String,
    pub device_model: String,
    pub date_taken: String,
    pub width: u32,
    pub height: u32,
}

/// Describe every image in `source_dir`, linking them under `/<url_prefix>/`.
///
/// Unreadable EXIF degrades to `"Unknown"`; an image whose size cannot be
/// read fails the whole listing.
pub fn list_images(
    source_dir: &Path,
    url_prefix: &str,
    backend: &impl ImageBackend,
) -> Result<Vec<ListedImage>, ServerError> {
    let prefix = url_prefix.trim_matches('/');
    list_image_files(source_dir)?
        .iter()
        .map(|path| -> Result<ListedImage, ServerError> {
            let (width, height) = get_dimensions(backend, path)?;
            let metadata = backend
                .read_exif(path)
                .map(|tags| CameraMetadata::from_tags(&tags))
                .unwrap_or_else(|_| CameraMetadata::unknown());
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            Ok(ListedImage {
                src: format!("/{prefix}/{file_name}"),
                title: file_stem(path),
                device_model: metadata.device_model,
                date_taken: metadata.date_taken,
                width,
                height,
            })
        })
        .collect()
}

/// Shared state for request handlers.
pub struct ServerState<B> {
    pub source_dir: PathBuf,
    pub url_prefix: String,
    pub backend: B,
}

async fn get_images<B>(state: web::Data<ServerState<B>>) -> Result<HttpResponse, ServerError>
where
    B: ImageBackend + Send + 'static,
{
    let state = state.into_inner();
    let images =
        web::block(move || list_images(&state.source_dir, &state.url_prefix, &state.backend))
            .await??;
    log::debug!("Listed {} images", images.len());
    Ok(HttpResponse::Ok().json(images))
}

/// API routes. Static file serving is added by [`serve`].
pub fn routes<B>(cfg: &mut web::ServiceConfig)
where
    B: ImageBackend + Send + 'static,
{
    cfg.service(web::resource("/images").route(web::get().to(get_images::<B>)));
}

/// Settings for [`serve`].
#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub site_root: PathBuf,
    pub source_dir: PathBuf,
    pub url_prefix: String,
    pub port: u16,
}

/// Run the server until interrupted.
pub async fn serve<B>(options: ServeOptions, backend: B) -> std::io::Result<()>
where
    B: ImageBackend + Send + 'static,
{
    let state = web::Data::new(ServerState {
        source_dir: options.source_dir.clone(),
        url_prefix: options.url_prefix.clone(),
        backend,
    });
    let site_root = options.site_root.clone();

    log::info!("Serving {} on port {}", site_root.display(), options.port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(routes::<B>)
            .service(actix_files::Files::new("/", site_root.clone()).index_file("index.html"))
    })
    .bind(("0.0.0.0", options.port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::ExifTags;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::touch_files;
    use actix_web::test as actix_test;
    use tempfile::TempDir;

    #[test]
    fn list_images_describes_each_file() {
        let tmp = TempDir::new().unwrap();
        touch_files(tmp.path(), &["b.png", "a.jpg", "skip.txt"]);
        let backend = MockBackend::new()
            .with_dimensions("a.jpg", 4000, 3000)
            .with_exif(
                "a.jpg",
                ExifTags {
                    model: Some("Leica Q2".into()),
                    date_time_original: Some("2021:01:02 03:04:05".into()),
                    ..ExifTags::default()
                },
            )
            .with_failing_exif("b.png");

        let images = list_images(tmp.path(), "/images/", &backend).unwrap();

        assert_eq!(
            images,
            vec![
                ListedImage {
                    src: "/images/a.jpg".into(),
                    title: "a".into(),
                    device_model: "Leica Q2".into(),
                    date_taken: "2021-01-02T03:04:05".into(),
                    width: 4000,
                    height: 3000,
                },
                ListedImage {
                    src: "/images/b.png".into(),
                    title: "b".into(),
                    device_model: "Unknown".into(),
                    date_taken: "Unknown".into(),
                    width: 1200,
                    height: 800,
                },
            ]
        );
    }

    #[test]
    fn list_images_missing_dir_errors() {
        let tmp = TempDir::new().unwrap();
        let result = list_images(&tmp.path().join("nope"), "images", &MockBackend::new());
        assert!(matches!(result, Err(ServerError::Listing(_))));
    }

    #[test]
    fn listed_image_serializes_camel_case() {
        let json = serde_json::to_value(ListedImage {
            src: "/images/a.jpg".into(),
            title: "a".into(),
            device_model: "X".into(),
            date_taken: "Unknown".into(),
            width: 1,
            height: 2,
        })
        .unwrap();
        assert_eq!(json["deviceModel"], "X");
        assert_eq!(json["dateTaken"], "Unknown");
    }

    #[actix_web::test]
    async fn get_images_returns_json() {
        let tmp = TempDir::new().unwrap();
        touch_files(tmp.path(), &["a.jpg"]);
        let state = web::Data::new(ServerState {
            source_dir: tmp.path().to_path_buf(),
            url_prefix: "images".to_string(),
            backend: MockBackend::new(),
        });
        let app =
            actix_test::init_service(App::new().app_data(state).configure(routes::<MockBackend>)).await;

        let req = actix_test::TestRequest::get().uri("/images").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let body: Vec<ListedImage> = actix_test::read_body_json(resp).await;
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].src, "/images/a.jpg");
    }

    #[actix_web::test]
    async fn get_images_failure_is_generic_500() {
        let tmp = TempDir::new().unwrap();
        let state = web::Data::new(ServerState {
            source_dir: tmp.path().join("missing"),
            url_prefix: "images".to_string(),
            backend: MockBackend::new(),
        });
        let app =
            actix_test::init_service(App::new().app_data(state).configure(routes::<MockBackend>)).await;

        let req = actix_test::TestRequest::get().uri("/images").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body: serde_json::Value = actix_test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    }
}
