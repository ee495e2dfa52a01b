//! HTTP surface.
//!
//! Two routes:
//!
//! - `GET /` - health probe, always `{"status": "Image Editor API is running!"}`
//! - `POST /edit-image` - multipart form with `image` (required file),
//!   `text` and `logo_url`; answers with `image/jpeg`
//!
//! Failures answer with a JSON body `{"error": "..."}`: 400 for a missing
//! image or a malformed form, 500 when the pipeline fails.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::compositor::{Compositor, RenderRequest};
use crate::error::ComposeError;

// ============================================================================
// ApiError
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No image provided")]
    MissingImage,

    #[error("Invalid multipart body")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Compose(#[from] ComposeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingImage | Self::Multipart(_) => StatusCode::BAD_REQUEST,
            Self::Compose(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::Compose(err) => err.public_message().to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Compose(err) => error!(error = %err, "render failed"),
            Self::Multipart(err) => warn!(error = %err, "rejected multipart body"),
            Self::MissingImage => warn!("request without image"),
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status(), body).into_response()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Builds the service router.
///
/// `max_upload_bytes` caps the request body; larger uploads are refused by
/// the body limit layer before reaching the handler.
pub fn router(compositor: Compositor, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/edit-image", post(edit_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(compositor)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "Image Editor API is running!" }))
}

async fn edit_image(
    State(compositor): State<Compositor>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    // A request that is not multipart at all carries no image either.
    let Ok(multipart) = multipart else {
        return Err(ApiError::MissingImage);
    };
    let request = read_form(multipart).await?;

    let output = compositor.render(request).await?;
    info!(
        width = output.size.width,
        height = output.size.height,
        lines = output.layout.lines.len(),
        logo = output.logo.is_some(),
        bytes = output.jpeg.len(),
        "image rendered"
    );

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], output.jpeg).into_response())
}

/// Collects the form fields into a render request.
///
/// Unknown fields are drained and ignored. When a field repeats, the last
/// occurrence wins.
async fn read_form(mut multipart: Multipart) -> Result<RenderRequest, ApiError> {
    let mut image = None;
    let mut caption = None;
    let mut logo_url = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "image" => image = Some(field.bytes().await?),
            "text" => caption = Some(field.text().await?),
            "logo_url" => logo_url = Some(field.text().await?),
            _ => {
                field.bytes().await?;
            }
        }
    }

    let image = image.ok_or(ApiError::MissingImage)?;
    let mut request = RenderRequest::new(image.to_vec());
    if let Some(caption) = caption {
        request = request.with_caption(caption);
    }
    if let Some(url) = logo_url {
        request = request.with_logo_url(url.trim());
    }
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::StyleProfile;
    use crate::text::FontLibrary;
    use crate::LogoFetcher;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "caption-renderer-test-boundary";

    fn app() -> Router {
        let compositor = Compositor::new(
            StyleProfile::default(),
            FontLibrary::empty(),
            LogoFetcher::new(Duration::from_secs(2)).unwrap(),
        );
        router(compositor, 10 * 1024 * 1024)
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([30, 30, 30, 255])))
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"upload.png\"\r\nContent-Type: image/png\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn edit_request(parts: &[Part<'_>]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/edit-image")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        response
            .into_body()
            .collect()
            .await
            .unwrap()
            .to_bytes()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_probe() {
        let response = app()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "Image Editor API is running!" })
        );
    }

    #[tokio::test]
    async fn missing_image_is_bad_request() {
        let response = app()
            .oneshot(edit_request(&[Part::Text("text", "Hello")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "No image provided" }));
    }

    #[tokio::test]
    async fn non_multipart_request_has_no_image() {
        let request = Request::builder()
            .method("POST")
            .uri("/edit-image")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await, json!({ "error": "No image provided" }));
    }

    #[tokio::test]
    async fn renders_jpeg() {
        let upload = png(800, 600);
        let response = app()
            .oneshot(edit_request(&[
                Part::File("image", &upload),
                Part::Text("text", "Hello World"),
                Part::Text("logo_url", ""),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "image/jpeg"
        );
        let jpeg = body_bytes(response).await;
        let decoded = image::load_from_memory_with_format(&jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (800, 600));
    }

    #[tokio::test]
    async fn unreachable_logo_still_renders() {
        let upload = png(320, 240);
        let response = app()
            .oneshot(edit_request(&[
                Part::File("image", &upload),
                Part::Text("logo_url", "http://127.0.0.1:1/logo.png"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let decoded = image::load_from_memory(&body_bytes(response).await).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (320, 240));
    }

    #[tokio::test]
    async fn undecodable_image_is_server_error() {
        let response = app()
            .oneshot(edit_request(&[Part::File("image", b"\x00\x01garbage")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Failed to decode image" })
        );
    }

    #[tokio::test]
    async fn unknown_fields_are_ignored() {
        let upload = png(64, 64);
        let response = app()
            .oneshot(edit_request(&[
                Part::Text("caption_color", "red"),
                Part::File("image", &upload),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let compositor = Compositor::new(
            StyleProfile::default(),
            FontLibrary::empty(),
            LogoFetcher::new(Duration::from_secs(2)).unwrap(),
        );
        let app = router(compositor, 1024);
        let upload = vec![0u8; 4096];
        let response = app
            .oneshot(edit_request(&[Part::File("image", &upload)]))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
