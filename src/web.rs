//! HTTP form front end
//!
//! `GET /` serves an upload form, `POST /generate` takes the multipart form
//! (`name`, `registration`, `caption`, `image`) and answers with the PNG stamp
//! as a download. Errors come back as JSON `{ "error": ... }`.

use crate::{
    encoders::encode_png, services::download_file_name, SignatureStamper, StampConfig, StampError,
};
use axum::{
    extract::{multipart::Multipart, DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use image::DynamicImage;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Largest accepted upload
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Signature Stamp Generator</title>
    <style>
        body { font-family: Arial, sans-serif; max-width: 600px; margin: 50px auto; padding: 20px; }
        input, button { width: 100%; padding: 10px; margin: 10px 0; box-sizing: border-box; }
        button { background: #007bff; color: white; border: none; cursor: pointer; font-size: 16px; }
        button:disabled { background: #6c757d; }
        #result { margin-top: 20px; text-align: center; }
        img { max-width: 100%; border: 1px solid #ddd; margin-top: 10px; }
    </style>
</head>
<body>
    <h1>Signature Stamp Generator</h1>
    <form id="form" enctype="multipart/form-data">
        <input type="text" name="name" placeholder="Name (e.g. Dr. Ana Lima)" required>
        <input type="text" name="registration" placeholder="Registration ID (e.g. 12345-SP)" required>
        <input type="text" name="caption" placeholder="Extra line (optional)">
        <input type="file" name="image" accept="image/*" required>
        <button type="submit">Generate</button>
    </form>
    <div id="result"></div>
    <script>
        document.getElementById('form').onsubmit = async (e) => {
            e.preventDefault();
            const btn = e.target.querySelector('button');
            btn.textContent = 'Processing...';
            btn.disabled = true;
            const res = await fetch('/generate', { method: 'POST', body: new FormData(e.target) });
            const out = document.getElementById('result');
            if (res.ok) {
                const url = URL.createObjectURL(await res.blob());
                out.innerHTML = `<img src="${url}"><br><a href="${url}" download="signature.png"><button type="button">Download</button></a>`;
            } else {
                const body = await res.json().catch(() => ({ error: res.statusText }));
                out.innerHTML = `<p style="color:red">${body.error}</p>`;
            }
            btn.textContent = 'Generate';
            btn.disabled = false;
        };
    </script>
</body>
</html>
"#;

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Shared, read-only server state
pub struct AppState {
    stamper: SignatureStamper,
}

impl AppState {
    #[must_use]
    pub fn new(stamper: SignatureStamper) -> Self {
        Self { stamper }
    }
}

/// Pipeline error rendered as a JSON response
struct ApiError(StampError);

impl From<StampError> for ApiError {
    fn from(err: StampError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// HTTP status for each pipeline error kind
#[must_use]
pub fn status_for(err: &StampError) -> StatusCode {
    match err {
        StampError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        StampError::EmptyMask | StampError::InfeasibleLayout { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        },
        StampError::SegmentationFailed { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the router around a ready stamper
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/generate", post(generate_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

/// Bind `addr` and serve until the process stops
pub async fn serve(addr: SocketAddr, config: StampConfig) -> anyhow::Result<()> {
    let stamper = SignatureStamper::from_config(config)?;
    let app = router(Arc::new(AppState::new(stamper)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Web server running on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "sigstamp",
    }))
}

#[derive(Default)]
struct StampForm {
    name: String,
    registration: String,
    caption: String,
    image: Option<Vec<u8>>,
}

async fn read_form(mut multipart: Multipart) -> Result<StampForm, StampError> {
    let mut form = StampForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| StampError::invalid_input(format!("Failed to read multipart data: {}", e)))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "image" => {
                let data = field.bytes().await.map_err(|e| {
                    StampError::invalid_input(format!("Failed to read image data: {}", e))
                })?;
                form.image = Some(data.to_vec());
            },
            "name" | "registration" | "caption" => {
                let text = field.text().await.map_err(|e| {
                    StampError::invalid_input(format!("Failed to read field '{}': {}", field_name, e))
                })?;
                match field_name.as_str() {
                    "name" => form.name = text,
                    "registration" => form.registration = text,
                    _ => form.caption = text,
                }
            },
            _ => {},
        }
    }
    Ok(form)
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let request_id = uuid::Uuid::new_v4();
    let form = read_form(multipart).await?;

    let image = form
        .image
        .filter(|bytes| !bytes.is_empty())
        .ok_or_else(|| StampError::invalid_input("No image provided"))?;
    let caption = state
        .stamper
        .caption(&form.name, &form.registration, Some(&form.caption))?;

    info!(%request_id, bytes = image.len(), "Stamp requested for {}", caption.name());
    let stamp = state.stamper.generate(&image, &caption).await?;
    let png = encode_png(&DynamicImage::ImageRgb8(stamp), state.stamper.config().dpi)?;
    info!(%request_id, png_bytes = png.len(), "Stamp ready");

    let disposition = content_disposition(&download_file_name(caption.name()));
    Ok((
        [
            (header::CONTENT_TYPE, "image/png".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        png,
    )
        .into_response())
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name
fn content_disposition(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in file_name.bytes() {
        if byte.is_ascii_alphanumeric() || b"-._~".contains(&byte) {
            encoded.push(char::from(byte));
        } else {
            encoded.push_str(&format!("%{:02X}", byte));
        }
    }
    format!("attachment; filename=\"{}\"; filename*=UTF-8''{}", ascii, encoded)
}
