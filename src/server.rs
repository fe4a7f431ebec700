// HTTP surface - routing, request parsing and the JSON envelope

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, Path, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode,
    },
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::downloader::errors::GatewayError;
use crate::downloader::format_selector::FormatSelector;
use crate::downloader::gateway::Gateway;
use crate::downloader::models::{DownloadRequest, MetadataResult, Platform};
use crate::downloader::validator::validate_url;

#[derive(Clone)]
pub struct AppState {
    gateway: Gateway,
}

#[derive(Debug, Deserialize)]
struct VideoInfoBody {
    url: Option<String>,
    platform: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DownloadBody {
    url: Option<String>,
    format: Option<String>,
    platform: Option<String>,
}

#[derive(Debug, Serialize)]
struct VideoInfoResponse {
    success: bool,
    #[serde(flatten)]
    info: MetadataResult,
}

#[derive(Debug, Serialize)]
struct DownloadResponse {
    success: bool,
    download_url: String,
    filename: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Callers read `success`; only a missing file is signalled by status
        let status = match self {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::OK,
        };
        tracing::debug!(kind = self.kind(), "request failed: {}", self);

        let body = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/video-info", post(video_info))
        .route("/download", post(download))
        .route("/download-file/:filename", get(download_file))
        .with_state(AppState { gateway })
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([CONTENT_DISPOSITION])
}

fn reject_body(rejection: JsonRejection) -> GatewayError {
    GatewayError::invalid(format!("Invalid request body: {}", rejection.body_text()))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn video_info(
    State(state): State<AppState>,
    body: Result<Json<VideoInfoBody>, JsonRejection>,
) -> Result<Json<VideoInfoResponse>, GatewayError> {
    let Json(body) = body.map_err(reject_body)?;
    let platform = Platform::from_hint(body.platform.as_deref());
    let url = validate_url(body.url.as_deref(), &platform)?;

    let info = state.gateway.fetch_metadata(url).await?;
    Ok(Json(VideoInfoResponse {
        success: true,
        info,
    }))
}

async fn download(
    State(state): State<AppState>,
    body: Result<Json<DownloadBody>, JsonRejection>,
) -> Result<Json<DownloadResponse>, GatewayError> {
    let Json(body) = body.map_err(reject_body)?;
    let platform = Platform::from_hint(body.platform.as_deref());
    let url = validate_url(body.url.as_deref(), &platform)?.to_string();
    let format = FormatSelector::parse(body.format.as_deref())?;

    let artifact = state
        .gateway
        .download_media(&DownloadRequest {
            url,
            format,
            platform,
        })
        .await?;

    Ok(Json(DownloadResponse {
        success: true,
        download_url: artifact.download_url(),
        filename: artifact.filename,
    }))
}

async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, GatewayError> {
    let Some(path) = state.gateway.store().resolve(&filename) else {
        tracing::warn!(requested = %filename, "refused artifact name outside storage");
        return Err(GatewayError::NotFound);
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(error) => {
            if error.kind() != ErrorKind::NotFound {
                tracing::warn!(path = %path.display(), "could not open artifact: {}", error);
            }
            return Err(GatewayError::NotFound);
        }
    };
    let metadata = file.metadata().await.map_err(|_| GatewayError::NotFound)?;
    if !metadata.is_file() {
        return Err(GatewayError::NotFound);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static(content_type_for_filename(&filename)),
    );
    headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&filename)) {
        headers.insert(CONTENT_DISPOSITION, value);
    }

    let body = Body::from_stream(ReaderStream::new(file));
    Ok((headers, body).into_response())
}

fn content_type_for_filename(filename: &str) -> &'static str {
    let ext = filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("webm") => "video/webm",
        Some("m4a") => "audio/mp4",
        _ => "application/octet-stream",
    }
}

fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
