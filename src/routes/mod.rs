//! API routes

use std::io;
use std::path::Path;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::core::{ChatEngine, ChatError, ChatRequest, TurnResult};
use crate::indexer::extract_sample_code;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub engine: Arc<ChatEngine>,
}

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug)]
pub enum ApiError {
    /// 404 - the referenced conversation does not exist.
    NotFound(String),
    /// 502 - the generation call failed.
    BadGateway(String),
    /// 500 - storage or other unexpected server failure.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg),
        };

        let body = ErrorBody {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match &err {
            ChatError::NotFound(_) => ApiError::NotFound(err.to_string()),
            ChatError::Upstream(_) => ApiError::BadGateway(err.to_string()),
            ChatError::Storage(_) => ApiError::Internal(err.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<TurnResult>, ApiError> {
    let result = state.engine.process(request).await?;
    Ok(Json(result))
}

/// List data files available for placeholder URLs, as paths relative to
/// the data directory.
async fn list_data(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let mut files = Vec::new();
    collect_relative_paths(&state.config.data_dir, &state.config.data_dir, &mut files)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    files.sort();
    Ok(Json(files))
}

fn collect_relative_paths(root: &Path, dir: &Path, files: &mut Vec<String>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_relative_paths(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_string_lossy().replace('\\', "/"));
        }
    }
    Ok(())
}

// Search-skillset enrichment protocol: one request carries a batch of
// records; failures are reported per record, never as a request error.

#[derive(Debug, Deserialize)]
pub struct EnrichmentRequest {
    #[serde(default)]
    pub values: Vec<EnrichmentRecord>,
}

#[derive(Debug, Deserialize)]
pub struct EnrichmentRecord {
    #[serde(rename = "recordId", default)]
    pub record_id: Option<String>,
    #[serde(default)]
    pub data: Option<EnrichmentInput>,
}

#[derive(Debug, Deserialize)]
pub struct EnrichmentInput {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EnrichmentResponse {
    pub values: Vec<EnrichmentResult>,
}

#[derive(Debug, Serialize)]
pub struct EnrichmentResult {
    #[serde(rename = "recordId")]
    pub record_id: Option<String>,
    pub data: Option<EnrichmentOutput>,
    pub errors: Option<Vec<EnrichmentMessage>>,
    pub warnings: Option<Vec<EnrichmentMessage>>,
}

#[derive(Debug, Serialize)]
pub struct EnrichmentOutput {
    pub code_snippet: String,
    pub usage_description: String,
}

#[derive(Debug, Serialize)]
pub struct EnrichmentMessage {
    pub message: String,
}

fn enrich_record(record: EnrichmentRecord) -> EnrichmentResult {
    let content = record.data.and_then(|data| data.content);
    match content {
        Some(content) => {
            let extracted = extract_sample_code(&content);
            EnrichmentResult {
                record_id: record.record_id,
                data: Some(EnrichmentOutput {
                    code_snippet: extracted.code_snippet,
                    usage_description: extracted.usage_description,
                }),
                errors: None,
                warnings: None,
            }
        }
        None => EnrichmentResult {
            record_id: record.record_id,
            data: None,
            errors: Some(vec![EnrichmentMessage {
                message: "record has no content field".to_string(),
            }]),
            warnings: None,
        },
    }
}

async fn extract_code(Json(request): Json<EnrichmentRequest>) -> Json<EnrichmentResponse> {
    let values = request.values.into_iter().map(enrich_record).collect();
    Json(EnrichmentResponse { values })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/data", get(list_data))
        .route("/api/extract-code", post(extract_code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enrich_record_extracts_code() {
        let record = EnrichmentRecord {
            record_id: Some("1".to_string()),
            data: Some(EnrichmentInput {
                content: Some("<html><script>var a = 1;</script></html>".to_string()),
            }),
        };

        let result = enrich_record(record);
        assert_eq!(result.record_id.as_deref(), Some("1"));
        assert!(result.errors.is_none());
        assert!(result.data.unwrap().code_snippet.contains("var a = 1;"));
    }

    #[test]
    fn test_enrich_record_without_content_reports_error() {
        let record = EnrichmentRecord {
            record_id: Some("2".to_string()),
            data: None,
        };

        let result = enrich_record(record);
        assert!(result.data.is_none());
        assert_eq!(
            result.errors.unwrap()[0].message,
            "record has no content field"
        );
    }
}
