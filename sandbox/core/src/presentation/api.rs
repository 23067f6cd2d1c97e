// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! HTTP routes for contained file reads.
//!
//! | Route | Shape checks | Not-found body carries path |
//! |-------|--------------|-----------------------------|
//! | `POST /read` | yes | no |
//! | `POST /read-no-validate` | no | yes |
//! | `POST /setup-sample` | n/a | n/a |
//! | `GET /health` | n/a | n/a |
//!
//! Both read routes end in [`FileAccessService::read_file`], so skipping the
//! shape checks never skips containment.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::application::file_access::FileAccessService;
use crate::domain::storage::{FileContent, SandboxError};
use crate::domain::validation::{FilenameValidator, ValidationErrors};

pub struct AppState {
    pub files: Arc<FileAccessService>,
    pub validator: FilenameValidator,
    pub start_time: Instant,
}

pub fn app(files: Arc<FileAccessService>) -> Router {
    let state = Arc::new(AppState {
        files,
        validator: FilenameValidator::new(),
        start_time: Instant::now(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/read", post(read_validated))
        .route("/read-no-validate", post(read_unvalidated))
        .route("/setup-sample", post(setup_sample))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct FileResponse {
    path: String,
    content: String,
}

impl From<FileContent> for FileResponse {
    fn from(file: FileContent) -> Self {
        Self {
            path: file.path.to_string(),
            content: file.content,
        }
    }
}

/// Maps store failures to HTTP responses.
///
/// Rejections and I/O failures are reported generically. Only a not-found
/// outcome may echo a path, and that path is inside the sandbox by construction.
struct ReadError {
    error: SandboxError,
    include_path: bool,
}

impl IntoResponse for ReadError {
    fn into_response(self) -> Response {
        match self.error {
            SandboxError::PathTraversal => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Path traversal detected" })),
            )
                .into_response(),
            SandboxError::FileNotFound(path) => {
                let body = if self.include_path {
                    json!({ "error": "File not found", "path": path.display().to_string() })
                } else {
                    json!({ "error": "File not found" })
                };
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            SandboxError::IoError(_) | SandboxError::InvalidSeed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response(),
        }
    }
}

impl IntoResponse for ValidationErrors {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

/// Pull `filename` out of a JSON object body. Anything unparseable counts as
/// an absent field.
fn filename_field(body: &Bytes) -> Option<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(mut map)) => map.remove("filename"),
        _ => None,
    }
}

/// Name used by the unvalidated route. Missing, `null`, `false`, `0` and `""`
/// read as the empty name; `true` and other numbers use their JSON text.
/// Arrays and objects name nothing and read as empty too.
fn loose_filename(field: Option<&Value>) -> Cow<'_, str> {
    match field {
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(Value::Bool(true)) => Cow::Borrowed("true"),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Cow::Owned(n.to_string()),
        _ => Cow::Borrowed(""),
    }
}

async fn read_file(
    state: &AppState,
    filename: &str,
    include_path: bool,
) -> Result<Json<FileResponse>, ReadError> {
    state
        .files
        .read_file(filename)
        .await
        .map(|file| Json(FileResponse::from(file)))
        .map_err(|error| ReadError {
            error,
            include_path,
        })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "uptime_seconds": state.start_time.elapsed().as_secs(),
    }))
}

async fn read_validated(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let field = filename_field(&body);

    let filename = match state.validator.validate(field.as_ref()) {
        Ok(filename) => filename,
        Err(errors) => {
            tracing::debug!(errors = ?errors.messages(), "Read request failed validation");
            return errors.into_response();
        }
    };

    read_file(&state, filename, false).await.into_response()
}

async fn read_unvalidated(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let field = filename_field(&body);
    let filename = loose_filename(field.as_ref());

    read_file(&state, &filename, true).await.into_response()
}

async fn setup_sample(State(state): State<Arc<AppState>>) -> Response {
    match state.files.provision_samples().await {
        Ok(base) => Json(json!({ "ok": true, "base": base.to_string() })).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Sample provisioning failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}
