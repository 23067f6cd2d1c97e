// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! End-to-end tests for the read API over a real temporary sandbox.
//!
//! These tests verify:
//! 1. Sample provisioning and round-trip reads
//! 2. Traversal rejection with a generic message on both read routes
//! 3. Not-found and shape-validation responses

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use pathguard_core::application::file_access::FileAccessService;
use pathguard_core::domain::storage::SandboxStore;
use pathguard_core::infrastructure::storage::LocalSandboxStore;
use pathguard_core::presentation::api::app;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct Harness {
    // Held so the sandbox outlives the test body.
    _temp_dir: TempDir,
    store: Arc<LocalSandboxStore>,
    router: Router,
}

impl Harness {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let store = Arc::new(LocalSandboxStore::new(temp_dir.path().join("files")).unwrap());
        let service = Arc::new(FileAccessService::new(store.clone()));

        Self {
            _temp_dir: temp_dir,
            store,
            router: app(service),
        }
    }

    fn base(&self) -> String {
        self.store.base().to_string()
    }

    async fn post(&self, uri: &str, body: Body) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(body)
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.post(uri, Body::from(body.to_string())).await
    }

    async fn seed(&self) {
        let (status, _) = self.post("/setup-sample", Body::empty()).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_setup_sample_reports_base() {
    let harness = Harness::new();

    let (status, body) = harness.post("/setup-sample", Body::empty()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true, "base": harness.base() }));
}

#[tokio::test]
async fn test_read_seeded_files() {
    let harness = Harness::new();
    harness.seed().await;

    let (status, body) = harness
        .post_json("/read", json!({ "filename": "hello.txt" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello from safe file!\n");
    assert_eq!(
        body["path"],
        harness.store.base().as_path().join("hello.txt").display().to_string()
    );

    let (status, body) = harness
        .post_json("/read-no-validate", json!({ "filename": "notes/readme.md" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "# Readme\nSample readme file");
}

#[tokio::test]
async fn test_seed_twice_is_idempotent() {
    let harness = Harness::new();
    harness.seed().await;
    harness.seed().await;

    assert!(harness.store.exists("hello.txt").await.unwrap());
    let (status, body) = harness
        .post_json("/read", json!({ "filename": "hello.txt" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello from safe file!\n");
}

#[tokio::test]
async fn test_padded_filename_is_trimmed_on_validated_route() {
    let harness = Harness::new();
    harness.seed().await;

    let (status, body) = harness
        .post_json("/read", json!({ "filename": " hello.txt " }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "Hello from safe file!\n");

    // No shape checks, so the padding stays part of the name.
    let (status, body) = harness
        .post_json("/read-no-validate", json!({ "filename": " hello.txt " }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["path"],
        harness.store.base().as_path().join(" hello.txt ").display().to_string()
    );
}

#[tokio::test]
async fn test_climb_that_lands_inside_is_served() {
    let harness = Harness::new();
    harness.seed().await;

    for uri in ["/read", "/read-no-validate"] {
        let (status, body) = harness
            .post_json(uri, json!({ "filename": "../files/notes/readme.md" }))
            .await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["content"], "# Readme\nSample readme file");
    }
}

#[tokio::test]
async fn test_traversal_is_forbidden_on_both_routes() {
    let harness = Harness::new();
    harness.seed().await;

    for uri in ["/read", "/read-no-validate"] {
        for filename in [
            "../server.js",
            "../../etc/passwd",
            "%2e%2e%2fserver.js",
            "notes/../../server.js",
            "/etc/passwd",
            "a%00.txt",
        ] {
            let (status, body) = harness
                .post_json(uri, json!({ "filename": filename }))
                .await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{uri} {filename}");
            assert_eq!(body, json!({ "error": "Path traversal detected" }));
        }
    }
}

#[tokio::test]
async fn test_rejection_never_leaks_base() {
    let harness = Harness::new();

    let (_, body) = harness
        .post_json("/read-no-validate", json!({ "filename": "../../etc/passwd" }))
        .await;

    assert!(!body.to_string().contains(&harness.base()));
}

#[tokio::test]
async fn test_missing_file() {
    let harness = Harness::new();
    harness.seed().await;

    let (status, body) = harness
        .post_json("/read", json!({ "filename": "missing.txt" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "File not found" }));

    let (status, body) = harness
        .post_json("/read-no-validate", json!({ "filename": "missing.txt" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "File not found");
    assert_eq!(
        body["path"],
        harness.store.base().as_path().join("missing.txt").display().to_string()
    );
}

#[tokio::test]
async fn test_empty_filename_fails_validation() {
    let harness = Harness::new();

    let (status, body) = harness.post_json("/read", json!({ "filename": "" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let messages: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["msg"].as_str().unwrap())
        .collect();
    assert_eq!(messages, vec!["filename must not be empty"]);
}

#[tokio::test]
async fn test_shape_failures_are_itemized() {
    let harness = Harness::new();

    let (status, body) = harness.post_json("/read", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["msg"], "filename required");

    let (status, body) = harness.post_json("/read", json!({ "filename": ["a"] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["msg"], "filename must be a string");

    let (status, body) = harness
        .post_json("/read", json!({ "filename": "a\u{0}.txt" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["msg"], "null byte not allowed");

    let (status, body) = harness.post("/read", Body::from("not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["msg"], "filename required");
}

#[tokio::test]
async fn test_unvalidated_route_still_contains_raw_null_byte() {
    let harness = Harness::new();
    harness.seed().await;

    let (status, body) = harness
        .post_json("/read-no-validate", json!({ "filename": "hello.txt\u{0}.png" }))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "Path traversal detected" }));
}

#[tokio::test]
async fn test_unvalidated_missing_field_resolves_to_base() {
    let harness = Harness::new();

    let (status, body) = harness.post("/read-no-validate", Body::empty()).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["path"], harness.base());
}

#[tokio::test]
async fn test_health() {
    let harness = Harness::new();

    let response = harness
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "healthy");
}
