// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! HTTP client for talking to a running pathguard server

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PathguardClient {
    client: Client,
    base_url: String,
}

/// Outcome of a remote read, mirroring the server's status mapping
#[derive(Debug, Clone, PartialEq)]
pub enum ReadOutcome {
    Found { path: String, content: String },
    Invalid { messages: Vec<String> },
    Forbidden,
    NotFound { path: Option<String> },
}

#[derive(Debug, Deserialize)]
pub struct SetupResponse {
    pub ok: bool,
    pub base: String,
}

#[derive(Serialize)]
struct ReadRequest<'a> {
    filename: &'a str,
}

impl PathguardClient {
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = if host.starts_with("http://") || host.starts_with("https://") {
            format!("{}:{}", host, port)
        } else {
            format!("http://{}:{}", host, port)
        };

        Ok(Self { client, base_url })
    }

    /// Client against an explicit base URL (e.g. a test server)
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub async fn read_file(&self, filename: &str, validate: bool) -> Result<ReadOutcome> {
        let route = if validate { "read" } else { "read-no-validate" };

        let response = self
            .client
            .post(format!("{}/{}", self.base_url, route))
            .json(&ReadRequest { filename })
            .send()
            .await
            .context("Failed to send read request")?;

        #[derive(Deserialize)]
        struct FoundBody {
            path: String,
            content: String,
        }

        #[derive(Deserialize)]
        struct NotFoundBody {
            path: Option<String>,
        }

        #[derive(Deserialize)]
        struct FieldError {
            msg: String,
        }

        #[derive(Deserialize)]
        struct InvalidBody {
            errors: Vec<FieldError>,
        }

        match response.status() {
            StatusCode::OK => {
                let body: FoundBody = response
                    .json()
                    .await
                    .context("Failed to parse read response")?;
                Ok(ReadOutcome::Found {
                    path: body.path,
                    content: body.content,
                })
            }
            StatusCode::BAD_REQUEST => {
                let body: InvalidBody = response
                    .json()
                    .await
                    .context("Failed to parse validation response")?;
                Ok(ReadOutcome::Invalid {
                    messages: body.errors.into_iter().map(|e| e.msg).collect(),
                })
            }
            StatusCode::FORBIDDEN => Ok(ReadOutcome::Forbidden),
            StatusCode::NOT_FOUND => {
                let body: NotFoundBody = response
                    .json()
                    .await
                    .context("Failed to parse not-found response")?;
                Ok(ReadOutcome::NotFound { path: body.path })
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                anyhow::bail!("Read failed (HTTP {}): {}", status, error_text);
            }
        }
    }

    pub async fn setup_samples(&self) -> Result<SetupResponse> {
        let response = self
            .client
            .post(format!("{}/setup-sample", self.base_url))
            .send()
            .await
            .context("Failed to send setup request")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to provision samples: {}", error_text);
        }

        response
            .json()
            .await
            .context("Failed to parse setup response")
    }
}
