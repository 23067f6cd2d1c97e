// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sandbox Store Trait
//!
//! Abstraction over the filesystem that backs the sandbox. Every operation
//! that accepts caller input resolves it through
//! [`PathContainment`](crate::domain::path_containment::PathContainment)
//! before touching the filesystem; implementations expose no entry point that
//! takes an already-resolved path.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::domain::path_containment::{BaseDirectory, Rejected, ResolvedPath};

/// Service-owned fixture written by provisioning.
///
/// Never built from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEntry {
    /// Path relative to the base directory, `/`-separated
    pub relative_path: String,
    /// File body, written verbatim as UTF-8
    pub content: String,
}

impl SampleEntry {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }
}

/// Text read from inside the sandbox, paired with the path it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: ResolvedPath,
    pub content: String,
}

/// Sandbox store errors
///
/// `PathTraversal` deliberately carries nothing: callers learn that the input
/// was refused, not why.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("Path traversal detected")]
    PathTraversal,

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Sample entry escapes the base directory: {0}")]
    InvalidSeed(String),
}

impl From<Rejected> for SandboxError {
    fn from(_: Rejected) -> Self {
        SandboxError::PathTraversal
    }
}

/// Contained file access over a single base directory
#[async_trait]
pub trait SandboxStore: Send + Sync {
    /// The directory every resolved path lives under
    fn base(&self) -> &BaseDirectory;

    /// Resolve `raw`, then report whether anything exists at that path.
    ///
    /// A rejected input never reaches the filesystem.
    async fn exists(&self, raw: &str) -> Result<bool, SandboxError>;

    /// Resolve `raw`, confirm a regular file exists there, and read it as
    /// UTF-8 text.
    ///
    /// # Returns
    /// * `Ok(FileContent)` - resolved path and file body
    /// * `Err(SandboxError::PathTraversal)` - input refused by containment
    /// * `Err(SandboxError::FileNotFound)` - nothing readable at the resolved path
    /// * `Err(SandboxError::IoError)` - the read itself failed
    async fn read(&self, raw: &str) -> Result<FileContent, SandboxError>;

    /// Write each entry under the base directory, creating parent directories
    /// and overwriting existing files. Idempotent.
    async fn seed(&self, entries: &[SampleEntry]) -> Result<(), SandboxError>;
}
