// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! File Access Service
//!
//! Application service shared by every read entry point. Holding the store
//! behind this service means handlers never see or recompute the base
//! directory themselves, and every read takes the same containment path no
//! matter which route it came from.
//!
//! # Architecture
//!
//! - **Layer:** Application Layer
//! - **Purpose:** Read, existence and provisioning use cases over a `SandboxStore`

use std::sync::Arc;

use crate::domain::path_containment::BaseDirectory;
use crate::domain::storage::{FileContent, SampleEntry, SandboxError, SandboxStore};

/// Fixed fixtures written by [`FileAccessService::provision_samples`].
pub const SAMPLE_FILES: &[(&str, &str)] = &[
    ("hello.txt", "Hello from safe file!\n"),
    ("notes/readme.md", "# Readme\nSample readme file"),
];

pub fn sample_entries() -> Vec<SampleEntry> {
    SAMPLE_FILES
        .iter()
        .map(|(path, content)| SampleEntry::new(*path, *content))
        .collect()
}

pub struct FileAccessService {
    store: Arc<dyn SandboxStore>,
}

impl FileAccessService {
    pub fn new(store: Arc<dyn SandboxStore>) -> Self {
        Self { store }
    }

    pub fn base(&self) -> &BaseDirectory {
        self.store.base()
    }

    pub async fn read_file(&self, raw: &str) -> Result<FileContent, SandboxError> {
        match self.store.read(raw).await {
            Ok(file) => {
                tracing::info!(path = %file.path, bytes = file.content.len(), "File read");
                Ok(file)
            }
            Err(SandboxError::FileNotFound(path)) => {
                tracing::debug!(path = %path.display(), "File not found");
                Err(SandboxError::FileNotFound(path))
            }
            Err(e @ SandboxError::IoError(_)) => {
                tracing::error!(error = %e, "File read failed");
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn file_exists(&self, raw: &str) -> Result<bool, SandboxError> {
        self.store.exists(raw).await
    }

    /// Write the fixed sample files and return the base directory they live in
    pub async fn provision_samples(&self) -> Result<&BaseDirectory, SandboxError> {
        let entries = sample_entries();
        self.store.seed(&entries).await?;
        tracing::info!(
            base = %self.store.base(),
            files = entries.len(),
            "Sample files provisioned"
        );
        Ok(self.store.base())
    }
}
