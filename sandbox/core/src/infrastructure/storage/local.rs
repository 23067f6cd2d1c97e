// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Local Filesystem Sandbox Store
//!
//! Filesystem-backed implementation of [`SandboxStore`]. The base directory
//! is created and canonicalized once at construction and never changes.
//!
//! All I/O goes through `tokio::fs`, which runs blocking calls on the worker
//! pool so a slow disk never stalls unrelated requests.
//!
//! **Symlinks:** by default containment is purely lexical, so a symlink
//! inside the base directory that points elsewhere is followed. Enable
//! [`LocalSandboxStore::with_symlink_resolution`] to re-check the real path.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::domain::config::StorageConfig;
use crate::domain::path_containment::{BaseDirectory, PathContainment, ResolvedPath};
use crate::domain::storage::{FileContent, SampleEntry, SandboxError, SandboxStore};

/// Local filesystem sandbox store
pub struct LocalSandboxStore {
    /// Canonical sandbox root (e.g., "/var/lib/pathguard/files")
    base: BaseDirectory,

    containment: PathContainment,

    /// Re-check containment against the symlink-resolved path
    resolve_symlinks: bool,
}

impl LocalSandboxStore {
    /// Create the base directory if needed and open a store over it
    ///
    /// # Arguments
    /// * `base_path` - Sandbox root; relative paths are resolved against the
    ///   working directory
    ///
    /// # Example
    /// ```rust,no_run
    /// use pathguard_core::infrastructure::storage::LocalSandboxStore;
    ///
    /// let store = LocalSandboxStore::new("./files")?;
    /// # Ok::<(), pathguard_core::domain::storage::SandboxError>(())
    /// ```
    pub fn new(base_path: impl Into<PathBuf>) -> Result<Self, SandboxError> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            SandboxError::IoError(format!(
                "Failed to create base directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let canonical = std::fs::canonicalize(&base_path).map_err(|e| {
            SandboxError::IoError(format!(
                "Failed to canonicalize base directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let base = BaseDirectory::from_canonical(canonical)
            .map_err(|e| SandboxError::IoError(e.to_string()))?;

        tracing::debug!(base = %base, "Sandbox base directory ready");

        Ok(Self {
            base,
            containment: PathContainment::new(),
            resolve_symlinks: false,
        })
    }

    /// Open a store from the `storage` section of the node configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self, SandboxError> {
        Ok(Self::new(&config.base_dir)?
            .with_max_path_len(config.max_path_len)
            .with_symlink_resolution(config.resolve_symlinks))
    }

    pub fn with_max_path_len(mut self, max_path_len: usize) -> Self {
        self.containment = PathContainment::with_max_length(max_path_len);
        self
    }

    /// When enabled, an existing resolved path is canonicalized through the
    /// filesystem and must still lie inside the base directory.
    pub fn with_symlink_resolution(mut self, enabled: bool) -> Self {
        self.resolve_symlinks = enabled;
        self
    }

    async fn resolve(&self, raw: &str) -> Result<ResolvedPath, SandboxError> {
        let resolved = self.containment.resolve(&self.base, raw)?;

        if self.resolve_symlinks {
            self.verify_real_path(&resolved).await?;
        }

        Ok(resolved)
    }

    async fn verify_real_path(&self, resolved: &ResolvedPath) -> Result<(), SandboxError> {
        match tokio::fs::canonicalize(resolved.as_path()).await {
            Ok(real) if self.base.contains(&real) => Ok(()),
            Ok(real) => {
                tracing::warn!(
                    path = %resolved,
                    target = %real.display(),
                    "Symlink escapes the sandbox"
                );
                Err(SandboxError::PathTraversal)
            }
            // Nothing on disk yet, so there is no link to follow.
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SandboxError::IoError(format!(
                "Failed to resolve {}: {}",
                resolved, e
            ))),
        }
    }
}

#[async_trait]
impl SandboxStore for LocalSandboxStore {
    fn base(&self) -> &BaseDirectory {
        &self.base
    }

    async fn exists(&self, raw: &str) -> Result<bool, SandboxError> {
        let path = self.resolve(raw).await?;

        tokio::fs::try_exists(path.as_path())
            .await
            .map_err(|e| SandboxError::IoError(format!("Failed to stat {}: {}", path, e)))
    }

    async fn read(&self, raw: &str) -> Result<FileContent, SandboxError> {
        let path = self.resolve(raw).await?;

        let metadata = match tokio::fs::metadata(path.as_path()).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SandboxError::FileNotFound(path.into_path_buf()));
            }
            Err(e) => {
                return Err(SandboxError::IoError(format!(
                    "Failed to stat {}: {}",
                    path, e
                )));
            }
        };

        // Directories (including the base itself) hold no readable file.
        if !metadata.is_file() {
            return Err(SandboxError::FileNotFound(path.into_path_buf()));
        }

        match tokio::fs::read_to_string(path.as_path()).await {
            Ok(content) => Ok(FileContent { path, content }),
            // Removed between the stat and the read.
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(SandboxError::FileNotFound(path.into_path_buf()))
            }
            Err(e) => Err(SandboxError::IoError(format!(
                "Failed to read {}: {}",
                path, e
            ))),
        }
    }

    async fn seed(&self, entries: &[SampleEntry]) -> Result<(), SandboxError> {
        // Every entry is resolved before the first write.
        let planned = entries
            .iter()
            .map(|entry| {
                self.containment
                    .join_trusted(&self.base, &entry.relative_path)
                    .map(|path| (path, entry))
                    .map_err(|_| SandboxError::InvalidSeed(entry.relative_path.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (path, entry) in planned {
            if let Some(parent) = path.as_path().parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    SandboxError::IoError(format!(
                        "Failed to create directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }

            tokio::fs::write(path.as_path(), entry.content.as_bytes())
                .await
                .map_err(|e| SandboxError::IoError(format!("Failed to write {}: {}", path, e)))?;

            tracing::debug!(path = %path, bytes = entry.content.len(), "Seeded sample file");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn samples() -> Vec<SampleEntry> {
        vec![
            SampleEntry::new("hello.txt", "Hello from safe file!\n"),
            SampleEntry::new("notes/readme.md", "# Readme\nSample readme file"),
        ]
    }

    #[tokio::test]
    async fn test_new_creates_base_directory() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("nested").join("files");

        let store = LocalSandboxStore::new(&base).unwrap();

        assert!(base.is_dir());
        assert_eq!(store.base().as_path(), std::fs::canonicalize(&base).unwrap());

        // Idempotent
        LocalSandboxStore::new(&base).unwrap();
    }

    #[tokio::test]
    async fn test_seed_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path()).unwrap();

        store.seed(&samples()).await.unwrap();

        let hello = store.read("hello.txt").await.unwrap();
        assert_eq!(hello.content, "Hello from safe file!\n");
        assert_eq!(hello.path.as_path(), store.base().as_path().join("hello.txt"));

        let readme = store.read("notes/readme.md").await.unwrap();
        assert_eq!(readme.content, "# Readme\nSample readme file");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path()).unwrap();

        store.seed(&samples()).await.unwrap();
        assert!(store.exists("hello.txt").await.unwrap());

        std::fs::write(temp_dir.path().join("hello.txt"), "tampered").unwrap();

        store.seed(&samples()).await.unwrap();
        assert!(store.exists("hello.txt").await.unwrap());
        assert_eq!(
            store.read("hello.txt").await.unwrap().content,
            "Hello from safe file!\n"
        );
    }

    #[tokio::test]
    async fn test_seed_rejects_escaping_entry() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("files");
        let store = LocalSandboxStore::new(&base).unwrap();

        let result = store
            .seed(&[SampleEntry::new("../escaped.txt", "nope")])
            .await;

        assert!(matches!(result, Err(SandboxError::InvalidSeed(_))));
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_seed_with_escaping_entry_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("files");
        let store = LocalSandboxStore::new(&base).unwrap();

        let result = store
            .seed(&[
                SampleEntry::new("hello.txt", "Hello from safe file!\n"),
                SampleEntry::new("notes/readme.md", "# Readme"),
                SampleEntry::new("../escaped.txt", "nope"),
            ])
            .await;

        assert!(matches!(result, Err(SandboxError::InvalidSeed(_))));
        assert!(!base.join("hello.txt").exists());
        assert!(!base.join("notes").exists());
        assert!(!temp_dir.path().join("escaped.txt").exists());
    }

    #[tokio::test]
    async fn test_traversal_is_rejected_before_io() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("files");
        let store = LocalSandboxStore::new(&base).unwrap();
        std::fs::write(temp_dir.path().join("secret.txt"), "top secret").unwrap();

        assert!(matches!(
            store.read("../secret.txt").await,
            Err(SandboxError::PathTraversal)
        ));
        assert!(matches!(
            store.exists("../secret.txt").await,
            Err(SandboxError::PathTraversal)
        ));
        assert!(matches!(
            store.read("%2e%2e%2fsecret.txt").await,
            Err(SandboxError::PathTraversal)
        ));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path()).unwrap();

        assert!(!store.exists("missing.txt").await.unwrap());
        match store.read("missing.txt").await {
            Err(SandboxError::FileNotFound(path)) => {
                assert_eq!(path, store.base().as_path().join("missing.txt"));
            }
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path()).unwrap();
        store.seed(&samples()).await.unwrap();

        assert!(store.exists("notes").await.unwrap());
        assert!(matches!(
            store.read("notes").await,
            Err(SandboxError::FileNotFound(_))
        ));
        assert!(matches!(store.read("").await, Err(SandboxError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path()).unwrap();
        std::fs::write(temp_dir.path().join("binary.bin"), [0xff, 0xfe, 0x00]).unwrap();

        assert!(matches!(
            store.read("binary.bin").await,
            Err(SandboxError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_max_path_len_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = StorageConfig {
            base_dir: temp_dir.path().to_path_buf(),
            resolve_symlinks: false,
            max_path_len: 8,
        };
        let store = LocalSandboxStore::from_config(&config).unwrap();

        assert!(matches!(
            store.exists("a-rather-long-name.txt").await,
            Err(SandboxError::PathTraversal)
        ));
        assert!(!store.exists("a.txt").await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_escape() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().join("files");
        std::fs::create_dir_all(&base).unwrap();
        std::fs::write(temp_dir.path().join("secret.txt"), "top secret").unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("secret.txt"), base.join("link.txt"))
            .unwrap();

        // Lexical containment alone follows the link.
        let lexical = LocalSandboxStore::new(&base).unwrap();
        assert_eq!(lexical.read("link.txt").await.unwrap().content, "top secret");

        let hardened = LocalSandboxStore::new(&base)
            .unwrap()
            .with_symlink_resolution(true);
        assert!(matches!(
            hardened.read("link.txt").await,
            Err(SandboxError::PathTraversal)
        ));
        assert!(!hardened.exists("missing.txt").await.unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_inside_sandbox_is_allowed() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalSandboxStore::new(temp_dir.path())
            .unwrap()
            .with_symlink_resolution(true);
        store.seed(&samples()).await.unwrap();
        std::os::unix::fs::symlink(
            store.base().as_path().join("hello.txt"),
            store.base().as_path().join("alias.txt"),
        )
        .unwrap();

        let content = store.read("alias.txt").await.unwrap();
        assert_eq!(content.content, "Hello from safe file!\n");
    }
}
