// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sandbox Store Infrastructure Module
//!
//! Concrete implementations of the [`SandboxStore`] trait.

pub mod local;

pub use local::LocalSandboxStore;

pub use mock::MockSandboxStore;

mod mock {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use crate::domain::path_containment::{BaseDirectory, PathContainment};
    use crate::domain::storage::{FileContent, SampleEntry, SandboxError, SandboxStore};

    /// In-memory store for unit testing callers of [`SandboxStore`].
    ///
    /// Inputs are still resolved through [`PathContainment`], so rejection
    /// behaves exactly like the local store. `failing()` simulates a disk
    /// that errors on every read.
    pub struct MockSandboxStore {
        base: BaseDirectory,
        containment: PathContainment,
        pub files: Mutex<HashMap<PathBuf, String>>,
        fail_reads: bool,
    }

    impl MockSandboxStore {
        pub fn new(base: BaseDirectory) -> Self {
            Self {
                base,
                containment: PathContainment::new(),
                files: Mutex::new(HashMap::new()),
                fail_reads: false,
            }
        }

        pub fn failing(base: BaseDirectory) -> Self {
            Self {
                fail_reads: true,
                ..Self::new(base)
            }
        }
    }

    #[async_trait]
    impl SandboxStore for MockSandboxStore {
        fn base(&self) -> &BaseDirectory {
            &self.base
        }

        async fn exists(&self, raw: &str) -> Result<bool, SandboxError> {
            let path = self.containment.resolve(&self.base, raw)?;
            let files = self.files.lock();
            Ok(path.as_path() == self.base.as_path()
                || files.keys().any(|p| p.starts_with(path.as_path())))
        }

        async fn read(&self, raw: &str) -> Result<FileContent, SandboxError> {
            let path = self.containment.resolve(&self.base, raw)?;

            if self.fail_reads {
                return Err(SandboxError::IoError(format!("simulated failure reading {}", path)));
            }

            let content = self.files.lock().get(path.as_path()).cloned();
            match content {
                Some(content) => Ok(FileContent { path, content }),
                None => Err(SandboxError::FileNotFound(path.into_path_buf())),
            }
        }

        async fn seed(&self, entries: &[SampleEntry]) -> Result<(), SandboxError> {
            let planned = entries
                .iter()
                .map(|entry| {
                    self.containment
                        .join_trusted(&self.base, &entry.relative_path)
                        .map(|path| (path.into_path_buf(), entry.content.clone()))
                        .map_err(|_| SandboxError::InvalidSeed(entry.relative_path.clone()))
                })
                .collect::<Result<Vec<_>, _>>()?;

            self.files.lock().extend(planned);
            Ok(())
        }
    }
}
