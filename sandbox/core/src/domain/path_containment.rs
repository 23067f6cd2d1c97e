// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Path Containment Domain Service
//!
//! Resolves untrusted, client-supplied file names against a fixed base
//! directory. A successful resolution yields a [`ResolvedPath`] that is either
//! the base directory itself or lies strictly beneath it; everything else is
//! [`Rejected`].
//!
//! This is a domain service (not infrastructure) because containment is the
//! core security rule of the sandbox. It performs no I/O.
//!
//! # Architecture
//!
//! - **Layer:** Domain Layer
//! - **Purpose:** Canonicalize raw input and enforce the base-directory boundary
//!
//! # Security Guarantees
//! - Percent-encoded input is decoded once, best effort (`%2e%2e%2f` is `../`)
//! - Null bytes, raw or encoded, are rejected
//! - Absolute inputs and drive/UNC prefixes are rejected, never substituted
//! - `.` and `..` are normalized over the whole joined path before the
//!   boundary check, so `../files/x` is judged by where it lands
//! - `\` is a separator on every platform
//! - The final boundary check is component-wise, so `/files-secret` is never
//!   accepted for base `/files`
//!
//! Symlinks inside the base directory are not followed here; see
//! `LocalSandboxStore::with_symlink_resolution` for the filesystem-backed re-check.

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Default maximum accepted input length in bytes.
pub const DEFAULT_MAX_PATH_LEN: usize = 4096;

/// Outcome of a failed resolution.
///
/// Deliberately opaque: decoding failures, null bytes, absolute inputs and
/// boundary violations all collapse into this one value so callers cannot
/// probe which check tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Path traversal detected")]
pub struct Rejected;

/// Errors constructing a [`BaseDirectory`]
#[derive(Debug, Error)]
pub enum BaseDirectoryError {
    #[error("Base directory must be absolute: {0}")]
    NotAbsolute(PathBuf),

    #[error("Base directory must be canonical (no '.' or '..' segments): {0}")]
    NotCanonical(PathBuf),
}

/// Canonical, absolute root of the sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseDirectory(PathBuf);

impl BaseDirectory {
    /// Wrap a path that is already absolute and free of relative segments.
    ///
    /// The filesystem is not consulted; callers that need symlink-free roots
    /// canonicalize first (the local store does).
    pub fn from_canonical(path: impl Into<PathBuf>) -> Result<Self, BaseDirectoryError> {
        let path = path.into();

        if !path.is_absolute() {
            return Err(BaseDirectoryError::NotAbsolute(path));
        }

        let relative_segment = path
            .components()
            .any(|c| matches!(c, Component::CurDir | Component::ParentDir));
        if relative_segment {
            return Err(BaseDirectoryError::NotCanonical(path));
        }

        // Re-collect to drop trailing and repeated separators.
        Ok(Self(path.components().collect()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// True when `candidate` equals the base or lies beneath it.
    pub fn contains(&self, candidate: &Path) -> bool {
        is_contained(&self.0, candidate)
    }
}

impl AsRef<Path> for BaseDirectory {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for BaseDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// A path proven to lie inside a [`BaseDirectory`].
///
/// Only [`PathContainment`] can construct one, so holding a `ResolvedPath` is
/// proof the containment check ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath(PathBuf);

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }
}

impl AsRef<Path> for ResolvedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Internal rejection cause. Logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RejectReason {
    TooLong,
    NullByte,
    Absolute,
    InvalidSegment,
    OutsideBoundary,
}

impl RejectReason {
    fn as_str(self) -> &'static str {
        match self {
            RejectReason::TooLong => "too_long",
            RejectReason::NullByte => "null_byte",
            RejectReason::Absolute => "absolute",
            RejectReason::InvalidSegment => "invalid_segment",
            RejectReason::OutsideBoundary => "outside_boundary",
        }
    }
}

/// Path containment domain service
#[derive(Debug, Clone)]
pub struct PathContainment {
    /// Maximum accepted raw input length in bytes (default: 4096)
    max_path_len: usize,
}

impl PathContainment {
    pub fn new() -> Self {
        Self {
            max_path_len: DEFAULT_MAX_PATH_LEN,
        }
    }

    /// Create a resolver with a custom input length limit
    pub fn with_max_length(max_path_len: usize) -> Self {
        Self { max_path_len }
    }

    pub fn max_path_len(&self) -> usize {
        self.max_path_len
    }

    /// Resolve an untrusted input against `base`
    ///
    /// # Examples
    /// ```
    /// use pathguard_core::domain::path_containment::{BaseDirectory, PathContainment};
    /// use std::path::Path;
    ///
    /// let base = BaseDirectory::from_canonical("/srv/files").unwrap();
    /// let containment = PathContainment::new();
    ///
    /// let ok = containment.resolve(&base, "notes/readme.md").unwrap();
    /// assert_eq!(ok.as_path(), Path::new("/srv/files/notes/readme.md"));
    ///
    /// assert!(containment.resolve(&base, "../../etc/passwd").is_err());
    /// assert!(containment.resolve(&base, "%2e%2e%2fsecret").is_err());
    /// ```
    pub fn resolve(&self, base: &BaseDirectory, raw: &str) -> Result<ResolvedPath, Rejected> {
        self.try_resolve(base, raw).map_err(|reason| {
            tracing::warn!(
                input = %raw.escape_debug(),
                reason = reason.as_str(),
                "Path traversal attempt rejected"
            );
            Rejected
        })
    }

    /// Join a trusted, service-owned relative path onto `base`.
    ///
    /// No percent-decoding is applied, but normalization and the boundary
    /// check are identical to [`PathContainment::resolve`], so even trusted
    /// callers cannot write outside the sandbox.
    pub fn join_trusted(&self, base: &BaseDirectory, relative: &str) -> Result<ResolvedPath, Rejected> {
        contain(base, relative).map_err(|reason| {
            tracing::error!(
                path = %relative,
                reason = reason.as_str(),
                "Trusted path escapes the base directory"
            );
            Rejected
        })
    }

    fn try_resolve(&self, base: &BaseDirectory, raw: &str) -> Result<ResolvedPath, RejectReason> {
        if raw.len() > self.max_path_len {
            return Err(RejectReason::TooLong);
        }

        let decoded = decode_lenient(raw);

        if decoded.contains('\0') {
            return Err(RejectReason::NullByte);
        }

        contain(base, &decoded)
    }
}

impl Default for PathContainment {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve `raw` against `base` with default settings.
pub fn resolve(base: &BaseDirectory, raw: &str) -> Result<ResolvedPath, Rejected> {
    PathContainment::new().resolve(base, raw)
}

/// Component-wise containment: `candidate == base` or `candidate` starts with
/// `base` followed by a separator. A shared string prefix is not enough.
pub fn is_contained(base: &Path, candidate: &Path) -> bool {
    let mut base_components = base.components();
    let mut candidate_components = candidate.components();

    loop {
        match (base_components.next(), candidate_components.next()) {
            (None, None) => return true,
            (None, Some(Component::Normal(_))) => return true,
            (None, Some(_)) => return false,
            (Some(_), None) => return false,
            (Some(b), Some(c)) if b == c => continue,
            (Some(_), Some(_)) => return false,
        }
    }
}

/// Percent-decode once. Malformed escapes or non-UTF-8 results fall back to
/// the original string.
fn decode_lenient(raw: &str) -> Cow<'_, str> {
    if !raw.contains('%') || has_malformed_escape(raw) {
        return Cow::Borrowed(raw);
    }

    match percent_decode_str(raw).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(raw),
    }
}

fn has_malformed_escape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }

        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(hi), Some(lo)) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
            _ => return true,
        }
    }

    false
}

fn contain(base: &BaseDirectory, input: &str) -> Result<ResolvedPath, RejectReason> {
    if input.starts_with('/') || input.starts_with('\\') {
        return Err(RejectReason::Absolute);
    }

    let mut candidate = base.as_path().to_path_buf();
    let mut first_segment = true;
    for segment in input.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                // Popping at the filesystem root leaves the root in place.
                candidate.pop();
            }
            normal => {
                // A segment the platform would parse as anything other than a
                // plain name (`C:` on Windows, for instance) is refused.
                let mut components = Path::new(normal).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => candidate.push(normal),
                    (Some(Component::Prefix(_)), _) if first_segment => {
                        return Err(RejectReason::Absolute)
                    }
                    _ => return Err(RejectReason::InvalidSegment),
                }
            }
        }
        if !segment.is_empty() {
            first_segment = false;
        }
    }

    if !base.contains(&candidate) {
        return Err(RejectReason::OutsideBoundary);
    }

    Ok(ResolvedPath(candidate))
}
