// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Pathguard Configuration Types
//
// Defines the configuration schema for a pathguard node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Sandbox storage settings (base directory, input limits, symlink policy)
// - Network settings for the HTTP surface

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::domain::path_containment::DEFAULT_MAX_PATH_LEN;

pub const API_VERSION: &str = "pathguard.dev/v1";
pub const KIND: &str = "PathguardConfig";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathguardConfig {
    /// API version (must be "pathguard.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PathguardConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: PathguardSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable node name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathguardSpec {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Sandbox root, created on startup if absent
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Re-check containment against the real (symlink-resolved) path
    #[serde(default)]
    pub resolve_symlinks: bool,

    /// Maximum accepted file name length in bytes
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound for a single request, including filesystem I/O
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("./files")
}

fn default_max_path_len() -> usize {
    DEFAULT_MAX_PATH_LEN
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            resolve_symlinks: false,
            max_path_len: default_max_path_len(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for PathguardConfig {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "pathguard".to_string(),
                labels: None,
            },
            spec: PathguardSpec::default(),
        }
    }
}

impl PathguardConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Locations checked by [`PathguardConfig::discover_config`], in order
    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Ok(path) = std::env::var("PATHGUARD_CONFIG_PATH") {
            paths.push(PathBuf::from(path));
        }

        paths.push(PathBuf::from("./pathguard-config.yaml"));

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".pathguard").join("config.yaml"));
        }

        #[cfg(unix)]
        paths.push(PathBuf::from("/etc/pathguard/config.yaml"));
        #[cfg(windows)]
        paths.push(PathBuf::from("C:\\ProgramData\\Pathguard\\config.yaml"));

        paths
    }

    /// Discover configuration file using precedence order
    /// 1. PATHGUARD_CONFIG_PATH environment variable
    /// 2. ./pathguard-config.yaml (working directory)
    /// 3. ~/.pathguard/config.yaml (user home)
    /// 4. /etc/pathguard/config.yaml (system, Unix) or C:\ProgramData\Pathguard\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        Self::discovery_paths().into_iter().find(|p| p.exists())
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path must exist and parse
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::debug!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    ///
    /// Recognized keys: `PATHGUARD_BASE_DIR`, `PORT`, `PATHGUARD_RESOLVE_SYMLINKS`.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("PATHGUARD_BASE_DIR") {
            tracing::info!("Environment override: PATHGUARD_BASE_DIR={}", dir);
            self.spec.storage.base_dir = PathBuf::from(dir);
        }

        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Environment override: PORT={}", port);
                    self.spec.network.port = port;
                }
                Err(_) => {
                    tracing::warn!("Invalid value for PORT: '{}'. Ignoring.", port);
                }
            }
        }

        if let Some(val) = lookup("PATHGUARD_RESOLVE_SYMLINKS") {
            match val.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => {
                    tracing::info!("Environment override: PATHGUARD_RESOLVE_SYMLINKS=true");
                    self.spec.storage.resolve_symlinks = true;
                }
                "false" | "0" | "no" | "off" => {
                    tracing::info!("Environment override: PATHGUARD_RESOLVE_SYMLINKS=false");
                    self.spec.storage.resolve_symlinks = false;
                }
                _ => {
                    tracing::warn!(
                        "Invalid value for PATHGUARD_RESOLVE_SYMLINKS: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.storage.base_dir.as_os_str().is_empty() {
            anyhow::bail!("spec.storage.base_dir cannot be empty");
        }

        if self.spec.storage.max_path_len == 0 {
            anyhow::bail!("spec.storage.max_path_len must be greater than zero");
        }

        if self.spec.network.host.is_empty() {
            anyhow::bail!("spec.network.host cannot be empty");
        }

        if self.spec.network.request_timeout_secs == 0 {
            anyhow::bail!("spec.network.request_timeout_secs must be greater than zero");
        }

        Ok(())
    }
}
