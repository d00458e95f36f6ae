//! Configuration management for archdoc.
//!
//! Parses `archdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`]. The loaded
//! [`Config`] is handed to each handler at construction time; nothing reads
//! the environment after startup.
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `storage.region`
//! - `storage.endpoint`
//! - `diagrams.bucket`
//! - `diagrams.kroki_url`
//! - `documents.bucket`
//! - `documents.gotenberg_url`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override storage backend.
    pub storage_backend: Option<StorageBackend>,
    /// Override Kroki URL for diagram rendering.
    pub kroki_url: Option<String>,
    /// Override Gotenberg URL for PDF rendering.
    pub gotenberg_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "archdoc.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Object storage configuration.
    pub storage: StorageConfig,
    /// Diagram handler configuration.
    pub diagrams: DiagramsConfig,
    /// Document handler configuration.
    pub documents: DocumentsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Object storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Amazon S3 or an S3-compatible endpoint.
    #[default]
    S3,
    /// Local directory, for development.
    Fs,
    /// Process memory; objects vanish on restart.
    Memory,
}

impl StorageBackend {
    /// Whether the store expires objects after `retention_days` itself.
    ///
    /// S3 buckets rely on their own lifecycle rules instead.
    #[must_use]
    pub fn expires_objects(self) -> bool {
        !matches!(self, Self::S3)
    }
}

/// Object storage configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Which backend stores artifacts.
    pub backend: StorageBackend,
    /// AWS region.
    pub region: String,
    /// S3-compatible endpoint URL (`LocalStack`, `MinIO`).
    pub endpoint: Option<String>,
    /// Root directory for the `fs` backend.
    pub root: PathBuf,
    /// Days an artifact stays readable before it expires.
    pub retention_days: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            region: "us-east-1".to_owned(),
            endpoint: None,
            root: PathBuf::from(".archdoc/objects"),
            retention_days: 7,
        }
    }
}

/// Diagram handler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DiagramsConfig {
    /// Bucket that receives rendered diagrams.
    pub bucket: String,
    /// Kroki server URL.
    pub kroki_url: String,
    /// Kroki request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DiagramsConfig {
    fn default() -> Self {
        Self {
            bucket: "minigrammer-output".to_owned(),
            kroki_url: "https://kroki.io".to_owned(),
            timeout_secs: 30,
        }
    }
}

/// Document handler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Bucket that receives rendered PDF documents.
    pub bucket: String,
    /// Gotenberg server URL.
    pub gotenberg_url: String,
    /// Gotenberg request timeout in seconds.
    pub timeout_secs: u64,
    /// Title printed in the document header.
    pub title: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            bucket: "pdf-documentation-output".to_owned(),
            gotenberg_url: "http://localhost:3000".to_owned(),
            timeout_secs: 60,
            title: "Documentation".to_owned(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`diagrams.bucket`").
        field: String,
        /// Error message (e.g., "${`DIAGRAM_BUCKET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a numeric field to be positive.
fn require_positive(value: u64, field: &str) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be greater than 0"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `archdoc.toml` in current directory and parents,
    /// falling back to defaults when none is found.
    ///
    /// CLI settings are applied after loading and validated together with
    /// the file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            let mut config = Self::default();
            let cwd = std::env::current_dir().unwrap_or_default();
            config.resolve_paths(&cwd);
            config
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string without touching the filesystem.
    ///
    /// Environment variables are expanded; relative paths stay relative.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion, or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(backend) = settings.storage_backend {
            self.storage.backend = backend;
        }
        if let Some(kroki_url) = &settings.kroki_url {
            self.diagrams.kroki_url.clone_from(kroki_url);
        }
        if let Some(gotenberg_url) = &settings.gotenberg_url {
            self.documents.gotenberg_url.clone_from(gotenberg_url);
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_storage()?;
        self.validate_diagrams()?;
        self.validate_documents()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_storage(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.storage.region, "storage.region")?;
        if let Some(endpoint) = &self.storage.endpoint {
            require_http_url(endpoint, "storage.endpoint")?;
        }
        require_positive(u64::from(self.storage.retention_days), "storage.retention_days")?;
        Ok(())
    }

    fn validate_diagrams(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.diagrams.bucket, "diagrams.bucket")?;
        require_non_empty(&self.diagrams.kroki_url, "diagrams.kroki_url")?;
        require_http_url(&self.diagrams.kroki_url, "diagrams.kroki_url")?;
        require_positive(self.diagrams.timeout_secs, "diagrams.timeout_secs")?;
        Ok(())
    }

    fn validate_documents(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.documents.bucket, "documents.bucket")?;
        require_non_empty(&self.documents.gotenberg_url, "documents.gotenberg_url")?;
        require_http_url(&self.documents.gotenberg_url, "documents.gotenberg_url")?;
        require_positive(self.documents.timeout_secs, "documents.timeout_secs")?;
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        self.storage.region = expand::expand_env(&self.storage.region, "storage.region")?;
        expand::expand_opt(&mut self.storage.endpoint, "storage.endpoint")?;

        self.diagrams.bucket = expand::expand_env(&self.diagrams.bucket, "diagrams.bucket")?;
        self.diagrams.kroki_url =
            expand::expand_env(&self.diagrams.kroki_url, "diagrams.kroki_url")?;

        self.documents.bucket = expand::expand_env(&self.documents.bucket, "documents.bucket")?;
        self.documents.gotenberg_url =
            expand::expand_env(&self.documents.gotenberg_url, "documents.gotenberg_url")?;

        Ok(())
    }

    /// Resolve a relative storage root against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        if self.storage.root.is_relative() {
            self.storage.root = config_dir.join(&self.storage.root);
        }
    }
}
