//! `archdoc serve` command implementation.

use std::path::PathBuf;

use archdoc_config::{CliSettings, Config, StorageBackend};
use archdoc_server::{ServeOptions, ServiceKind, run_server};
use clap::{Args, ValueEnum};

use super::ServiceArg;
use crate::error::CliError;
use crate::output::Output;

/// Object store selection on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum StorageArg {
    /// Amazon S3 or an S3-compatible endpoint.
    S3,
    /// Local directory.
    Fs,
    /// Process memory.
    Memory,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::S3 => Self::S3,
            StorageArg::Fs => Self::Fs,
            StorageArg::Memory => Self::Memory,
        }
    }
}

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover archdoc.toml).
    #[arg(short, long, env = "ARCHDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Handlers to serve.
    #[arg(long, value_enum, default_value_t = ServiceArg::All, env = "ARCHDOC_SERVICE")]
    service: ServiceArg,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Object store backend (overrides config).
    #[arg(long, value_enum)]
    storage: Option<StorageArg>,

    /// Kroki server URL for diagram rendering (overrides config).
    #[arg(long)]
    kroki_url: Option<String>,

    /// Gotenberg server URL for PDF rendering (overrides config).
    #[arg(long)]
    gotenberg_url: Option<String>,

    /// Create missing S3 buckets before serving.
    #[arg(long)]
    create_buckets: bool,

    /// Enable verbose output (request and pipeline logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self, version: &str) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            storage_backend: self.storage.map(StorageBackend::from),
            kroki_url: self.kroki_url,
            gotenberg_url: self.gotenberg_url,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        let kind = ServiceKind::from(self.service);

        if self.create_buckets && config.storage.backend != StorageBackend::S3 {
            return Err(CliError::Validation(
                "--create-buckets requires the s3 storage backend".to_owned(),
            ));
        }

        print_startup(&output, &config, kind);

        let options = ServeOptions {
            kind,
            create_buckets: self.create_buckets,
            version: version.to_owned(),
        };
        run_server(&config, options)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}

fn print_startup(output: &Output, config: &Config, kind: ServiceKind) {
    output.highlight(&format!(
        "Starting archdoc on {}:{}",
        config.server.host, config.server.port
    ));
    if let Some(path) = &config.config_path {
        output.info(&format!("Config: {}", path.display()));
    }

    match config.storage.backend {
        StorageBackend::S3 => match &config.storage.endpoint {
            Some(endpoint) => output.info(&format!(
                "Storage: S3 ({}, endpoint {endpoint})",
                config.storage.region
            )),
            None => output.info(&format!("Storage: S3 ({})", config.storage.region)),
        },
        StorageBackend::Fs => output.info(&format!(
            "Storage: filesystem ({})",
            config.storage.root.display()
        )),
        StorageBackend::Memory => output.info("Storage: memory (artifacts are lost on restart)"),
    }
    output.info(&retention_line(config));

    if kind.includes_diagrams() {
        output.info(&format!(
            "Diagrams: bucket {}, Kroki {}",
            config.diagrams.bucket, config.diagrams.kroki_url
        ));
    }
    if kind.includes_documents() {
        output.info(&format!(
            "Documents: bucket {}, Gotenberg {}",
            config.documents.bucket, config.documents.gotenberg_url
        ));
    }
}

fn retention_line(config: &Config) -> String {
    if config.storage.backend.expires_objects() {
        format!("Retention: {} days", config.storage.retention_days)
    } else {
        format!(
            "Retention: bucket lifecycle rules (retention_days = {} is not applied to S3)",
            config.storage.retention_days
        )
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        serve: ServeArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["archdoc"]).unwrap();

        assert_eq!(cli.serve.service, ServiceArg::All);
        assert_eq!(cli.serve.storage, None);
        assert!(!cli.serve.create_buckets);
    }

    #[test]
    fn test_overrides() {
        let cli = TestCli::try_parse_from([
            "archdoc",
            "--service",
            "document",
            "--storage",
            "fs",
            "--port",
            "9000",
            "--gotenberg-url",
            "http://gotenberg:3000",
        ])
        .unwrap();

        assert_eq!(cli.serve.service, ServiceArg::Document);
        assert_eq!(cli.serve.storage.map(StorageBackend::from), Some(StorageBackend::Fs));
        assert_eq!(cli.serve.port, Some(9000));
        assert_eq!(cli.serve.gotenberg_url.as_deref(), Some("http://gotenberg:3000"));
    }

    #[test]
    fn test_retention_line_per_backend() {
        let mut config = Config::from_toml_str("[storage]\nbackend = \"fs\"\nretention_days = 3\n").unwrap();
        assert_eq!(retention_line(&config), "Retention: 3 days");

        config.storage.backend = StorageBackend::S3;
        assert_eq!(
            retention_line(&config),
            "Retention: bucket lifecycle rules (retention_days = 3 is not applied to S3)"
        );
    }

    #[test]
    fn test_rejects_unknown_service() {
        assert!(TestCli::try_parse_from(["archdoc", "--service", "pricing"]).is_err());
    }
}
