//! Service configuration for auscult-api
//!
//! **Priority:** command line → environment → TOML file → compiled defaults
//!
//! clap covers the first two tiers (`env = ...` on each argument); the TOML
//! file and defaults come from `auscult_common::config`.

use std::collections::BTreeMap;
use std::path::PathBuf;

use auscult_common::config::{
    load_or_default, resolve_config_path, BindingsConfig, LoggingConfig, ModelEntry, TomlConfig,
    UploadConfig, DEFAULT_HOST, DEFAULT_PORT,
};
use auscult_common::{Error, Result};
use clap::Parser;

/// Command-line arguments for auscult-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "auscult-api")]
#[command(about = "Cough and breath sound classification service")]
#[command(version)]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "AUSCULT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "AUSCULT_PORT")]
    pub port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long, env = "AUSCULT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub models: BTreeMap<String, ModelEntry>,
    pub bindings: BindingsConfig,
    pub upload: UploadConfig,
    pub logging: LoggingConfig,
    /// Config file the TOML tier was read from, if any
    pub config_path: Option<PathBuf>,
}

impl ServiceConfig {
    /// Resolve and read the config file, then merge with `cli`
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = resolve_config_path(cli.config.as_deref());
        let toml_config = load_or_default(config_path.as_deref())?;

        let mut config = Self::merge(cli, toml_config)?;
        config.config_path = config_path;
        Ok(config)
    }

    /// Merge command-line/environment values over a parsed TOML config
    pub fn merge(cli: &Cli, toml_config: TomlConfig) -> Result<Self> {
        let host = cli
            .host
            .clone()
            .or(toml_config.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);

        let config = Self {
            host,
            port,
            models: toml_config.models,
            bindings: toml_config.bindings,
            upload: toml_config.upload,
            logging: toml_config.logging,
            config_path: None,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(Error::Config("no models configured".to_string()));
        }
        if self.upload.field_name.trim().is_empty() {
            return Err(Error::Config("upload.field_name must not be empty".to_string()));
        }
        if self.upload.max_upload_bytes == 0 {
            return Err(Error::Config("upload.max_upload_bytes must be positive".to_string()));
        }
        Ok(())
    }

    /// `host:port` for the TCP listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
