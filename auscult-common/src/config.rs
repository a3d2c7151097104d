//! Configuration loading and config file resolution
//!
//! The TOML file is optional. Resolution order for the file itself:
//! 1. Explicit path (command-line argument or its environment variable)
//! 2. OS-dependent default location, if a file exists there
//! 3. No file: compiled defaults

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP bind address
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5730;

/// Default multipart field carrying the audio upload
pub const DEFAULT_FIELD_NAME: &str = "file";

/// Default upload size limit (25 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Default tracing filter directive
pub const DEFAULT_LOG_FILTER: &str = "auscult_api=info,tower_http=info";

/// Top-level TOML configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    /// HTTP bind address
    pub host: Option<String>,
    /// HTTP port
    pub port: Option<u16>,
    /// Named model artifacts, loaded once at startup
    pub models: BTreeMap<String, ModelEntry>,
    /// Which named model each prediction endpoint uses
    pub bindings: BindingsConfig,
    /// Multipart upload handling
    pub upload: UploadConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        let mut models = BTreeMap::new();
        models.insert(
            "cough".to_string(),
            ModelEntry {
                path: PathBuf::from("models/cough.onnx"),
            },
        );
        models.insert(
            "breath".to_string(),
            ModelEntry {
                path: PathBuf::from("models/breath.onnx"),
            },
        );

        Self {
            host: None,
            port: None,
            models,
            bindings: BindingsConfig::default(),
            upload: UploadConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// One model artifact on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEntry {
    /// Path to the serialized model graph
    pub path: PathBuf,
}

/// Endpoint → model name bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingsConfig {
    pub cough: String,
    pub breath: String,
}

impl Default for BindingsConfig {
    fn default() -> Self {
        Self {
            cough: "cough".to_string(),
            breath: "breath".to_string(),
        }
    }
}

/// Multipart upload handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Form field name of the audio file part
    pub field_name: String,
    /// Maximum accepted request body size in bytes
    pub max_upload_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            field_name: DEFAULT_FIELD_NAME.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Pick the config file to load
///
/// An explicit path always wins (and must exist when loaded). Otherwise the
/// platform default is used only if a file is actually present there.
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    default_config_path().filter(|path| path.exists())
}

/// Get the platform default configuration file path
///
/// Linux checks `~/.config/auscult/config.toml`, then `/etc/auscult/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("auscult").join("config.toml"));

    if cfg!(target_os = "linux") {
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        let system_config = PathBuf::from("/etc/auscult/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    user_config
}

/// Load and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let config: TomlConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load the resolved config file, or compiled defaults when there is none
pub fn load_or_default(explicit: Option<&Path>) -> Result<TomlConfig> {
    match resolve_config_path(explicit) {
        Some(path) => {
            let config = load_toml_config(&path)?;
            info!("Loaded configuration from {}", path.display());
            Ok(config)
        }
        None => {
            warn!("No config file found, using compiled defaults");
            Ok(TomlConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_bind_each_endpoint_to_its_own_model() {
        let config = TomlConfig::default();
        assert_eq!(config.bindings.cough, "cough");
        assert_eq!(config.bindings.breath, "breath");
        assert!(config.models.contains_key("cough"));
        assert!(config.models.contains_key("breath"));
        assert_eq!(config.upload.field_name, "file");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TomlConfig = toml::from_str("port = 9000\n").unwrap();
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.host, None);
        assert_eq!(config.upload.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_full_toml_parses() {
        let content = r#"
            host = "0.0.0.0"
            port = 8080

            [models.resnet]
            path = "/srv/models/resnet.onnx"

            [bindings]
            cough = "resnet"
            breath = "resnet"

            [upload]
            field_name = "audio"
            max_upload_bytes = 1024
        "#;
        let config: TomlConfig = toml::from_str(content).unwrap();
        assert_eq!(config.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(config.models.len(), 1);
        assert_eq!(
            config.models["resnet"].path,
            PathBuf::from("/srv/models/resnet.onnx")
        );
        assert_eq!(config.bindings.breath, "resnet");
        assert_eq!(config.upload.field_name, "audio");
        assert_eq!(config.upload.max_upload_bytes, 1024);
    }

    #[test]
    fn test_load_toml_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = 6000").unwrap();

        let config = load_toml_config(file.path()).unwrap();
        assert_eq!(config.port, Some(6000));
    }

    #[test]
    fn test_load_toml_config_rejects_bad_syntax() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = [").unwrap();

        let result = load_toml_config(file.path());
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let result = load_or_default(Some(Path::new("/nonexistent/auscult.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Path::new("/tmp/custom.toml");
        assert_eq!(
            resolve_config_path(Some(explicit)),
            Some(PathBuf::from("/tmp/custom.toml"))
        );
    }
}
