//! Configuration loading
//!
//! Two tiers:
//! 1. **TOML bootstrap** (`TomlConfig`): listen address, logging, auth mode,
//!    summary layout. Read once at startup.
//! 2. **Backend folder**: where the project registry and the per-project
//!    summary files live.
//!
//! # Backend folder priority
//!
//! 1. Command-line argument (`--backend-folder`)
//! 2. Environment variable (`CURATE_BACKEND_FOLDER`)
//! 3. TOML `backend_folder`
//! 4. OS default (`<local data dir>/ichor-curate`)
//!
//! A missing TOML file is not an error: a warning is logged and built-in
//! defaults apply.

use crate::fs_util::write_atomic;
use crate::registry::ProjectRegistry;
use crate::summary::SummaryFormat;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Directory name used under the OS config and data directories
pub const APP_DIR_NAME: &str = "ichor-curate";

/// Environment variable overriding the backend folder
pub const BACKEND_FOLDER_ENV: &str = "CURATE_BACKEND_FOLDER";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Backend folder holding the project registry (optional)
    #[serde(default)]
    pub backend_folder: Option<PathBuf>,

    /// Listen address
    ///
    /// Default: 127.0.0.1
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    ///
    /// Default: 5731
    #[serde(default = "default_port")]
    pub port: u16,

    /// Minutes without a request before a reviewer session is dropped
    ///
    /// Default: 480
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub summary: SummaryConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            backend_folder: None,
            host: default_host(),
            port: default_port(),
            session_idle_minutes: default_session_idle_minutes(),
            logging: LoggingConfig::default(),
            auth: AuthConfig::default(),
            summary: SummaryConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// How reviewers are authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Any non-empty username is accepted
    #[default]
    Open,
    /// Username/password pairs from `[auth.users]`
    Static,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub mode: AuthMode,

    /// username → password, used in `static` mode
    #[serde(default)]
    pub users: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SummaryConfig {
    /// Write the `Curation Timestamp` column
    #[serde(default)]
    pub include_timestamp: bool,
}

impl SummaryConfig {
    pub fn format(&self) -> SummaryFormat {
        SummaryFormat {
            include_timestamp: self.include_timestamp,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5731
}

fn default_session_idle_minutes() -> u64 {
    480
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `<user config dir>/ichor-curate/config.toml`, if the platform has a config dir
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join("config.toml"))
}

/// OS default backend folder: `<local data dir>/ichor-curate`
pub fn default_backend_folder() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

/// Load bootstrap configuration
///
/// A missing file yields [`TomlConfig::default`] with a warning. A file
/// that exists but does not parse is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(
                "Config file {} not found, using built-in defaults",
                path.display()
            );
            return Ok(TomlConfig::default());
        }
        Err(e) => return Err(e.into()),
    };

    let config: TomlConfig = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Write bootstrap configuration atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    write_atomic(path, content.as_bytes())?;
    debug!("Wrote configuration to {}", path.display());
    Ok(())
}

/// Resolves the backend folder from its sources in priority order
#[derive(Debug, Clone, Default)]
pub struct BackendFolderResolver {
    cli_arg: Option<PathBuf>,
    config_value: Option<PathBuf>,
}

impl BackendFolderResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value given on the command line
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Value from the TOML config
    pub fn with_config(mut self, config: &TomlConfig) -> Self {
        self.config_value = config.backend_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            info!("Backend folder from command line: {}", path.display());
            return path.clone();
        }

        if let Some(path) = std::env::var_os(BACKEND_FOLDER_ENV).filter(|v| !v.is_empty()) {
            let path = PathBuf::from(path);
            info!(
                "Backend folder from {}: {}",
                BACKEND_FOLDER_ENV,
                path.display()
            );
            return path;
        }

        if let Some(path) = &self.config_value {
            info!("Backend folder from config file: {}", path.display());
            return path.clone();
        }

        let path = default_backend_folder();
        info!("Backend folder (default): {}", path.display());
        path
    }
}

/// Creates the backend folder and its registry on first use
#[derive(Debug, Clone)]
pub struct BackendFolderInitializer {
    backend: PathBuf,
}

impl BackendFolderInitializer {
    pub fn new(backend: PathBuf) -> Self {
        Self { backend }
    }

    pub fn registry_path(&self) -> PathBuf {
        ProjectRegistry::registry_path(&self.backend)
    }

    pub fn registry_exists(&self) -> bool {
        self.registry_path().is_file()
    }

    /// Create the backend folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.backend.is_dir() {
            fs::create_dir_all(&self.backend)?;
            info!("Created backend folder {}", self.backend.display());
        }
        Ok(())
    }

    /// Ensure the folder and an (empty, if new) registry exist
    pub fn initialize(&self) -> Result<ProjectRegistry> {
        self.ensure_directory_exists()?;
        ProjectRegistry::initialize(&self.backend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TomlConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 5731);
        assert_eq!(config.session_idle_minutes, 480);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.mode, AuthMode::Open);
        assert!(!config.summary.include_timestamp);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 6000
            [auth]
            mode = "static"
            [auth.users]
            alice = "pw"
        "#,
        )
        .unwrap();

        assert_eq!(config.port, 6000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.auth.mode, AuthMode::Static);
        assert_eq!(config.auth.users.get("alice").map(String::as_str), Some("pw"));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_summary_format_from_config() {
        let summary = SummaryConfig {
            include_timestamp: true,
        };
        assert!(summary.format().include_timestamp);
    }
}
