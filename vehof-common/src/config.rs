//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VEHOF_ROOT_FOLDER`)
//! 3. TOML config file (`root_folder`)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file is never fatal: defaults are used and a
//! warning is handed back for logging.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "VEHOF_ROOT_FOLDER";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "vehof.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder holding the database (and, by default, the archive)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub explorer: ExplorerConfig,
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

/// Archive source configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveConfig {
    /// `http(s)://` URL, absolute path, or path relative to the root folder
    #[serde(default = "default_archive_source")]
    pub source: String,

    /// Rows written per catalog upsert transaction
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            source: default_archive_source(),
            batch_size: default_batch_size(),
        }
    }
}

/// Explorer (HTTP + interactive session) configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Items added to the visible window per "show more"
    #[serde(default = "default_page_increment")]
    pub page_increment: usize,

    /// Free-text debounce delay
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            page_increment: default_page_increment(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_archive_source() -> String {
    "archive.csv".to_string()
}

fn default_batch_size() -> usize {
    500
}

fn default_port() -> u16 {
    5790
}

fn default_page_increment() -> usize {
    60
}

fn default_debounce_ms() -> u64 {
    140
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/vehof
        dirs::data_local_dir()
            .map(|d| d.join("vehof"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/vehof"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/vehof
        dirs::data_dir()
            .map(|d| d.join("vehof"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/vehof"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\vehof
        dirs::data_local_dir()
            .map(|d| d.join("vehof"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\vehof"))
    } else {
        PathBuf::from("./vehof_data")
    }
}

/// Default TOML location: `<config_dir>/vehof/vehof.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("vehof").join("vehof.toml"))
}

/// Outcome of loading the TOML configuration
///
/// Loading runs before logging is initialized, so problems are returned as
/// `warning` for the caller to log once tracing is up.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLoad {
    pub config: TomlConfig,
    /// File the configuration came from, if any
    pub path: Option<PathBuf>,
    pub warning: Option<String>,
}

impl ConfigLoad {
    fn defaults(warning: Option<String>) -> Self {
        Self {
            config: TomlConfig::default(),
            path: None,
            warning,
        }
    }

    /// Log where the configuration came from (call after tracing init)
    pub fn log(&self) {
        if let Some(warning) = &self.warning {
            warn!("{} (using defaults)", warning);
        }
        match &self.path {
            Some(path) => info!("Loaded configuration from {}", path.display()),
            None => info!("Using default configuration"),
        }
    }
}

/// Load TOML configuration with graceful degradation
///
/// An explicit path that is missing, or any file that does not parse,
/// yields defaults plus a warning. A missing default file is silent.
pub fn load_toml_config(explicit_path: Option<&Path>) -> ConfigLoad {
    let path = match explicit_path.map(Path::to_path_buf).or_else(default_config_path) {
        Some(path) => path,
        None => {
            return ConfigLoad::defaults(Some("Could not determine config directory".to_string()))
        }
    };

    if !path.exists() {
        let warning = explicit_path
            .is_some()
            .then(|| format!("Config file not found: {}", path.display()));
        return ConfigLoad::defaults(warning);
    }

    match read_toml_config(&path) {
        Ok(config) => ConfigLoad {
            config,
            path: Some(path),
            warning: None,
        },
        Err(e) => ConfigLoad::defaults(Some(e.to_string())),
    }
}

/// Read and parse one TOML file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_config: &TomlConfig) -> Self {
        Self {
            cli_arg,
            toml_root: toml_config.root_folder.clone(),
        }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("Root folder: {} (command line)", path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder: {} ({})", path, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            info!("Root folder: {} (config file)", path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let path = get_default_root_folder();
        info!("Root folder: {} (default)", path.display());
        path
    }
}

/// Creates the root folder and derives paths inside it
#[derive(Debug, Clone)]
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }
}
