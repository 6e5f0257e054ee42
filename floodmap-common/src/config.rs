//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration comes from a TOML file. Root folder priority:
//! 1. Command-line argument (highest priority)
//! 2. `FLOODMAP_ROOT_FOLDER` environment variable
//! 3. TOML config file `root_folder`
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing config file is not an error: defaults are used and a warning is
//! logged. A config file that exists but does not parse, or that describes an
//! invalid service region, fails startup.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::geo::{GeoPoint, ServiceRegion};
use crate::{Error, Result};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "FLOODMAP_ROOT_FOLDER";

/// Environment variable pointing at the TOML config file
pub const CONFIG_FILE_ENV: &str = "FLOODMAP_CONFIG";

/// Database file name inside the root folder
pub const DATABASE_FILE: &str = "floodmap.db";

/// Default HTTP port for floodmap-api
pub const DEFAULT_PORT: u16 = 5730;

/// Default NWS API base URL
pub const DEFAULT_ALERT_FEED_URL: &str = "https://api.weather.gov";

/// Compiled-in defaults used when nothing else is configured
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub port: u16,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/floodmap (or /var/lib/floodmap for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("floodmap"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/floodmap"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("floodmap"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/floodmap"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("floodmap"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\floodmap"))
    } else {
        PathBuf::from("./floodmap_data")
    }
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Service area; the compiled-in metro region when absent
    #[serde(default)]
    pub region: Option<RegionConfig>,

    #[serde(default)]
    pub alert_feed: AlertFeedConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            root_folder: None,
            port: DEFAULT_PORT,
            logging: LoggingConfig::default(),
            region: None,
            alert_feed: AlertFeedConfig::default(),
        }
    }
}

impl TomlConfig {
    /// Parse TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Validated service region
    pub fn service_region(&self) -> Result<ServiceRegion> {
        match &self.region {
            Some(region) => region.to_region(),
            None => Ok(ServiceRegion::default_region()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (stderr when not specified)
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

/// Service region boundary as `[lat, lon]` pairs
#[derive(Debug, Clone, Deserialize)]
pub struct RegionConfig {
    pub name: String,
    pub vertices: Vec<[f64; 2]>,
}

impl RegionConfig {
    pub fn to_region(&self) -> Result<ServiceRegion> {
        let vertices = self
            .vertices
            .iter()
            .map(|[lat, lon]| GeoPoint::new(*lat, *lon))
            .collect();
        ServiceRegion::new(self.name.clone(), vertices)
    }
}

/// Official alert feed client settings
#[derive(Debug, Clone, Deserialize)]
pub struct AlertFeedConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_alert_feed_url")]
    pub base_url: String,

    /// The NWS API rejects requests without a descriptive User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AlertFeedConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_alert_feed_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_alert_feed_url() -> String {
    DEFAULT_ALERT_FEED_URL.to_string()
}

fn default_user_agent() -> String {
    format!("floodmap/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

/// Default config file location for the platform
pub fn default_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
        return Some(PathBuf::from(path));
    }

    let user_config = dirs::config_dir().map(|d| d.join("floodmap").join("config.toml"));
    if cfg!(target_os = "linux") {
        // Try ~/.config/floodmap/config.toml first, then /etc/floodmap/config.toml
        if let Some(path) = &user_config {
            if path.exists() {
                return user_config;
            }
        }
        let system_config = PathBuf::from("/etc/floodmap/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    user_config
}

/// Load bootstrap configuration
///
/// An explicit path must exist. Without one, the default location is tried
/// and defaults are used if it is missing.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => match default_config_path() {
            Some(path) if path.exists() => path,
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                return Ok(TomlConfig::default());
            }
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = TomlConfig::from_toml_str(&content)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Resolves the root folder from CLI, environment, TOML and defaults
#[derive(Debug, Clone, Default)]
pub struct RootFolderResolver {
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(cli_arg: Option<PathBuf>, toml_root: Option<PathBuf>) -> Self {
        Self { cli_arg, toml_root }
    }

    pub fn resolve(&self) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_arg {
            info!("Root folder from command line: {}", path.display());
            return path.clone();
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!("Root folder from {}: {}", ROOT_FOLDER_ENV, path);
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_root {
            info!("Root folder from config file: {}", path.display());
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        let path = CompiledDefaults::for_current_platform().root_folder;
        info!("Root folder from compiled default: {}", path.display());
        path
    }
}

/// Prepares the resolved root folder for use
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
