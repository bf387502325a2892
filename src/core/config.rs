//! Configuration module for the photo export tool
//!
//! Supports loading configuration from a TOML file.
//! Configuration is stored in a standard location:
//! - Windows: %APPDATA%\photo_export_tool\config.toml
//! - Linux: ~/.config/photo_export_tool/config.toml
//! - macOS: ~/Library/Application Support/photo_export_tool/config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for config directory
const APP_NAME: &str = "photo_export_tool";

/// Default config file name
const CONFIG_FILE_NAME: &str = "config.toml";

/// Get the standard configuration directory for the application.
pub fn get_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME))
}

/// Get the standard configuration file path.
///
/// Returns the full path to the config file in the standard location.
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

/// Ensure the configuration directory exists.
///
/// Creates the directory and all parent directories if they don't exist.
pub fn ensure_config_dir() -> Result<PathBuf, ConfigError> {
    let config_dir = get_config_dir().ok_or(ConfigError::ConfigDirNotFound)?;

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .map_err(|e| ConfigError::WriteError(config_dir.clone(), e.to_string()))?;
    }

    Ok(config_dir)
}

/// Initialize the configuration file if it doesn't exist.
///
/// Creates the config directory and copies the default config template.
/// Returns the path to the config file.
pub fn init_config() -> Result<PathBuf, ConfigError> {
    let config_dir = ensure_config_dir()?;
    let config_path = config_dir.join(CONFIG_FILE_NAME);

    if !config_path.exists() {
        let default_config = Config::generate_default_config();
        fs::write(&config_path, default_config)
            .map_err(|e| ConfigError::WriteError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// Open the configuration file in the default application.
pub fn open_config_in_editor() -> Result<PathBuf, ConfigError> {
    // Ensure config exists first
    let config_path = init_config()?;

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", config_path.to_str().unwrap_or("")])
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&config_path)
            .spawn()
            .map_err(|e| ConfigError::OpenError(config_path.clone(), e.to_string()))?;
    }

    Ok(config_path)
}

/// How a resolved source file is placed into the destination
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LinkAction {
    /// Copy the file contents
    #[default]
    Copy,
    /// Create a symbolic link to the source
    Symlink,
    /// Create a hard link to the source
    Hardlink,
}

impl LinkAction {
    /// Parse a CLI value ("copy", "symlink", "hardlink")
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "copy" => Some(LinkAction::Copy),
            "symlink" => Some(LinkAction::Symlink),
            "hardlink" => Some(LinkAction::Hardlink),
            _ => None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Source library settings
    pub library: LibraryConfig,

    /// Destination settings
    pub output: OutputConfig,

    /// Export selection settings
    pub export: ExportConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Source library configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Path to the photo library bundle (empty = must be given on the
    /// command line)
    pub root: PathBuf,
}

/// Destination directory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Destination directory; one subdirectory is created per album
    pub directory: PathBuf,

    /// How files are placed: copy, symlink or hardlink
    pub link_action: LinkAction,

    /// Skip destination files that already exist with matching size
    pub skip_existing: bool,

    /// Byte-compare existing files (SHA-256) instead of trusting size alone
    pub verify_contents: bool,
}

/// Export selection configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Always export the original capture, ignoring edited renditions
    pub masters_only: bool,

    /// Only export albums whose name starts with this prefix (empty = all)
    pub album_prefix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log to file
    pub log_to_file: bool,

    /// Log file path
    pub log_file: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::new(), // Empty = must be given on the CLI
            link_action: LinkAction::Copy,
            skip_existing: true,
            verify_contents: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
            log_file: PathBuf::from("./photo_export.log"),
        }
    }
}

impl ExportConfig {
    /// The album prefix as an optional filter (empty string = no filter).
    pub fn album_prefix_filter(&self) -> Option<&str> {
        if self.album_prefix.is_empty() {
            None
        } else {
            Some(self.album_prefix.as_str())
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./config.toml (current directory - for development/override)
    /// 2. ./photo_export.toml (current directory - alternative name)
    /// 3. Standard config location
    ///
    /// If no config file is found, returns default configuration.
    pub fn load_default() -> Result<Self, ConfigError> {
        let local_paths = [
            PathBuf::from("./config.toml"),
            PathBuf::from("./photo_export.toml"),
        ];

        for path in &local_paths {
            if path.exists() {
                return Self::load(path);
            }
        }

        if let Some(config_path) = get_config_path() {
            if config_path.exists() {
                return Self::load(&config_path);
            }
        }

        Ok(Self::default())
    }

    /// Get the path where the config file is (or would be) located.
    ///
    /// Returns the first existing config file path, or the standard location
    /// if none exists.
    pub fn get_active_config_path() -> PathBuf {
        let local_paths = [
            PathBuf::from("./config.toml"),
            PathBuf::from("./photo_export.toml"),
        ];

        for path in &local_paths {
            if path.exists() {
                return path.clone();
            }
        }

        get_config_path().unwrap_or_else(|| PathBuf::from("./config.toml"))
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::WriteError(path.as_ref().to_path_buf(), e.to_string()))?;

        Ok(())
    }

    /// Generate a default config file with comments
    /// This uses the example config file to ensure it stays up to date
    pub fn generate_default_config() -> String {
        include_str!("../../config.example.toml").to_string()
    }
}

/// Configuration error types
#[derive(Debug)]
pub enum ConfigError {
    /// Configuration file was not found at the specified path
    FileNotFound(PathBuf),
    /// Failed to read the configuration file
    ReadError(PathBuf, String),
    /// Failed to parse the configuration file (invalid TOML)
    ParseError(PathBuf, String),
    /// Failed to serialize configuration to TOML
    SerializeError(String),
    /// Failed to write configuration file
    WriteError(PathBuf, String),
    /// Could not determine config directory
    ConfigDirNotFound,
    /// Failed to open config file in editor
    OpenError(PathBuf, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ReadError(path, err) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), err)
            }
            ConfigError::ParseError(path, err) => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::SerializeError(err) => {
                write!(f, "Failed to serialize configuration: {}", err)
            }
            ConfigError::WriteError(path, err) => {
                write!(
                    f,
                    "Failed to write config file '{}': {}",
                    path.display(),
                    err
                )
            }
            ConfigError::ConfigDirNotFound => {
                write!(f, "Could not determine configuration directory")
            }
            ConfigError::OpenError(path, err) => {
                write!(
                    f,
                    "Failed to open config file '{}': {}",
                    path.display(),
                    err
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.library.root.as_os_str().is_empty());
        assert_eq!(config.output.link_action, LinkAction::Copy);
        assert!(config.output.skip_existing);
        assert!(!config.output.verify_contents);
        assert!(!config.export.masters_only);
        assert_eq!(config.export.album_prefix_filter(), None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_link_action_parse() {
        assert_eq!(LinkAction::parse("copy"), Some(LinkAction::Copy));
        assert_eq!(LinkAction::parse("Symlink"), Some(LinkAction::Symlink));
        assert_eq!(LinkAction::parse("HARDLINK"), Some(LinkAction::Hardlink));
        assert_eq!(LinkAction::parse("move"), None);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.library.root = PathBuf::from("/photos/Library.photoslibrary");
        config.output.directory = PathBuf::from("/backup/albums");
        config.output.link_action = LinkAction::Hardlink;
        config.export.album_prefix = "Holidays".to_string();

        let toml = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.library.root, config.library.root);
        assert_eq!(parsed.output.link_action, LinkAction::Hardlink);
        assert_eq!(parsed.export.album_prefix_filter(), Some("Holidays"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed: Config = toml::from_str("[export]\nmasters_only = true\n").unwrap();
        assert!(parsed.export.masters_only);
        assert!(parsed.output.skip_existing);
        assert_eq!(parsed.logging.level, "info");
    }

    #[test]
    fn test_default_template_parses() {
        let parsed: Config = toml::from_str(&Config::generate_default_config()).unwrap();
        assert_eq!(parsed.output.link_action, LinkAction::Copy);
    }
}
