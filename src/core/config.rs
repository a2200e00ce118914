//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.charsheet/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SheetConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub data_file: Option<String>,
    pub log_file: Option<String>,
    pub log_level: Option<String>,
    pub identity_key: Option<String>,
}

/// Colour overrides. Anything ratatui's `Color::from_str` accepts
/// (`"#7C3AED"`, `"magenta"`, `"13"`).
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct ThemeConfig {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub success: Option<String>,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub muted: Option<String>,
    pub highlight: Option<String>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_DATA_FILE: &str = "charsheet.json";
pub const DEFAULT_LOG_FILE: &str = "charsheet.log";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: log::LevelFilter,
    pub identity_key: Option<String>,
    pub theme: ThemeConfig,
}

/// Values from CLI flags (None = not specified).
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub data_file: Option<PathBuf>,
    pub identity_key: Option<String>,
    pub log_level: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns `~/.charsheet/`.
pub fn app_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".charsheet"))
}

/// Returns the path to `~/.charsheet/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.toml"))
}

/// Load config from `~/.charsheet/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `SheetConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<SheetConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(SheetConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(SheetConfig::default());
    }

    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<SheetConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: SheetConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

fn generate_default_config(path: &Path) {
    let default_content = r##"# charsheet configuration
# Every setting is optional. Override order: defaults, this file, env vars, CLI flags.

# [general]
# data_file = "charsheet.json"       # Relative to ~/.charsheet/, or absolute. Env: CHARSHEET_DATA_FILE
# log_file = "charsheet.log"         # Relative to ~/.charsheet/, or absolute
# log_level = "debug"                # error, warn, info, debug, trace. Env: CHARSHEET_LOG_LEVEL
# identity_key = "ssh-ed25519 AAAA..." # Env: CHARSHEET_IDENTITY_KEY

# [theme]
# primary = "#7C3AED"
# secondary = "#EC4899"
# success = "#10B981"
# warning = "#F59E0B"
# error = "#EF4444"
# muted = "#6B7280"
# highlight = "#A78BFA"
"##;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Relative paths land under `base` (normally `~/.charsheet/`).
fn anchor(path: &str, base: Option<&Path>) -> PathBuf {
    let p = PathBuf::from(path);
    match base {
        Some(base) if p.is_relative() => base.join(p),
        _ => p,
    }
}

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &SheetConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_base(config, cli, app_dir().as_deref())
}

fn resolve_with_base(config: &SheetConfig, cli: &CliOverrides, base: Option<&Path>) -> ResolvedConfig {
    // Data file: CLI → env → config → default
    let data_file = cli.data_file.clone().unwrap_or_else(|| {
        let raw = std::env::var("CHARSHEET_DATA_FILE")
            .ok()
            .or_else(|| config.general.data_file.clone())
            .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string());
        anchor(&raw, base)
    });

    let log_file = anchor(
        config.general.log_file.as_deref().unwrap_or(DEFAULT_LOG_FILE),
        base,
    );

    // Log level: CLI → env → config → default
    let level_name = cli
        .log_level
        .clone()
        .or_else(|| std::env::var("CHARSHEET_LOG_LEVEL").ok())
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
    let log_level = level_name.parse().unwrap_or_else(|_| {
        warn!("Unknown log level {:?}, using {}", level_name, DEFAULT_LOG_LEVEL);
        log::LevelFilter::Debug
    });

    // Identity key: CLI → env → config
    let identity_key = cli
        .identity_key
        .clone()
        .or_else(|| std::env::var("CHARSHEET_IDENTITY_KEY").ok())
        .or_else(|| config.general.identity_key.clone())
        .filter(|k| !k.trim().is_empty());

    ResolvedConfig {
        data_file,
        log_file,
        log_level,
        identity_key,
        theme: config.theme.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = SheetConfig::default();
        assert!(config.general.data_file.is_none());
        assert!(config.theme.primary.is_none());
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let config = SheetConfig::default();
        let resolved = resolve_with_base(&config, &CliOverrides::default(), Some(Path::new("/base")));
        // CHARSHEET_* may be set in the environment running the tests
        if std::env::var("CHARSHEET_DATA_FILE").is_err() {
            assert_eq!(resolved.data_file, PathBuf::from("/base/charsheet.json"));
        }
        assert_eq!(resolved.log_file, PathBuf::from("/base/charsheet.log"));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = SheetConfig {
            general: GeneralConfig {
                data_file: Some("/srv/party.json".to_string()),
                log_file: Some("logs/sheet.log".to_string()),
                log_level: Some("warn".to_string()),
                identity_key: Some("ssh-ed25519 AAAA".to_string()),
            },
            ..Default::default()
        };
        let resolved = resolve_with_base(&config, &CliOverrides::default(), Some(Path::new("/base")));
        if std::env::var("CHARSHEET_DATA_FILE").is_err() {
            assert_eq!(resolved.data_file, PathBuf::from("/srv/party.json"));
        }
        assert_eq!(resolved.log_file, PathBuf::from("/base/logs/sheet.log"));
        if std::env::var("CHARSHEET_LOG_LEVEL").is_err() {
            assert_eq!(resolved.log_level, log::LevelFilter::Warn);
        }
    }

    #[test]
    fn test_resolve_cli_wins() {
        let config = SheetConfig {
            general: GeneralConfig {
                data_file: Some("from-config.json".to_string()),
                identity_key: Some("ssh-rsa CONFIG".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let cli = CliOverrides {
            data_file: Some(PathBuf::from("/tmp/cli.json")),
            identity_key: Some("ssh-ed25519 CLI".to_string()),
            log_level: Some("trace".to_string()),
        };
        let resolved = resolve_with_base(&config, &cli, None);
        assert_eq!(resolved.data_file, PathBuf::from("/tmp/cli.json"));
        assert_eq!(resolved.identity_key.as_deref(), Some("ssh-ed25519 CLI"));
        assert_eq!(resolved.log_level, log::LevelFilter::Trace);
    }

    #[test]
    fn test_blank_identity_key_is_ignored() {
        let cli = CliOverrides {
            identity_key: Some("   ".to_string()),
            ..Default::default()
        };
        let resolved = resolve_with_base(&SheetConfig::default(), &cli, None);
        if std::env::var("CHARSHEET_IDENTITY_KEY").is_err() {
            assert!(resolved.identity_key.is_none());
        }
    }

    #[test]
    fn test_toml_round_trip() {
        let toml_str = r##"
[general]
data_file = "party.json"
log_level = "info"

[theme]
primary = "#112233"
muted = "gray"
"##;
        let config: SheetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.data_file.as_deref(), Some("party.json"));
        assert_eq!(config.general.log_level.as_deref(), Some("info"));
        assert_eq!(config.theme.primary.as_deref(), Some("#112233"));
        assert_eq!(config.theme.muted.as_deref(), Some("gray"));
        assert!(config.theme.error.is_none());
    }

    #[test]
    fn test_sparse_toml_parses() {
        // Only override one thing, everything else stays default
        let toml_str = r#"
[theme]
error = "red"
"#;
        let config: SheetConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.theme.error.as_deref(), Some("red"));
        assert!(config.general.data_file.is_none());
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[general\ndata_file = ").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));
    }
}
