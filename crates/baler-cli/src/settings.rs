//! Settings file discovery and merging.
//!
//! Resolution order for the settings file:
//! 1. `--config <FILE>`
//! 2. `BALER_CONFIG` (file path)
//! 3. `BALER_CONFIG_DIR` + `baler.toml`
//! 4. XDG config directory (`~/.config/baler/baler.toml`)
//! 5. Built-in defaults (no file)
//!
//! Individual CLI flags override values from the file.

use baler_core::{BalerError, BundleConfig, Result, DEFAULT_MAX_OUTPUT_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a settings file.
pub const ENV_CONFIG: &str = "BALER_CONFIG";

/// Environment variable naming a directory holding `baler.toml`.
pub const ENV_CONFIG_DIR: &str = "BALER_CONFIG_DIR";

/// Settings file name inside a config directory.
pub const CONFIG_FILENAME: &str = "baler.toml";

/// Application name for XDG directories.
const APP_NAME: &str = "baler";

/// Default line cap for unconvert when no buffer size is given (5 MiB).
pub const DEFAULT_UNCONVERT_MAX_INPUT_SIZE: u64 = DEFAULT_MAX_OUTPUT_SIZE;

/// Where the settings file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// `[convert]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertSettings {
    pub max_input_file_size: Option<u64>,
    pub max_input_file_lines: Option<u64>,
    pub max_output_file_size: Option<u64>,
    pub max_buffer_size: Option<u64>,
    pub exclude: Vec<String>,
    pub delimiter: Option<String>,
    pub verbose: Option<bool>,
}

/// `[unconvert]` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UnconvertSettings {
    pub max_input_file_size: Option<u64>,
    pub max_buffer_size: Option<u64>,
    pub delimiter: Option<String>,
    pub verbose: Option<bool>,
}

/// Contents of `baler.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub convert: ConvertSettings,
    pub unconvert: UnconvertSettings,
}

/// Settings plus where they came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedSettings {
    pub settings: SettingsFile,
    pub path: Option<PathBuf>,
    pub source: ConfigSource,
}

/// Locate the settings file. An explicit `--config` path must exist; the
/// other locations are simply skipped when absent.
pub fn resolve_settings_path(cli_path: Option<&Path>) -> Result<(Option<PathBuf>, ConfigSource)> {
    // 1. CLI argument
    if let Some(path) = cli_path {
        if !path.is_file() {
            return Err(BalerError::config(format!(
                "config file {} not found",
                path.display()
            )));
        }
        return Ok((Some(path.to_path_buf()), ConfigSource::CliArgument));
    }

    // 2. Environment variable (direct path)
    if let Some(env_path) = std::env::var_os(ENV_CONFIG) {
        let path = PathBuf::from(env_path);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 3. Environment variable (config dir)
    if let Some(config_dir) = std::env::var_os(ENV_CONFIG_DIR) {
        let path = PathBuf::from(config_dir).join(CONFIG_FILENAME);
        if path.is_file() {
            return Ok((Some(path), ConfigSource::Environment));
        }
    }

    // 4. XDG config directory
    if let Some(path) = xdg_config_dir().map(|d| d.join(CONFIG_FILENAME)) {
        if path.is_file() {
            return Ok((Some(path), ConfigSource::XdgConfig));
        }
    }

    Ok((None, ConfigSource::BuiltinDefault))
}

/// Get the XDG config directory for baler.
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

/// Parse a settings file.
pub fn load_settings_file(path: &Path) -> Result<SettingsFile> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        BalerError::io(format!("failed to read config file {}", path.display()), e)
    })?;
    parse_settings(&text).map_err(|e| match e {
        BalerError::Config { message, source } => BalerError::Config {
            message: format!("{}: {message}", path.display()),
            source,
        },
        other => other,
    })
}

/// Parse settings from TOML text.
pub fn parse_settings(text: &str) -> Result<SettingsFile> {
    toml::from_str(text).map_err(|e| BalerError::config_with("invalid settings", e))
}

/// Resolve and load settings in one step.
pub fn load_settings(cli_path: Option<&Path>) -> Result<LoadedSettings> {
    let (path, source) = resolve_settings_path(cli_path)?;
    let settings = match &path {
        Some(p) => load_settings_file(p)?,
        None => SettingsFile::default(),
    };
    Ok(LoadedSettings {
        settings,
        path,
        source,
    })
}

/// Flag values given on the command line for `convert`.
#[derive(Debug, Clone, Default)]
pub struct ConvertOverrides {
    pub max_input_file_size: Option<u64>,
    pub max_input_file_lines: Option<u64>,
    pub max_output_file_size: Option<u64>,
    pub max_buffer_size: Option<u64>,
    pub exclude: Vec<String>,
    pub delimiter: Option<String>,
    pub verbose: bool,
}

/// Flag values given on the command line for `unconvert`.
#[derive(Debug, Clone, Default)]
pub struct UnconvertOverrides {
    pub max_input_file_size: Option<u64>,
    pub max_buffer_size: Option<u64>,
    pub delimiter: Option<String>,
    pub verbose: bool,
}

/// Build the encode config: flags, then file, then defaults. Exclusions
/// from the file come first and flag patterns are appended.
pub fn convert_config(file: &ConvertSettings, cli: &ConvertOverrides) -> Result<BundleConfig> {
    let defaults = BundleConfig::default();
    let exclusions = file.exclude.iter().chain(cli.exclude.iter()).cloned();

    let config = BundleConfig::new()
        .with_max_input_size(
            cli.max_input_file_size
                .or(file.max_input_file_size)
                .unwrap_or(defaults.max_input_size),
        )
        .with_max_input_lines(
            cli.max_input_file_lines
                .or(file.max_input_file_lines)
                .unwrap_or(defaults.max_input_lines),
        )
        .with_max_output_size(
            cli.max_output_file_size
                .or(file.max_output_file_size)
                .unwrap_or(defaults.max_output_size),
        )
        .with_buffer_size(cli.max_buffer_size.or(file.max_buffer_size).unwrap_or(0))
        .with_exclusions(exclusions)
        .with_delimiter(
            cli.delimiter
                .clone()
                .or_else(|| file.delimiter.clone())
                .unwrap_or(defaults.delimiter),
        )
        .with_verbose(cli.verbose || file.verbose.unwrap_or(false));

    config.validate_for_encode()?;
    Ok(config)
}

/// Build the decode config the same way.
pub fn unconvert_config(file: &UnconvertSettings, cli: &UnconvertOverrides) -> Result<BundleConfig> {
    let config = BundleConfig::new()
        .with_max_input_size(
            cli.max_input_file_size
                .or(file.max_input_file_size)
                .unwrap_or(DEFAULT_UNCONVERT_MAX_INPUT_SIZE),
        )
        .with_buffer_size(cli.max_buffer_size.or(file.max_buffer_size).unwrap_or(0))
        .with_delimiter(
            cli.delimiter
                .clone()
                .or_else(|| file.delimiter.clone())
                .unwrap_or_else(|| baler_core::DEFAULT_DELIMITER.to_string()),
        )
        .with_verbose(cli.verbose || file.verbose.unwrap_or(false));

    config.validate()?;
    Ok(config)
}
