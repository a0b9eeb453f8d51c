use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::search::SortMode;

const APP_DIR_NAME: &str = "TabFinder";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json5 parse error: {0}")]
    Json5(#[from] json5::Error),
    #[error("toml encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub hotkey: String,
    pub sort_mode: SortMode,
    pub include_closed_tabs: bool,
    pub max_closed_tabs: u16,
    pub log_level: String,
    pub shared_db_path: PathBuf,
    pub history_db_path: PathBuf,
    #[serde(skip)]
    pub config_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let base = stable_app_data_dir();
        Self {
            hotkey: "Option+Tab".to_string(),
            sort_mode: SortMode::LastSeen,
            include_closed_tabs: true,
            max_closed_tabs: 50,
            log_level: "info".to_string(),
            shared_db_path: base.join("shared.sqlite3"),
            history_db_path: base.join("history.sqlite3"),
            config_path: base.join(CONFIG_FILE_NAME),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
}

pub fn default_config_path() -> PathBuf {
    stable_app_data_dir().join(CONFIG_FILE_NAME)
}

pub fn validate(cfg: &Config) -> Result<(), String> {
    crate::settings::validate_max_closed_tabs(cfg.max_closed_tabs)?;
    crate::settings::validate_hotkey(&cfg.hotkey)?;

    if cfg.shared_db_path.as_os_str().is_empty() {
        return Err("shared_db_path is required".into());
    }

    if cfg.history_db_path.as_os_str().is_empty() {
        return Err("history_db_path is required".into());
    }

    if cfg.log_level.trim().is_empty() {
        return Err("log_level is required".into());
    }

    Ok(())
}

/// Loads the config at `path` (or the default location). A missing file
/// yields defaults. `.json`/`.json5` files are read as JSON5, anything else
/// as TOML.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config_path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !config_path.exists() {
        return Ok(Config {
            config_path,
            ..Config::default()
        });
    }

    let raw = std::fs::read_to_string(&config_path)?;
    let mut config = parse(&raw, &config_path)?;
    config.config_path = config_path;
    validate(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

pub fn save(config: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = config.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let encoded = toml::to_string_pretty(config)?;
    std::fs::write(&config.config_path, encoded)?;
    Ok(())
}

fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("json") || ext.eq_ignore_ascii_case("json5"))
        .unwrap_or(false);

    if is_json {
        Ok(json5::from_str(raw)?)
    } else {
        Ok(toml::from_str(raw)?)
    }
}
