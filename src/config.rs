//! Persistent application configuration model, defaults, and loading.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::db_bootstrap::DatabaseSettings;

/// Root configuration persisted to `contact_list.toml`.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Config {
    #[serde(default)]
    /// Bundled city database materialization.
    pub database: DatabaseConfig,
    #[serde(default)]
    /// Recently chosen cities.
    pub recent: RecentConfig,
    #[serde(default)]
    /// Location of bundled assets.
    pub assets: AssetsConfig,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_name")]
    pub target_name: String,
    #[serde(default = "default_database_name")]
    pub asset_name: String,
    #[serde(default = "default_database_version")]
    pub version: u32,
    /// Number of `<asset_name>.1NN` pieces when the bundle is split.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_parts: Option<u32>,
    /// Overrides the per-user data directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_dir: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            target_name: default_database_name(),
            asset_name: default_database_name(),
            version: default_database_version(),
            split_parts: None,
            target_dir: None,
        }
    }
}

impl DatabaseConfig {
    pub fn settings(&self) -> DatabaseSettings {
        DatabaseSettings {
            target_name: self.target_name.clone(),
            asset_name: self.asset_name.clone(),
            version: self.version,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct RecentConfig {
    #[serde(default = "default_recent_database_name")]
    pub database_name: String,
    #[serde(default = "default_recent_version")]
    pub version: u32,
    #[serde(default = "default_recent_limit")]
    pub limit: usize,
    /// Offered in the grid above the recent list.
    #[serde(default = "default_hot_cities")]
    pub hot_cities: Vec<String>,
}

impl Default for RecentConfig {
    fn default() -> Self {
        Self {
            database_name: default_recent_database_name(),
            version: default_recent_version(),
            limit: default_recent_limit(),
            hot_cities: default_hot_cities(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AssetsConfig {
    /// Defaults to `assets/` beside the executable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_database_name() -> String {
    "meituan_cities.db".to_string()
}

fn default_database_version() -> u32 {
    3
}

fn default_recent_database_name() -> String {
    "city".to_string()
}

fn default_recent_version() -> u32 {
    1
}

fn default_recent_limit() -> usize {
    3
}

fn default_hot_cities() -> Vec<String> {
    ["上海", "北京", "广州", "深圳", "武汉", "天津", "西安", "南京", "杭州"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Replaces unusable values with defaults.
pub fn sanitize_config(mut config: Config) -> Config {
    if config.database.target_name.trim().is_empty() {
        config.database.target_name = default_database_name();
    }
    if config.database.asset_name.trim().is_empty() {
        config.database.asset_name = default_database_name();
    }
    config.database.version = config.database.version.max(1);
    if config.database.split_parts == Some(0) {
        config.database.split_parts = None;
    }
    if config.recent.database_name.trim().is_empty() {
        config.recent.database_name = default_recent_database_name();
    }
    config.recent.version = config.recent.version.max(1);
    config
        .recent
        .hot_cities
        .retain(|city| !city.trim().is_empty());
    config
}

/// Reads `path`, writing defaults first when it does not exist.
///
/// Unreadable or malformed files fall back to defaults.
pub fn load_or_create(path: &Path) -> Config {
    if !path.exists() {
        info!(
            "Config file not found. Creating default config. path={}",
            path.display()
        );
        let write_result = toml::to_string(&Config::default())
            .map_err(|err| err.to_string())
            .and_then(|content| {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent).map_err(|err| err.to_string())?;
                }
                std::fs::write(path, content).map_err(|err| err.to_string())
            });
        if let Err(err) = write_result {
            warn!(
                "Failed to write default config. path={} error={}",
                path.display(),
                err
            );
        }
    }

    let config = match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str::<Config>(&content).unwrap_or_else(|err| {
            warn!(
                "Failed to parse config, using defaults. path={} error={}",
                path.display(),
                err
            );
            Config::default()
        }),
        Err(err) => {
            warn!(
                "Failed to read config, using defaults. path={} error={}",
                path.display(),
                err
            );
            Config::default()
        }
    };
    sanitize_config(config)
}
