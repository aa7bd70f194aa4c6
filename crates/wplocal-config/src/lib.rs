//! Shared configuration for the wplocal CLI.
//!
//! TOML settings, WordPress.com token resolution, platform paths for the
//! bundled server assets, and the persistent user-data document (sites,
//! connections, snapshots, preferences).

use std::path::PathBuf;

use directories::{ProjectDirs, UserDirs};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod files;
pub mod userdata;

pub use files::AppServerFiles;
pub use userdata::{FailedSyncRun, UserDataStore};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no WordPress.com token configured")]
    NoToken,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("failed to read user data: {0}")]
    UserData(#[from] serde_json::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct AppConfig {
    /// WordPress.com API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// OAuth token (plaintext — prefer the env var).
    pub oauth_token: Option<String>,

    /// Environment variable name containing the OAuth token.
    pub oauth_token_env: Option<String>,

    /// Where new sites are created by default.
    pub sites_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            oauth_token: None,
            oauth_token_env: None,
            sites_dir: None,
        }
    }
}

fn default_api_base() -> String {
    wplocal_api::client::DEFAULT_API_BASE.into()
}

impl AppConfig {
    /// Default directory for new site working directories.
    pub fn sites_dir(&self) -> PathBuf {
        self.sites_dir.clone().unwrap_or_else(default_sites_dir)
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "wplocal", "wplocal")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("wplocal.toml"),
        |dirs| dirs.config_dir().join("wplocal.toml"),
    )
}

/// Application data directory (user data, staging, server assets).
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_dir().to_path_buf())
}

pub fn user_data_path() -> PathBuf {
    data_dir().join("user-data.json")
}

/// Scratch space for in-flight sync artifacts.
pub fn staging_dir() -> PathBuf {
    data_dir().join("sync-staging")
}

/// Where the bundled PHP, WordPress, and plugin assets live.
pub fn server_files_dir() -> PathBuf {
    data_dir().join("server-files")
}

fn default_sites_dir() -> PathBuf {
    UserDirs::new().map_or_else(
        || PathBuf::from("."),
        |dirs| dirs.home_dir().join("WPLocal Sites"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wplocal");
    p
}

// ── Config loading / saving ─────────────────────────────────────────

/// Load the config from file + `WPLOCAL_`-prefixed environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::file(config_path()))
        .merge(Env::prefixed("WPLOCAL_"));

    Ok(figment.extract()?)
}

pub fn load_config_or_default() -> AppConfig {
    load_config().unwrap_or_default()
}

/// Serialize the config to TOML at the canonical path.
pub fn save_config(cfg: &AppConfig) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

/// Resolve the WordPress.com OAuth token: named env var first, then the
/// plaintext config value.
pub fn resolve_token(config: &AppConfig) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = config.oauth_token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }
    if let Some(ref token) = config.oauth_token {
        return Ok(SecretString::from(token.clone()));
    }
    Err(ConfigError::NoToken)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn default_api_base_points_at_wpcom() {
        assert_eq!(
            AppConfig::default().api_base,
            "https://public-api.wordpress.com"
        );
    }

    #[test]
    fn plaintext_token_resolves() {
        let config = AppConfig {
            oauth_token: Some("secret-token".into()),
            ..AppConfig::default()
        };
        assert!(resolve_token(&config).is_ok());
    }

    #[test]
    fn missing_token_is_an_error() {
        assert!(matches!(
            resolve_token(&AppConfig::default()),
            Err(ConfigError::NoToken)
        ));
    }
}
