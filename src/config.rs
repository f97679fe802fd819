use crate::error::DynamicsError;
use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `dynamics_url` from the config file
pub const DYNAMICS_URL_ENV: &str = "DYNAMICS_URL";

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Organization root, e.g. https://contoso.crm4.dynamics.com
    pub dynamics_url: Option<String>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_top")]
    pub default_top: u32,
    #[serde(default = "default_account_search_top")]
    pub account_search_top: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_top() -> u32 {
    20
}

fn default_account_search_top() -> u32 {
    10
}

fn default_request_timeout_secs() -> u64 {
    300
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_top: default_top(),
            account_search_top: default_account_search_top(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// Delegated user token: cache, refresh token, then browser sign-in
    #[default]
    Interactive,
    /// Application token from the client secret
    ClientCredentials,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default = "default_authority_host")]
    pub authority_host: String,
    /// Directory holding the token cache file; defaults to the local data dir
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    #[serde(default = "default_login_timeout_secs")]
    pub login_timeout_secs: u64,
}

fn default_authority_host() -> String {
    DEFAULT_AUTHORITY_HOST.to_string()
}

fn default_login_timeout_secs() -> u64 {
    300
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            mode: AuthMode::default(),
            authority_host: default_authority_host(),
            cache_dir: None,
            login_timeout_secs: default_login_timeout_secs(),
        }
    }
}

impl Config {
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get user config directory")?
            .join("dynamics-crm");
        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        debug!("Loading config from: {:?}", config_path);

        if !config_path.exists() {
            info!("Config file doesn't exist, using defaults");
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

        Ok(config)
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(DYNAMICS_URL_ENV).filter(|u| !u.trim().is_empty()) {
            debug!("Using {} from environment", DYNAMICS_URL_ENV);
            self.dynamics_url = Some(url);
        }
    }

    /// Organization root without a trailing slash
    pub fn dynamics_url(&self) -> crate::error::Result<String> {
        let url = self
            .dynamics_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                DynamicsError::configuration(format!(
                    "dynamics_url is not configured (set it in config.toml or {})",
                    DYNAMICS_URL_ENV
                ))
            })?;

        if !url.starts_with("https://") && !url.starts_with("http://") {
            return Err(DynamicsError::configuration(format!(
                "dynamics_url must be an absolute http(s) URL, got '{}'",
                url
            )));
        }

        Ok(url.trim_end_matches('/').to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.request_timeout_secs)
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.auth.login_timeout_secs)
    }

    /// Directory holding the token cache file
    pub fn cache_dir(&self) -> crate::error::Result<PathBuf> {
        if let Some(dir) = &self.auth.cache_dir {
            return Ok(dir.clone());
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("dynamics-crm"))
            .ok_or_else(|| DynamicsError::configuration("Failed to get local data directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.settings.default_top, 20);
        assert_eq!(config.settings.account_search_top, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(300));
        assert_eq!(config.auth.mode, AuthMode::Interactive);
        assert_eq!(config.auth.authority_host, DEFAULT_AUTHORITY_HOST);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            dynamics_url = "https://contoso.crm4.dynamics.com/"

            [auth]
            mode = "client_credentials"
            "#,
        )
        .unwrap();

        assert_eq!(config.dynamics_url().unwrap(), "https://contoso.crm4.dynamics.com");
        assert_eq!(config.auth.mode, AuthMode::ClientCredentials);
        assert_eq!(config.settings.default_top, 20);
    }

    #[test]
    fn test_missing_url_is_configuration_error() {
        let config = Config::default();
        assert!(matches!(config.dynamics_url(), Err(DynamicsError::Configuration(_))));
    }

    #[test]
    fn test_relative_url_rejected() {
        let config = Config {
            dynamics_url: Some("contoso.crm4.dynamics.com".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.dynamics_url(), Err(DynamicsError::Configuration(_))));
    }

    #[test]
    fn test_env_override_wins() {
        let mut config = Config {
            dynamics_url: Some("https://file.crm.dynamics.com".to_string()),
            ..Config::default()
        };
        let env: HashMap<&str, &str> = [(DYNAMICS_URL_ENV, "https://env.crm.dynamics.com")].into();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.dynamics_url().unwrap(), "https://env.crm.dynamics.com");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config = Config::load_from(Path::new("/definitely/not/here/config.toml")).unwrap();
        assert!(config.dynamics_url.is_none());
    }
}
