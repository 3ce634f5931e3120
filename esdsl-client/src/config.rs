//! Client configuration
//!
//! Default config location: ~/.esdsl/config.toml

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub elasticsearch: ClientConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Base URL of the cluster, scheme and port included
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Either `id:key` or the already base64-encoded credential
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_connect_timeout() -> u64 {
    5_000
}

fn default_request_timeout() -> u64 {
    30_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            api_key: None,
            connect_timeout_ms: default_connect_timeout(),
            request_timeout_ms: default_request_timeout(),
            headers: HashMap::new(),
            accept_invalid_certs: false,
        }
    }
}

impl ClientConfig {
    pub fn with_url(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directives. Override with RUST_LOG env var
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json". Override with LOG_FORMAT env var
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info,esdsl=debug".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".esdsl")
        .join("config.toml")
}

pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let s = path.to_string_lossy();
    let home = || {
        dirs::home_dir().ok_or_else(|| ClientError::Config("Cannot determine home directory".into()))
    };
    if let Some(rest) = s.strip_prefix("~/") {
        Ok(home()?.join(rest))
    } else if s == "~" {
        home()
    } else {
        Ok(path.to_path_buf())
    }
}

impl Config {
    /// Load config from the default location, then apply env overrides
    pub fn load() -> Result<Self> {
        Self::load_from(&default_config_path())
    }

    /// Load config from a file; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let path = expand_tilde(path)?;
        let mut config = if path.exists() {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Config::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let path = expand_tilde(path)?;
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// ESDSL_URL, ESDSL_USERNAME, ESDSL_PASSWORD and ESDSL_API_KEY win over
    /// the file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let es = &mut self.elasticsearch;
        if let Some(url) = lookup("ESDSL_URL") {
            es.url = url;
        }
        if let Some(username) = lookup("ESDSL_USERNAME") {
            es.username = Some(username);
        }
        if let Some(password) = lookup("ESDSL_PASSWORD") {
            es.password = Some(password);
        }
        if let Some(api_key) = lookup("ESDSL_API_KEY") {
            es.api_key = Some(api_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.elasticsearch.url, "http://localhost:9200");
        assert_eq!(config.elasticsearch.request_timeout_ms, 30_000);
        assert_eq!(config.logging.log_format, "pretty");
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            [elasticsearch]
            url = "https://es.internal:9243"
            api_key = "id:key"

            [elasticsearch.headers]
            x-tenant = "acme"
            "#,
        )
        .unwrap();
        assert_eq!(config.elasticsearch.url, "https://es.internal:9243");
        assert_eq!(config.elasticsearch.api_key.as_deref(), Some("id:key"));
        assert_eq!(config.elasticsearch.headers["x-tenant"], "acme");
        assert_eq!(config.elasticsearch.connect_timeout_ms, 5_000);
        assert_eq!(config.logging.level, "info,esdsl=debug");
    }

    #[test]
    fn test_overrides() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("ESDSL_URL", "http://other:9200"),
            ("ESDSL_USERNAME", "elastic"),
            ("ESDSL_PASSWORD", " "),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.elasticsearch.url, "http://other:9200");
        assert_eq!(config.elasticsearch.username.as_deref(), Some("elastic"));
        assert_eq!(config.elasticsearch.password, None);
    }

    #[test]
    fn test_expand_tilde() {
        let plain = Path::new("/etc/esdsl.toml");
        assert_eq!(expand_tilde(plain).unwrap(), plain);
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/x.toml")).unwrap(),
                home.join("x.toml")
            );
        }
    }
}
