//! 配置管理
//!
//! TOML 配置文件，默认路径 `~/.config/mycloudx/config.toml`。
//! 环境变量优先于文件中的值。

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::client::ListFailurePolicy;
use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// 服务器根地址
    pub url: String,

    /// 请求超时（秒）。不设置时使用底层传输的默认行为
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// 预置令牌，命令行参数优先
    pub token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct UiConfig {
    pub list_failures: ListFailurePolicy,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: LogFormat,
    /// 额外写入的日志文件
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SERVER_URL.to_string(),
            timeout_secs: None,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Pretty,
            file: None,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mycloudx")
        .join("config.toml")
}

impl Config {
    /// 用环境变量覆盖配置：
    /// - MYCLOUDX_URL
    /// - MYCLOUDX_TOKEN
    /// - MYCLOUDX_LOG_LEVEL
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(url) = non_empty("MYCLOUDX_URL") {
            tracing::debug!("Overriding server.url from environment: {}", url);
            self.server.url = url;
        }
        if let Some(token) = non_empty("MYCLOUDX_TOKEN") {
            tracing::debug!("Overriding auth.token from environment");
            self.auth.token = Some(token);
        }
        if let Some(level) = non_empty("MYCLOUDX_LOG_LEVEL") {
            tracing::debug!("Overriding log.level from environment: {}", level);
            self.log.level = level;
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let url = &self.server.url;
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::InvalidServerUrl(url.clone()));
        }

        if let Some(secs) = self.server.timeout_secs {
            if !(1..=3600).contains(&secs) {
                return Err(ConfigError::InvalidTimeout(secs));
            }
        }

        let level = self.log.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.log.level.clone()));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.server.timeout_secs.map(Duration::from_secs)
    }

    /// 读取配置文件；文件不存在时返回默认配置
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://127.0.0.1:8000");
        assert_eq!(config.server.timeout_secs, None);
        assert_eq!(config.auth.token, None);
        assert_eq!(config.ui.list_failures, ListFailurePolicy::Silent);
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.ends_with("mycloudx/config.toml"));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            url = "https://cloud.example.com"

            [ui]
            list_failures = "notify"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.url, "https://cloud.example.com");
        assert_eq!(config.ui.list_failures, ListFailurePolicy::Notify);
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_invalid_toml_reports_position() {
        let err = Config::from_toml("[server\nurl = 1").unwrap_err();
        assert!(err.to_string().contains("Invalid TOML configuration"));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert!(Config::from_toml("[ui]\nlist_failures = \"loud\"").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("MYCLOUDX_URL", "http://10.0.0.2:8000"),
            ("MYCLOUDX_TOKEN", "secret123"),
            ("MYCLOUDX_LOG_LEVEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.server.url, "http://10.0.0.2:8000");
        assert_eq!(config.auth.token.as_deref(), Some("secret123"));
        // 空值不覆盖
        assert_eq!(config.log.level, "warn");
    }

    #[test]
    fn test_validate_server_url() {
        let mut config = Config::default();
        config.server.url = "ftp://example.com".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidServerUrl("ftp://example.com".to_string()))
        );
    }

    #[test]
    fn test_validate_timeout() {
        let mut config = Config::default();
        config.server.timeout_secs = Some(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidTimeout(0)));

        config.server.timeout_secs = Some(30);
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.log.level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.log.level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.server.timeout_secs = Some(15);
        config.auth.token = Some("abc".to_string());
        config.log.format = LogFormat::Json;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }
}
