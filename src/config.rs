//! Configuration management for linkshield.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::validation::parse_interval;

/// Default environment variable for the bot token
const TELEGRAM_TOKEN_ENV: &str = "LINKSHIELD_TELEGRAM_TOKEN";

/// Default environment variable for the link provider API key
const LINKS_API_KEY_ENV: &str = "LINKSHIELD_LINKS_API_KEY";

/// Secure string type that zeroizes memory on drop
/// Used for sensitive data like tokens and API keys
#[derive(Clone, Default, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct SecureString(String);

impl SecureString {
    pub fn new(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecureString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Resolve a secret: custom env var, then default env var, then config value
fn resolve_secret(
    custom_env: Option<&str>,
    default_env: &str,
    fallback: &SecureString,
) -> SecureString {
    if let Some(env_name) = custom_env {
        if let Ok(val) = env::var(env_name) {
            return SecureString::new(val);
        }
    }
    if let Ok(val) = env::var(default_env) {
        return SecureString::new(val);
    }
    fallback.clone()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduler tuning
    pub monitor: MonitorConfig,

    /// Persisted state files
    pub paths: PathsConfig,

    /// Blocklist oracle
    pub checker: CheckerConfig,

    /// Notification channel (Telegram Bot API)
    pub telegram: TelegramConfig,

    /// Short-link provider (Kutt API)
    pub links: LinksConfig,

    /// Timeout for outbound requests without a more specific setting
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.monitor.batch_size == 0 {
            anyhow::bail!("monitor.batch_size must be at least 1");
        }

        parse_interval(&self.monitor.check_interval)
            .context("Invalid monitor.check_interval")?;
        parse_interval(&self.monitor.heartbeat_interval)
            .context("Invalid monitor.heartbeat_interval")?;

        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }

        for (name, url) in [
            ("checker.url", &self.checker.url),
            ("telegram.api_url", &self.telegram.api_url),
            ("links.api_url", &self.links.api_url),
        ] {
            if !url.starts_with("https://") {
                anyhow::bail!("{} must use HTTPS: {}", name, url);
            }
        }

        if self.links.page_size == 0 {
            anyhow::bail!("links.page_size must be at least 1");
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Default timeout for outbound requests
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Number of domains checked per oracle call
    pub batch_size: usize,
    /// Pause between full passes over the domain list
    pub check_interval: String,
    /// Minimum time between two all-clear messages
    pub heartbeat_interval: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            check_interval: "2m".to_string(),
            heartbeat_interval: "1h".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn check_interval(&self) -> Result<Duration> {
        parse_interval(&self.check_interval)
    }

    pub fn heartbeat_interval(&self) -> Result<Duration> {
        parse_interval(&self.heartbeat_interval)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Tracked domains, one per line
    pub domains: PathBuf,
    /// Backup mapping records (`old domain : a, new domain : b`)
    pub backups: PathBuf,
    /// Registered recipient identifier
    pub recipient: PathBuf,
    /// Single-instance lock file
    pub lock: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            domains: PathBuf::from("list.txt"),
            backups: PathBuf::from("target-backup.txt"),
            recipient: PathBuf::from("recipient.txt"),
            lock: PathBuf::from("linkshield.lock"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Endpoint accepting a newline-separated batch of domains
    pub url: String,
    /// Status value the oracle uses for a blocked domain
    pub blocked_status: String,
    /// Oracle requests can be slow, so they get their own timeout
    pub timeout_secs: u64,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            url: "https://trustpositif.komdigi.go.id/Rest_server/getrecordsname_home".to_string(),
            blocked_status: "Ada".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub api_url: String,
    /// Token can be set directly or via LINKSHIELD_TELEGRAM_TOKEN env var
    /// Memory is securely zeroed when dropped
    pub token: SecureString,
    /// Environment variable name to read token from (optional)
    pub token_env: Option<String>,
    /// Server-side long-poll window for inbound messages
    pub poll_timeout_secs: u64,
    /// Pause between two polls
    pub poll_interval_ms: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.telegram.org".to_string(),
            token: SecureString::default(),
            token_env: None,
            poll_timeout_secs: 30,
            poll_interval_ms: 1000,
        }
    }
}

impl TelegramConfig {
    /// Get the effective token, checking env vars first
    pub fn get_token(&self) -> SecureString {
        resolve_secret(self.token_env.as_deref(), TELEGRAM_TOKEN_ENV, &self.token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub api_url: String,
    /// API key can be set directly or via LINKSHIELD_LINKS_API_KEY env var
    pub api_key: SecureString,
    /// Environment variable name to read the API key from (optional)
    pub api_key_env: Option<String>,
    /// Description written on every rewritten link
    pub description: String,
    /// Links requested per listing page
    pub page_size: usize,
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            api_url: "https://kutt.it".to_string(),
            api_key: SecureString::default(),
            api_key_env: None,
            description: "Automatic domain replacement".to_string(),
            page_size: 50,
        }
    }
}

impl LinksConfig {
    /// Get the effective API key, checking env vars first
    pub fn get_api_key(&self) -> SecureString {
        resolve_secret(self.api_key_env.as_deref(), LINKS_API_KEY_ENV, &self.api_key)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            paths: PathsConfig::default(),
            checker: CheckerConfig::default(),
            telegram: TelegramConfig::default(),
            links: LinksConfig::default(),
            request_timeout_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.batch_size, 5);
        assert_eq!(config.monitor.check_interval().unwrap(), Duration::from_secs(120));
        assert_eq!(
            config.monitor.heartbeat_interval().unwrap(),
            Duration::from_secs(3600)
        );
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.checker.timeout_secs, 30);
        assert_eq!(config.telegram.poll_timeout_secs, 30);
        assert_eq!(config.paths.domains, PathBuf::from("list.txt"));
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
monitor:
  batch_size: 3
telegram:
  token: "abc"
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.monitor.batch_size, 3);
        assert_eq!(config.monitor.check_interval, "2m");
        assert_eq!(config.telegram.token.as_str(), "abc");
        assert_eq!(config.links.page_size, 50);
    }

    #[test]
    fn test_config_validation_zero_batch() {
        let mut config = Config::default();
        config.monitor.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_config_validation_invalid_interval() {
        let mut config = Config::default();
        config.monitor.heartbeat_interval = "soon".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("heartbeat_interval"));
    }

    #[test]
    fn test_config_validation_http_rejected() {
        let mut config = Config::default();
        config.links.api_url = "http://kutt.local".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("HTTPS"));
    }

    #[test]
    fn test_secure_string_debug_redacted() {
        let secret = SecureString::new("my-secret-token".to_string());
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "[REDACTED]");
    }

    #[test]
    fn test_config_debug_hides_secrets() {
        let mut config = Config::default();
        config.telegram.token = "123:secret".into();
        config.links.api_key = "kutt-key".into();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("123:secret"));
        assert!(!debug.contains("kutt-key"));
    }

    #[test]
    fn test_custom_env_takes_precedence() {
        let config = LinksConfig {
            api_key: "from-config".into(),
            api_key_env: Some("LINKSHIELD_TEST_CUSTOM_KEY".to_string()),
            ..Default::default()
        };
        std::env::set_var("LINKSHIELD_TEST_CUSTOM_KEY", "from-env");
        assert_eq!(config.get_api_key().as_str(), "from-env");
        std::env::remove_var("LINKSHIELD_TEST_CUSTOM_KEY");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.monitor.batch_size = 7;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.monitor.batch_size, 7);
        assert_eq!(loaded.checker.blocked_status, "Ada");
    }

    #[test]
    fn test_load_rejects_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "monitor:\n  batch_size: 0\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
