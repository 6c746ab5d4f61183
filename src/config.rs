use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::MailError;

/// Environment variable that supplies (or overrides) the account secret.
pub const PASSWORD_ENV: &str = "GMAIL_MAILER_PASSWORD";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub email: String,
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_imap_server")]
    pub imap_server: String,
    #[serde(default = "default_imap_port")]
    pub imap_port: u16,
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub cache_path: Option<String>,
    #[serde(default = "default_cache_expiry_secs")]
    pub cache_expiry_secs: u64,

    #[serde(default = "default_max_emails")]
    pub max_emails: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Connect/read/write timeout for both IMAP and SMTP sockets.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_imap_server() -> String {
    "imap.gmail.com".to_string()
}

fn default_imap_port() -> u16 {
    993
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    465
}

fn default_cache_expiry_secs() -> u64 {
    300
}

fn default_max_emails() -> usize {
    20
}

fn default_batch_size() -> usize {
    5
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// A config for `email`/`password` with every other field at its default.
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            imap_server: default_imap_server(),
            imap_port: default_imap_port(),
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            cache_path: None,
            cache_expiry_secs: default_cache_expiry_secs(),
            max_emails: default_max_emails(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn validate(&self) -> Result<(), MailError> {
        if self.email.trim().is_empty() {
            return Err(MailError::Config("email must not be empty".into()));
        }
        if self.password.is_empty() {
            return Err(MailError::Config(format!(
                "password must not be empty (set it in the config file or {PASSWORD_ENV})"
            )));
        }
        if self.imap_server.trim().is_empty() || self.smtp_server.trim().is_empty() {
            return Err(MailError::Config("server host must not be empty".into()));
        }
        if self.cache_expiry_secs == 0 {
            return Err(MailError::Config("cache_expiry_secs must be positive".into()));
        }
        if self.max_emails == 0 {
            return Err(MailError::Config("max_emails must be positive".into()));
        }
        if self.batch_size == 0 {
            return Err(MailError::Config("batch_size must be positive".into()));
        }
        if self.timeout_secs == 0 {
            return Err(MailError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cache_expiry_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .ok_or_else(|| anyhow!("no config dir available"))?
        .join("gmail_mailer"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_cache_path() -> Result<PathBuf> {
    Ok(dirs::cache_dir()
        .ok_or_else(|| anyhow!("no cache dir available"))?
        .join("gmail_mailer")
        .join("email_cache.json"))
}

pub fn resolve_cache_path(cfg: &Config) -> Result<PathBuf> {
    if let Some(p) = &cfg.cache_path {
        Ok(PathBuf::from(p))
    } else {
        default_cache_path()
    }
}

/// Write a template config for users to edit. Existing files are left alone.
pub fn write_template(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let sample = Config::new("your-email@gmail.com", "your-app-password");
    fs::write(path, toml::to_string_pretty(&sample)?)?;
    Ok(true)
}

pub fn parse_config(s: &str) -> Result<Config> {
    let mut cfg: Config = toml::from_str(s)?;
    if let Ok(pw) = std::env::var(PASSWORD_ENV) {
        if !pw.is_empty() {
            cfg.password = pw;
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    if write_template(path)? {
        return Err(anyhow!(
            "Created template config at {}; edit it and run again",
            path.display()
        ));
    }
    let s = fs::read_to_string(path)?;
    parse_config(&s).map_err(|e| anyhow!("{}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_missing_fields() {
        let cfg: Config = toml::from_str(
            r#"
            email = "me@example.com"
            password = "secret"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.imap_server, "imap.gmail.com");
        assert_eq!(cfg.imap_port, 993);
        assert_eq!(cfg.smtp_port, 465);
        assert_eq!(cfg.cache_expiry(), Duration::from_secs(300));
        assert_eq!(cfg.max_emails, 20);
        assert_eq!(cfg.batch_size, 5);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_credentials_and_zero_sizes() {
        assert!(Config::new("", "secret").validate().is_err());
        assert!(Config::new("me@example.com", "").validate().is_err());

        let mut cfg = Config::new("me@example.com", "secret");
        cfg.batch_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::new("me@example.com", "secret");
        cfg.cache_expiry_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn missing_file_creates_template_and_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let err = load_config_from(&path).unwrap_err();
        assert!(err.to_string().contains("Created template config"));
        assert!(path.exists());

        let written: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.email, "your-email@gmail.com");
    }

    #[test]
    fn explicit_cache_path_wins() {
        let mut cfg = Config::new("me@example.com", "secret");
        cfg.cache_path = Some("/tmp/somewhere/cache.json".into());
        assert_eq!(
            resolve_cache_path(&cfg).unwrap(),
            PathBuf::from("/tmp/somewhere/cache.json")
        );
    }
}
