//! Configuration loading for the journal daemon.
//!
//! Loads configuration from TOML files and/or environment variables using figment.
//! This makes the server container-friendly by supporting both config files
//! and environment variable overrides.
//!
//! # Configuration Sources (in order of priority, lowest to highest)
//!
//! 1. Default values (from `#[serde(default)]` attributes)
//! 2. TOML config file (if provided)
//! 3. Environment variables (prefix: `JOURNAL_`, nested with `__`)
//!
//! # Environment Variable Naming
//!
//! Environment variables use the `JOURNAL_` prefix with double-underscore for nesting:
//!
//! - `JOURNAL_HTTP__LISTEN_ADDR` → `http.listen_addr`
//! - `JOURNAL_AUTH__ADMIN_USERNAME` → `auth.admin_username`
//! - `JOURNAL_AUTH__ADMIN_PASSWORD` → `auth.admin_password`
//! - `JOURNAL_AUTH__SESSION_SECRET` → `auth.session_secret`
//! - `JOURNAL_DATABASE__PATH` → `database.path`
//! - `JOURNAL_UPLOADS__DIR` → `uploads.dir`

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the journal daemon.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Admin credentials and session signing
    pub auth: AuthConfig,

    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Upload storage settings.
    #[serde(default)]
    pub uploads: UploadConfig,

    /// Site presentation settings.
    #[serde(default)]
    pub site: SiteConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Address to listen on
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Admin authentication configuration.
///
/// A single static credential pair; the session gate compares submitted
/// credentials against these after trimming whitespace. `session_secret`
/// signs session tokens, so rotating it logs the admin out everywhere.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Admin username
    pub admin_username: String,

    /// Admin password (compared verbatim, single-operator site)
    pub admin_password: String,

    /// HMAC key for session tokens
    pub session_secret: String,

    /// Session validity window in days
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: i64,

    /// Set the `Secure` attribute on session cookies (enable behind HTTPS)
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_session_ttl_days() -> i64 {
    7
}

/// SQLite database configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    /// If not specified, defaults to `journal.db` in the data directory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Upload storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Directory uploaded media is written to.
    /// If not specified, defaults to `uploads/` in the data directory.
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_max_upload_bytes() -> usize {
    25 * 1024 * 1024
}

/// Site presentation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteConfig {
    /// Title shown on public pages
    #[serde(default = "default_site_title")]
    pub title: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
        }
    }
}

fn default_site_title() -> String {
    "Journal".to_string()
}

impl Config {
    /// Load configuration from TOML file and environment variables.
    ///
    /// Configuration sources are merged in order (later sources override earlier):
    /// 1. TOML config file (if it exists)
    /// 2. Environment variables (prefix: `JOURNAL_`, nested with `__`)
    ///
    /// # Example
    ///
    /// ```bash
    /// # Override listen address via environment variable
    /// export JOURNAL_HTTP__LISTEN_ADDR=0.0.0.0:3000
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let mut figment = Figment::new();

        // Add TOML file if it exists
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }

        // Add environment variables (always, to allow overrides)
        figment = figment.merge(Env::prefixed("JOURNAL_").split("__"));

        let config: Config = figment.extract().with_context(|| {
            format!(
                "Failed to load config from {} and environment",
                path.display()
            )
        })?;

        Ok(config)
    }

    /// Resolve the database file path against the data directory.
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| data_dir.join("journal.db"))
    }

    /// Resolve the upload directory against the data directory.
    pub fn upload_dir(&self, data_dir: &Path) -> PathBuf {
        self.uploads
            .dir
            .clone()
            .unwrap_or_else(|| data_dir.join("uploads"))
    }

    /// Get the default config file path
    /// - macOS: ~/Library/Application Support/inkpost/config.toml
    /// - Linux: ~/.config/inkpost/config.toml
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkpost")
            .join("config.toml")
    }

    /// Get the default data directory (for the database, uploads, logs)
    /// - macOS: ~/Library/Application Support/inkpost/
    /// - Linux: ~/.local/share/inkpost/
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("inkpost")
    }
}

/// Create a default configuration template
pub fn default_config_template() -> String {
    let data_dir = Config::default_data_dir();
    let data_dir_str = data_dir.display();

    format!(
        r#"# Journal Server Configuration
# Data directory: {data_dir_str}

[http]
listen_addr = "0.0.0.0:8080"

[auth]
# The single admin account. Credentials are compared verbatim after
# trimming whitespace; pick a long random session_secret; rotating it
# invalidates every outstanding session.
admin_username = "admin"
admin_password = "change-me"
session_secret = "generate-a-long-random-string"
# session_ttl_days = 7
# secure_cookies = true   # enable when serving over HTTPS

[database]
# path = "{data_dir_str}/journal.db"  # Optional, defaults to data_dir/journal.db

[uploads]
# dir = "{data_dir_str}/uploads"      # Optional, defaults to data_dir/uploads
# max_bytes = 26214400                # 25 MiB

[site]
title = "Journal"
"#
    )
}
