//! Configuration management for the order service
//!
//! Loads configuration from environment variables with development defaults.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Placeholder API key shipped in sample configs; notifications are skipped while it is set
pub const PLACEHOLDER_API_KEY: &str = "123456";

/// Public CallMeBot WhatsApp endpoint
pub const DEFAULT_GATEWAY_URL: &str = "https://api.callmebot.com/whatsapp.php";

const DEFAULT_SECRET_KEY: &str = "dev";

/// Settings for the WhatsApp notifier
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Destination phone number
    pub phone: String,

    /// Gateway API key
    pub api_key: String,

    /// Gateway endpoint, without query string
    pub gateway_url: String,

    /// Upper bound on a single gateway request
    pub timeout: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Application secret key
    pub secret_key: String,

    pub notifier: NotifierConfig,

    /// SQLite database file
    pub database_path: PathBuf,

    /// How long a connection waits on a locked database
    pub db_busy_timeout: Duration,

    /// Directory containing page templates
    pub templates_dir: PathBuf,

    /// Directory served under /static
    pub static_dir: PathBuf,

    /// Sitemap file served at /sitemap.xml
    pub sitemap_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (for local development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            host: var("HOST", "0.0.0.0"),

            port: var("PORT", "5000").parse().context("Invalid PORT")?,

            secret_key: var("SECRET_KEY", DEFAULT_SECRET_KEY),

            notifier: NotifierConfig {
                phone: var("WHATSAPP_PHONE", "254113211652"),
                api_key: var("WHATSAPP_API_KEY", PLACEHOLDER_API_KEY),
                gateway_url: var("WHATSAPP_GATEWAY_URL", DEFAULT_GATEWAY_URL),
                timeout: Duration::from_secs(
                    var("NOTIFY_TIMEOUT_SECS", "15")
                        .parse()
                        .context("Invalid NOTIFY_TIMEOUT_SECS")?,
                ),
            },

            database_path: var("DATABASE_PATH", "orders.db").into(),

            db_busy_timeout: Duration::from_millis(
                var("DB_BUSY_TIMEOUT_MS", "5000")
                    .parse()
                    .context("Invalid DB_BUSY_TIMEOUT_MS")?,
            ),

            templates_dir: var("TEMPLATES_DIR", "./templates").into(),

            static_dir: var("STATIC_DIR", "./static").into(),

            sitemap_path: var("SITEMAP_PATH", "sitemap.xml").into(),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("PORT must be greater than 0");
        }

        if self.notifier.timeout.is_zero() {
            anyhow::bail!("NOTIFY_TIMEOUT_SECS must be greater than 0");
        }

        if self.secret_key == DEFAULT_SECRET_KEY {
            warn!("SECRET_KEY not set, using the development default");
        }

        Ok(())
    }

    /// Get the server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
