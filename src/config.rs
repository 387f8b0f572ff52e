use std::env;
use std::time::Duration;

use crate::error::RelayError;

/// Runtime configuration for the relay, sourced from the environment.
///
/// Credentials are read eagerly but validated per request, so a misconfigured
/// deployment still answers every request with a structured error instead of
/// failing to boot.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Market data provider API key (`FINNHUB_API_KEY`)
    pub quote_api_key: String,
    /// Telegram bot token (`TELEGRAM_BOT_TOKEN`)
    pub bot_token: String,
    /// Target chat: numeric id or `@channelname` (`TELEGRAM_CHAT_ID`)
    pub chat_id: String,
    /// Production mode suppresses error detail in responses
    pub production: bool,
    /// Deadline for the quote fetch
    pub quote_timeout: Duration,
    /// Per-attempt deadline for the notification send
    pub notify_timeout: Duration,
    /// How long a cached success payload stays servable
    pub cache_ttl: Duration,
    /// Total notification attempts before surfacing failure
    pub notify_max_attempts: u32,
    /// Backoff between notification attempts grows by this step per attempt
    pub notify_backoff_step: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            quote_api_key: String::new(),
            bot_token: String::new(),
            chat_id: String::new(),
            production: false,
            quote_timeout: Duration::from_millis(5000),
            notify_timeout: Duration::from_millis(3000),
            cache_ttl: Duration::from_secs(30),
            notify_max_attempts: 3,
            notify_backoff_step: Duration::from_millis(1000),
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Self {
        Self {
            quote_api_key: env_or_empty("FINNHUB_API_KEY"),
            bot_token: env_or_empty("TELEGRAM_BOT_TOKEN"),
            chat_id: env_or_empty("TELEGRAM_CHAT_ID"),
            production: is_production_environment(),
            ..Default::default()
        }
    }

    /// Fails with the first missing credential, named so the operator can fix it.
    pub fn validate(&self) -> Result<(), RelayError> {
        let required = [
            ("FINNHUB_API_KEY", &self.quote_api_key),
            ("TELEGRAM_BOT_TOKEN", &self.bot_token),
            ("TELEGRAM_CHAT_ID", &self.chat_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(RelayError::Configuration(format!("{name} is not set")));
            }
        }
        Ok(())
    }
}

fn env_or_empty(name: &str) -> String {
    env::var(name).unwrap_or_default()
}

pub fn is_production_environment() -> bool {
    // Check common production environment indicators
    env::var("VERCEL").is_ok() ||
    env::var("ENVIRONMENT").map(|v| v == "production").unwrap_or(false) ||
    env::var("NODE_ENV").map(|v| v == "production").unwrap_or(false) ||
    env::var("DEPLOYMENT_ENV").map(|v| v == "production").unwrap_or(false) ||
    // Lambda is also production
    crate::deployment::is_lambda_environment()
}
