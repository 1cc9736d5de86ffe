use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_INTERVAL_MINUTES: u64 = 15;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BASE_CURRENCY: &str = "GBP";
const DEFAULT_TARGET_CURRENCY: &str = "EUR";
const DEFAULT_EXCHANGE_API_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Everything read from the environment at startup. Immutable afterwards.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub notification_threshold: f64,
    pub check_interval: Duration,
    pub base_currency: String,
    pub target_currency: String,
    pub request_timeout: Duration,
    pub exchange_api_url: String,
    pub telegram_api_url: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                  | Default                               |
    /// |--------------------------|---------------------------------------|
    /// | `API_KEY`                | required                              |
    /// | `TELEGRAM_TOKEN`         | required                              |
    /// | `TELEGRAM_CHAT_ID`       | required                              |
    /// | `NOTIFICATION_THRESHOLD` | required                              |
    /// | `CHECK_INTERVAL_MINUTES` | `15`                                  |
    /// | `BASE_CURRENCY`          | `GBP`                                 |
    /// | `TARGET_CURRENCY`        | `EUR`                                 |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                  |
    /// | `EXCHANGE_API_URL`       | `https://v6.exchangerate-api.com/v6`  |
    /// | `TELEGRAM_API_URL`       | `https://api.telegram.org`            |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values are treated as unset.
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let api_key = required("API_KEY")?;
        let telegram_token = required("TELEGRAM_TOKEN")?;
        let telegram_chat_id = required("TELEGRAM_CHAT_ID")?;
        let notification_threshold = parse_threshold(required("NOTIFICATION_THRESHOLD")?)?;

        // Values too large to express in seconds fall back like any other bad input.
        let interval_secs = get("CHECK_INTERVAL_MINUTES")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&m| m > 0)
            .and_then(|m| m.checked_mul(60))
            .unwrap_or(DEFAULT_INTERVAL_MINUTES * 60);

        let timeout_secs = get("REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|&s| s > 0)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Self {
            api_key,
            telegram_token,
            telegram_chat_id,
            notification_threshold,
            check_interval: Duration::from_secs(interval_secs),
            base_currency: get("BASE_CURRENCY").unwrap_or_else(|| DEFAULT_BASE_CURRENCY.into()),
            target_currency: get("TARGET_CURRENCY")
                .unwrap_or_else(|| DEFAULT_TARGET_CURRENCY.into()),
            request_timeout: Duration::from_secs(timeout_secs),
            exchange_api_url: get("EXCHANGE_API_URL")
                .unwrap_or_else(|| DEFAULT_EXCHANGE_API_URL.into()),
            telegram_api_url: get("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.into()),
        })
    }
}

fn parse_threshold(value: String) -> Result<f64, ConfigError> {
    match value.parse::<f64>() {
        Ok(t) if t.is_finite() => Ok(t),
        Ok(_) => Err(ConfigError::InvalidThreshold {
            value,
            reason: "threshold must be a finite number".into(),
        }),
        Err(e) => Err(ConfigError::InvalidThreshold {
            value,
            reason: e.to_string(),
        }),
    }
}

// Credentials stay out of the logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("notification_threshold", &self.notification_threshold)
            .field("check_interval", &self.check_interval)
            .field("base_currency", &self.base_currency)
            .field("target_currency", &self.target_currency)
            .field("request_timeout", &self.request_timeout)
            .field("exchange_api_url", &self.exchange_api_url)
            .field("telegram_api_url", &self.telegram_api_url)
            .finish()
    }
}
