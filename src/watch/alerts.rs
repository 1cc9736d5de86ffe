use std::fmt;

use log::{error, info, warn};

use crate::api::exchangerate::RateSnapshot;
use crate::api::{Notifier, RateSource};
use crate::config::Config;
use crate::error::RateWatchError;

/// What the poll loop should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Continue,
    Stop,
}

/// Markdown text sent when the threshold is crossed.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub base: String,
    pub target: String,
    pub threshold: f64,
    pub rate: f64,
}

impl fmt::Display for AlertMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "🔔 *Exchange alert {base}/{target}!*\n\n\
             The rate has exceeded the threshold of *{threshold:.4}*.\n\n\
             Current value: `1 {base} = {rate:.4} {target}`",
            base = self.base,
            target = self.target,
            threshold = self.threshold,
            rate = self.rate,
        )
    }
}

pub struct AlertEngine<'a> {
    config: &'a Config,
}

impl<'a> AlertEngine<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Pulls the target rate out of a snapshot, rejecting in-band failures.
    pub fn rate_from(&self, snapshot: &RateSnapshot) -> Result<f64, RateWatchError> {
        if !snapshot.is_success() {
            let kind = snapshot.error_type.as_deref().unwrap_or("unknown");
            return Err(RateWatchError::Api(kind.to_string()));
        }
        snapshot
            .rate(&self.config.target_currency)
            .ok_or_else(|| RateWatchError::CurrencyNotFound(self.config.target_currency.clone()))
    }

    /// Strictly greater than; a rate equal to the threshold does not alert.
    pub fn exceeded(&self, rate: f64) -> bool {
        rate > self.config.notification_threshold
    }

    pub fn message(&self, rate: f64) -> AlertMessage {
        AlertMessage {
            base: self.config.base_currency.clone(),
            target: self.config.target_currency.clone(),
            threshold: self.config.notification_threshold,
            rate,
        }
    }

    /// Runs one tick: fetch, compare, and notify on a breach.
    ///
    /// Every failure is logged and absorbed here. Once the threshold is
    /// crossed the answer is [`Tick::Stop`] whether or not the notification
    /// was delivered.
    pub async fn check<S, N>(&self, source: &S, notifier: &N) -> Tick
    where
        S: RateSource,
        N: Notifier,
    {
        let cfg = self.config;

        let snapshot = match source.latest(&cfg.base_currency).await {
            Ok(snapshot) => snapshot,
            Err(RateWatchError::Decode(e)) => {
                warn!("Failed to decode exchange API response: {}", e);
                return Tick::Continue;
            }
            Err(e) => {
                error!("Exchange API request failed: {}", e);
                return Tick::Continue;
            }
        };

        let rate = match self.rate_from(&snapshot) {
            Ok(rate) => rate,
            Err(e) => {
                warn!("{}", e);
                return Tick::Continue;
            }
        };

        let ts = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        println!(
            "[{}] Current rate: 1 {} = {:.4} {}",
            ts, cfg.base_currency, rate, cfg.target_currency
        );
        info!("1 {} = {:.4} {}", cfg.base_currency, rate, cfg.target_currency);

        if !self.exceeded(rate) {
            return Tick::Continue;
        }

        info!(
            "--- THRESHOLD EXCEEDED --- {:.4} > {:.4}, sending Telegram notification",
            rate, cfg.notification_threshold
        );
        match notifier.send(&self.message(rate).to_string()).await {
            Ok(()) => info!("Notification sent, stopping"),
            Err(e) => error!("Could not send Telegram notification, stopping anyway: {}", e),
        }
        Tick::Stop
    }
}
