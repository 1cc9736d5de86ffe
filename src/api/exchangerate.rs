use std::collections::HashMap;

use log::debug;
use serde::Deserialize;

use super::RateSource;
use crate::error::RateWatchError;

/// One decoded response from the rate service.
///
/// The service reports failures in-band, so `result` has to be inspected
/// before `conversion_rates` means anything.
#[derive(Debug, Deserialize)]
pub struct RateSnapshot {
    pub result: String,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub conversion_rates: HashMap<String, f64>,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(default)]
    pub time_last_update_utc: Option<String>,
}

impl RateSnapshot {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }

    pub fn rate(&self, currency: &str) -> Option<f64> {
        self.conversion_rates.get(currency).copied()
    }
}

pub struct ExchangeRateClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ExchangeRateClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn latest_url(&self, base: &str) -> String {
        format!("{}/{}/latest/{}", self.base_url, self.api_key, base)
    }
}

impl RateSource for ExchangeRateClient {
    async fn latest(&self, base: &str) -> Result<RateSnapshot, RateWatchError> {
        debug!("Fetching latest rates for {}", base);

        // Error replies still carry a JSON body, so the status is not checked here.
        let body = self
            .http
            .get(self.latest_url(base))
            .send()
            .await
            .map_err(RateWatchError::transport)?
            .text()
            .await
            .map_err(RateWatchError::transport)?;

        let snapshot: RateSnapshot = serde_json::from_str(&body)?;
        debug!(
            "Rates for {} last updated {}",
            snapshot.base_code.as_deref().unwrap_or(base),
            snapshot.time_last_update_utc.as_deref().unwrap_or("(unknown)")
        );
        Ok(snapshot)
    }
}
