pub mod exchangerate;
pub mod telegram;

use crate::error::RateWatchError;
use exchangerate::RateSnapshot;

/// Anything that can report the latest conversion rates for a base currency.
pub trait RateSource {
    async fn latest(&self, base: &str) -> Result<RateSnapshot, RateWatchError>;
}

/// Delivers a rendered alert to its destination.
pub trait Notifier {
    async fn send(&self, text: &str) -> Result<(), RateWatchError>;
}
