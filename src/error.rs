use thiserror::Error;

/// Fatal startup failures. Nothing touches the network until these are ruled out.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid value for NOTIFICATION_THRESHOLD ({value:?}): {reason}")]
    InvalidThreshold { value: String, reason: String },
}

/// Per-tick failures. None of these outlive the tick that produced them.
#[derive(Error, Debug)]
pub enum RateWatchError {
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("exchange API returned an error: {0}")]
    Api(String),

    #[error("currency '{0}' not found in conversion rates")]
    CurrencyNotFound(String),

    #[error("telegram returned an error ({status}): {body}")]
    Notification { status: u16, body: String },
}

impl RateWatchError {
    /// Wraps a transport failure with the request URL removed, since both
    /// services carry credentials in the path.
    pub fn transport(err: reqwest::Error) -> Self {
        RateWatchError::Transport(err.without_url())
    }
}
