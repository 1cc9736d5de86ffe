use super::Notifier;
use crate::error::RateWatchError;

/// Sends alerts through the Bot API `sendMessage` method.
pub struct TelegramNotifier {
    http: reqwest::Client,
    base_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(http: reqwest::Client, base_url: &str, token: &str, chat_id: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            chat_id: chat_id.to_string(),
        }
    }

    fn send_message_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.base_url, self.token)
    }
}

impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), RateWatchError> {
        let params = [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "Markdown"),
        ];

        let response = self
            .http
            .post(self.send_message_url())
            .form(&params)
            .send()
            .await
            .map_err(RateWatchError::transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("<unreadable body: {}>", e.without_url()));
            return Err(RateWatchError::Notification {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}
