//! Telegram Bot API sink with HTML formatting.
//!
//! Delivers notifications via the Telegram Bot API `sendMessage` endpoint.
//! Messages go to a fixed chat, optionally into a message thread, with
//! HTML parse mode and link previews disabled.

use crate::traits::{NotificationSink, NotifyError};

use belegt_core::config::TelegramConfig;

/// Escapes the characters Telegram's HTML parse mode treats specially:
/// `&`, `<`, `>`.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Sends notifications via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramSink {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramSink {
    /// Creates a new `TelegramSink` from configuration values.
    ///
    /// Returns [`NotifyError::Config`] when token or chat id are missing —
    /// the process cannot announce anything without them.
    pub fn from_config(config: &TelegramConfig) -> Result<Self, NotifyError> {
        let bot_token = config
            .bot_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| NotifyError::Config("BOT_TOKEN is not set".to_string()))?;
        let chat_id = config
            .chat_id
            .clone()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| NotifyError::Config("CHAT_ID is not set".to_string()))?;

        Ok(Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl NotificationSink for TelegramSink {
    /// Sends a message via the Telegram `sendMessage` API.
    async fn send(&self, text: &str, thread: Option<i64>) -> Result<(), NotifyError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let mut body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(thread_id) = thread {
            body["message_thread_id"] = serde_json::Value::from(thread_id);
        }

        tracing::debug!(
            chat_id = %self.chat_id,
            thread = ?thread,
            "Sending Telegram notification"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        let resp_body: serde_json::Value = response.json().await?;

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::info!(chat_id = %self.chat_id, "Telegram notification sent");
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        Err(NotifyError::Config(format!(
            "Telegram API error: {description}"
        )))
    }

    /// Returns the channel name for this sink.
    fn channel_name(&self) -> &str {
        "telegram"
    }
}
