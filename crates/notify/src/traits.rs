//! Notification sink trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// A delivery channel for team notifications.
///
/// Fire-and-forget from the caller's point of view: delivery is attempted
/// once, failures are reported but never retried here.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `text` to the configured chat, optionally into a sub-thread.
    async fn send(&self, text: &str, thread: Option<i64>) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}
