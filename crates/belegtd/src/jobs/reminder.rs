//! Fixed-text reminder jobs (standup, time tracking).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use belegt_notify::NotificationSink;
use belegt_scheduler::Job;

/// Announces a fixed text to the main chat whenever it fires.
pub struct ReminderJob {
    name: String,
    text: String,
    sink: Arc<dyn NotificationSink>,
}

impl ReminderJob {
    pub fn new(
        name: impl Into<String>,
        text: impl Into<String>,
        sink: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            sink,
        }
    }
}

#[async_trait]
impl Job for ReminderJob {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _now: DateTime<Utc>) -> anyhow::Result<()> {
        if let Err(e) = self.sink.send(&self.text, None).await {
            warn!(job = %self.name, error = %e, "failed to send reminder");
        }
        Ok(())
    }
}
