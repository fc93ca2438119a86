//! Escalation sweep: nag occupants whose holds outlived the threshold.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use belegt_core::business_days;
use belegt_notify::NotificationSink;
use belegt_occupancy::OccupancyManager;
use belegt_scheduler::Job;

/// Sweeps the occupancy table and alerts on every hold older than the
/// business-day threshold. Deliberately stateless: a hold that stays
/// overdue gets re-alerted on every run.
pub struct EscalationJob {
    manager: Arc<OccupancyManager>,
    sink: Arc<dyn NotificationSink>,
    threshold_days: u64,
    thread: Option<i64>,
}

impl EscalationJob {
    pub fn new(
        manager: Arc<OccupancyManager>,
        sink: Arc<dyn NotificationSink>,
        threshold_days: u64,
        thread: Option<i64>,
    ) -> Self {
        Self {
            manager,
            sink,
            threshold_days,
            thread,
        }
    }
}

#[async_trait]
impl Job for EscalationJob {
    fn name(&self) -> &str {
        "escalation"
    }

    async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()> {
        let table = self.manager.status().await;

        for (server, record) in table {
            // A start instant in the future is bogus; skip it rather than
            // letting one bad record derail the sweep.
            if record.since > now {
                warn!(server = %server, since = %record.since, "skipping record dated in the future");
                continue;
            }

            let days = u64::from(business_days(record.since, now));
            if days <= self.threshold_days {
                debug!(server = %server, days, "hold within threshold");
                continue;
            }

            let text = format!(
                "⚠️ {}, server `{}` has been occupied for {} business days (more than {}). \
                 Don't forget to release it if you're not using it!",
                record.user,
                server.display_name(),
                days,
                self.threshold_days,
            );
            if let Err(e) = self.sink.send(&text, self.thread).await {
                warn!(server = %server, error = %e, "failed to send escalation alert");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::Mutex;

    use belegt_core::{OccupancyRecord, ServerId};
    use belegt_notify::NotifyError;
    use belegt_occupancy::{Coordinator, SessionStore};
    use belegt_store::FileStore;

    use super::*;

    /// Sink that records every message it was asked to deliver.
    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<(String, Option<i64>)>>,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, text: &str, thread: Option<i64>) -> Result<(), NotifyError> {
            self.sent.lock().await.push((text.to_string(), thread));
            Ok(())
        }

        fn channel_name(&self) -> &str {
            "recording"
        }
    }

    struct NeverLookup;

    #[async_trait]
    impl belegt_jira::IssueLookup for NeverLookup {
        async fn lookup(
            &self,
            _key: &str,
        ) -> Result<Option<belegt_core::IssueRef>, belegt_jira::LookupError> {
            Ok(None)
        }
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    /// Build a manager over a temp store holding the given records.
    async fn seeded_manager(
        dir: &tempfile::TempDir,
        records: Vec<(ServerId, &str, &str)>,
    ) -> Arc<OccupancyManager> {
        let path = dir.path().join("occupancy.json");
        {
            let store = FileStore::new(&path).unwrap();
            let mut table = belegt_core::OccupancyTable::new();
            for (server, user, since) in records {
                table.insert(server, OccupancyRecord::starting_at(user, None, at(since)));
            }
            store.save(&table).unwrap();
        }
        let store = FileStore::new(&path).unwrap();
        Arc::new(OccupancyManager::new(store).unwrap())
    }

    #[tokio::test]
    async fn overdue_hold_is_alerted_and_realerted() {
        let dir = tempfile::tempdir().unwrap();
        // 2026-01-05 (Mon) through 2026-01-14 (Wed) is 8 business days.
        let manager = seeded_manager(
            &dir,
            vec![(ServerId::X86, "@alice", "2026-01-05T09:00:00Z")],
        )
        .await;
        let sink = Arc::new(RecordingSink::default());
        let job = EscalationJob::new(manager, sink.clone(), 5, Some(42));

        let now = at("2026-01-14T09:00:00Z");
        job.run(now).await.unwrap();

        {
            let sent = sink.sent.lock().await;
            assert_eq!(sent.len(), 1);
            let (text, thread) = &sent[0];
            assert!(text.contains("@alice"));
            assert!(text.contains("server1"));
            assert!(text.contains("8 business days"));
            assert_eq!(*thread, Some(42));
        }

        // No dedup: a second run with unchanged state re-alerts.
        job.run(now).await.unwrap();
        assert_eq!(sink.sent.lock().await.len(), 2);
    }

    #[tokio::test]
    async fn hold_at_threshold_is_not_alerted() {
        let dir = tempfile::tempdir().unwrap();
        // 2026-01-05 (Mon) through 2026-01-09 (Fri) is exactly 5 business days.
        let manager = seeded_manager(
            &dir,
            vec![(ServerId::X86, "@alice", "2026-01-05T09:00:00Z")],
        )
        .await;
        let sink = Arc::new(RecordingSink::default());
        let job = EscalationJob::new(manager, sink.clone(), 5, None);

        job.run(at("2026-01-09T17:00:00Z")).await.unwrap();
        assert!(sink.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn future_dated_record_is_skipped_rest_of_sweep_runs() {
        let dir = tempfile::tempdir().unwrap();
        let manager = seeded_manager(
            &dir,
            vec![
                (ServerId::X86, "@alice", "2026-02-01T09:00:00Z"),
                (ServerId::Arm, "@bob", "2026-01-05T09:00:00Z"),
            ],
        )
        .await;
        let sink = Arc::new(RecordingSink::default());
        let job = EscalationJob::new(manager, sink.clone(), 5, None);

        job.run(at("2026-01-14T09:00:00Z")).await.unwrap();

        let sent = sink.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].0.contains("@bob"));
    }

    #[tokio::test]
    async fn empty_table_sends_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = seeded_manager(&dir, vec![]).await;
        let sink = Arc::new(RecordingSink::default());
        let job = EscalationJob::new(manager, sink.clone(), 5, None);

        job.run(at("2026-01-14T09:00:00Z")).await.unwrap();
        assert!(sink.sent.lock().await.is_empty());
    }

    #[tokio::test]
    async fn freshly_released_server_stops_alerting() {
        let dir = tempfile::tempdir().unwrap();
        let manager = seeded_manager(
            &dir,
            vec![(ServerId::X86, "@alice", "2026-01-05T09:00:00Z")],
        )
        .await;
        let sink = Arc::new(RecordingSink::default());

        // Release through the coordinator, the way the transport would.
        let coordinator = Coordinator::new(
            Arc::clone(&manager),
            SessionStore::new(Duration::from_secs(600)),
            Arc::new(NeverLookup),
        );
        coordinator.release("x86").await.unwrap();

        let job = EscalationJob::new(manager, sink.clone(), 5, None);
        job.run(at("2026-01-14T09:00:00Z")).await.unwrap();
        assert!(sink.sent.lock().await.is_empty());
    }
}
