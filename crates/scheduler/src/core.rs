//! [`Scheduler`] — manages firing state for all registered jobs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::job::Job;
use crate::trigger::Trigger;

/// Firing state for a single registered job.
struct JobEntry {
    job: Arc<dyn Job>,
    trigger: Trigger,
    last_fired: Option<DateTime<Utc>>,
}

/// Dispatches registered jobs when their triggers come due.
///
/// Use [`due_jobs`](Scheduler::due_jobs)/[`mark_fired`](Scheduler::mark_fired)
/// to drive the scheduler deterministically in tests; [`run`](Scheduler::run)
/// is the production tick loop.
pub struct Scheduler {
    entries: Vec<JobEntry>,
    tick: Duration,
}

impl Scheduler {
    /// Create an empty scheduler that checks triggers every `tick`.
    pub fn new(tick: Duration) -> Self {
        Self {
            entries: Vec::new(),
            tick,
        }
    }

    /// Register a job with its trigger.
    pub fn add_job(&mut self, job: Arc<dyn Job>, trigger: Trigger) {
        info!(job = %job.name(), trigger = ?trigger, "registered job");
        self.entries.push(JobEntry {
            job,
            trigger,
            last_fired: None,
        });
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the scheduler has no jobs.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the jobs due at `now`. Does not mark anything fired.
    pub fn due_jobs(&self, now: DateTime<Utc>) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.trigger.is_due(now, e.last_fired))
            .map(|e| e.job.name())
            .collect()
    }

    /// Record that a job fired at `at`.
    pub fn mark_fired(&mut self, name: &str, at: DateTime<Utc>) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.job.name() == name) {
            entry.last_fired = Some(at);
        }
    }

    /// Collect the jobs due at `now` and mark them fired.
    fn take_due(&mut self, now: DateTime<Utc>) -> Vec<Arc<dyn Job>> {
        let mut due = Vec::new();
        for entry in &mut self.entries {
            if entry.trigger.is_due(now, entry.last_fired) {
                entry.last_fired = Some(now);
                due.push(Arc::clone(&entry.job));
            }
        }
        due
    }

    /// Run the tick loop until `shutdown` is notified.
    ///
    /// Each due job is spawned on its own task: a long-running or failing
    /// job never delays or blocks the other jobs' invocations.
    pub async fn run(mut self, shutdown: Arc<Notify>) {
        info!(jobs = self.entries.len(), tick = ?self.tick, "scheduler started");
        let mut interval = tokio::time::interval(self.tick);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Utc::now();
                    for job in self.take_due(now) {
                        let name = job.name().to_string();
                        debug!(job = %name, "job due");
                        tokio::spawn(async move {
                            if let Err(e) = job.run(now).await {
                                warn!(job = %name, error = %e, "job failed");
                            }
                        });
                    }
                }
                _ = shutdown.notified() => {
                    info!("scheduler shutting down");
                    break;
                }
            }
        }
    }
}
