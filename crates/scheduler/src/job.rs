//! Job trait: the unit of scheduled work.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A named unit of scheduled work. Jobs own their collaborators; the
/// scheduler only decides when to invoke them.
///
/// `now` is the tick instant the job was fired for, so time-dependent jobs
/// stay deterministic under test.
#[async_trait]
pub trait Job: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, now: DateTime<Utc>) -> anyhow::Result<()>;
}
