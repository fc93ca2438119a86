//! Pending reservations: the bridge between "select server" and
//! "confirm with an issue or skip".
//!
//! Sessions are in-memory only and bounded by a TTL so an abandoned
//! selection cannot linger forever. Nothing here touches the store.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use belegt_core::ServerId;

/// A pending server selection by one actor, not yet committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    /// Correlation id for logs.
    pub id: Uuid,
    pub server: ServerId,
    pub created_at: DateTime<Utc>,
}

/// In-memory pending reservations, keyed by actor identity.
pub struct SessionStore {
    ttl: chrono::Duration,
    sessions: RwLock<HashMap<String, Reservation>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(600)),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a reservation for `actor`. A previous pending reservation by
    /// the same actor is replaced.
    pub async fn begin(&self, actor: &str, server: ServerId) -> Reservation {
        self.begin_at(actor, server, Utc::now()).await
    }

    /// Like [`begin`](Self::begin) with an explicit clock, for tests.
    pub async fn begin_at(
        &self,
        actor: &str,
        server: ServerId,
        now: DateTime<Utc>,
    ) -> Reservation {
        let reservation = Reservation {
            id: Uuid::new_v4(),
            server,
            created_at: now,
        };
        let mut sessions = self.sessions.write().await;
        if let Some(old) = sessions.insert(actor.to_string(), reservation.clone()) {
            debug!(actor, replaced = %old.id, "previous pending reservation replaced");
        }
        info!(actor, reservation = %reservation.id, server = %server, "reservation started");
        reservation
    }

    /// Remove and return the actor's pending reservation, if it exists and
    /// has not expired. An expired session is dropped either way.
    pub async fn take(&self, actor: &str) -> Option<Reservation> {
        self.take_at(actor, Utc::now()).await
    }

    /// Like [`take`](Self::take) with an explicit clock, for tests.
    pub async fn take_at(&self, actor: &str, now: DateTime<Utc>) -> Option<Reservation> {
        let mut sessions = self.sessions.write().await;
        let reservation = sessions.remove(actor)?;
        if self.expired(&reservation, now) {
            info!(actor, reservation = %reservation.id, "pending reservation expired");
            return None;
        }
        Some(reservation)
    }

    /// Discard the actor's pending reservation. Returns whether one existed.
    pub async fn cancel(&self, actor: &str) -> bool {
        let removed = self.sessions.write().await.remove(actor);
        if let Some(reservation) = &removed {
            info!(actor, reservation = %reservation.id, "reservation cancelled");
        }
        removed.is_some()
    }

    /// Drop every expired session. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Utc::now()).await
    }

    /// Like [`purge_expired`](Self::purge_expired) with an explicit clock.
    pub async fn purge_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, r| !self.expired(r, now));
        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, "expired reservations dropped");
        }
        purged
    }

    /// Number of pending reservations.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn expired(&self, reservation: &Reservation, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(reservation.created_at) > self.ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> SessionStore {
        SessionStore::new(Duration::from_secs(600))
    }

    #[tokio::test]
    async fn begin_take_round_trip() {
        let sessions = store();
        let created = sessions.begin("@alice", ServerId::X86).await;
        let taken = sessions.take("@alice").await.unwrap();
        assert_eq!(taken, created);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn take_unknown_actor_is_none() {
        let sessions = store();
        assert!(sessions.take("@nobody").await.is_none());
    }

    #[tokio::test]
    async fn begin_replaces_previous_selection() {
        let sessions = store();
        sessions.begin("@alice", ServerId::X86).await;
        sessions.begin("@alice", ServerId::Arm).await;

        assert_eq!(sessions.len().await, 1);
        assert_eq!(sessions.take("@alice").await.unwrap().server, ServerId::Arm);
    }

    #[tokio::test]
    async fn expired_session_cannot_be_taken() {
        let sessions = store();
        let created = sessions.begin("@alice", ServerId::X86).await;

        let later = created.created_at + chrono::Duration::seconds(601);
        assert!(sessions.take_at("@alice", later).await.is_none());
        // Dropped on the failed take, not lingering.
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn session_within_ttl_is_taken() {
        let sessions = store();
        let created = sessions.begin("@alice", ServerId::X86).await;

        let later = created.created_at + chrono::Duration::seconds(599);
        assert!(sessions.take_at("@alice", later).await.is_some());
    }

    #[tokio::test]
    async fn cancel_discards_pending() {
        let sessions = store();
        sessions.begin("@alice", ServerId::X86).await;

        assert!(sessions.cancel("@alice").await);
        assert!(!sessions.cancel("@alice").await);
        assert!(sessions.take("@alice").await.is_none());
    }

    #[tokio::test]
    async fn purge_removes_only_stale_sessions() {
        let sessions = store();
        let t0: DateTime<Utc> = "2026-01-09T09:00:00Z".parse().unwrap();
        sessions.begin_at("@alice", ServerId::X86, t0).await;
        sessions
            .begin_at("@bob", ServerId::Arm, t0 + chrono::Duration::seconds(300))
            .await;

        let now = t0 + chrono::Duration::seconds(601);
        let purged = sessions.purge_expired_at(now).await;

        assert_eq!(purged, 1);
        assert_eq!(sessions.len().await, 1);
        assert!(sessions.take_at("@bob", now).await.is_some());
    }
}
