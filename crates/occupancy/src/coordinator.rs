//! [`Coordinator`] — the operations the transport layer calls into.
//!
//! Claiming a server is a two-phase commit because issue validation is an
//! external, possibly slow call: first the actor selects a server (a
//! reservation session, nothing persisted), then confirms with an issue
//! key or the skip token. The lookup runs outside the manager's lock;
//! only the final occupy re-enters it, exactly once.

use std::sync::Arc;

use tracing::warn;

use belegt_core::catalog::ALL_SERVERS;
use belegt_core::{OccupancyRecord, OccupancyTable, ServerId};
use belegt_jira::{IssueLookup, LookupError};

use crate::error::OccupancyError;
use crate::manager::OccupancyManager;
use crate::session::{Reservation, SessionStore};

/// Confirm input meaning "occupy without an issue reference".
pub const SKIP_TOKEN: &str = "-";

pub struct Coordinator {
    manager: Arc<OccupancyManager>,
    sessions: SessionStore,
    lookup: Arc<dyn IssueLookup>,
}

impl Coordinator {
    pub fn new(
        manager: Arc<OccupancyManager>,
        sessions: SessionStore,
        lookup: Arc<dyn IssueLookup>,
    ) -> Self {
        Self {
            manager,
            sessions,
            lookup,
        }
    }

    /// The static server catalog with display names.
    pub fn list_catalog(&self) -> Vec<(ServerId, &'static str)> {
        ALL_SERVERS.iter().map(|id| (*id, id.display_name())).collect()
    }

    /// Snapshot of the current occupancy table.
    pub async fn status(&self) -> OccupancyTable {
        self.manager.status().await
    }

    /// Phase one: select a server. Rejects unknown ids before touching any
    /// state, and servers that are visibly occupied right now (the occupy
    /// in phase two stays the authoritative guard). Nothing is persisted.
    pub async fn begin_reservation(
        &self,
        actor: &str,
        server: &str,
    ) -> Result<Reservation, OccupancyError> {
        // Opportunistic sweep so abandoned selections don't pile up.
        self.sessions.purge_expired().await;

        let server: ServerId = server
            .parse()
            .map_err(|e: belegt_core::catalog::UnknownServer| OccupancyError::UnknownServer(e.0))?;

        if let Some(existing) = self.manager.status().await.get(&server) {
            return Err(OccupancyError::AlreadyOccupied {
                server,
                occupant: existing.user.clone(),
            });
        }

        Ok(self.sessions.begin(actor, server).await)
    }

    /// Phase two: commit the pending reservation.
    ///
    /// `issue_input` is either the skip token or an issue key (case folded
    /// to uppercase). The session is consumed up front, so a failed lookup
    /// discards the attempt and nothing is ever persisted for it.
    pub async fn confirm_reservation(
        &self,
        actor: &str,
        issue_input: &str,
    ) -> Result<OccupancyRecord, OccupancyError> {
        let Some(reservation) = self.sessions.take(actor).await else {
            return Err(OccupancyError::NoPendingReservation(actor.to_string()));
        };

        let input = issue_input.trim();
        let issue = if input == SKIP_TOKEN {
            None
        } else {
            let key = input.to_uppercase();
            match self.lookup.lookup(&key).await {
                Ok(Some(issue)) => Some(issue),
                Ok(None) => return Err(OccupancyError::IssueNotFound(key)),
                Err(LookupError::Timeout) => {
                    warn!(issue = %key, reservation = %reservation.id, "issue lookup timed out");
                    return Err(OccupancyError::IssueLookupTimeout(key));
                }
                Err(e) => {
                    warn!(issue = %key, reservation = %reservation.id, error = %e, "issue lookup failed");
                    return Err(OccupancyError::IssueNotFound(key));
                }
            }
        };

        self.manager.occupy(reservation.server, actor, issue).await
    }

    /// Discard the actor's pending reservation, if any.
    pub async fn cancel_reservation(&self, actor: &str) -> bool {
        self.sessions.cancel(actor).await
    }

    /// Release a server by id string, returning the prior occupant.
    pub async fn release(&self, server: &str) -> Result<String, OccupancyError> {
        let server: ServerId = server
            .parse()
            .map_err(|e: belegt_core::catalog::UnknownServer| OccupancyError::UnknownServer(e.0))?;
        self.manager.release(server).await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use belegt_core::IssueRef;
    use belegt_store::FileStore;

    use super::*;

    /// Scripted lookup stub.
    enum StubLookup {
        Found(IssueRef),
        NotFound,
        Timeout,
    }

    #[async_trait]
    impl IssueLookup for StubLookup {
        async fn lookup(&self, _key: &str) -> Result<Option<IssueRef>, LookupError> {
            match self {
                StubLookup::Found(issue) => Ok(Some(issue.clone())),
                StubLookup::NotFound => Ok(None),
                StubLookup::Timeout => Err(LookupError::Timeout),
            }
        }
    }

    fn issue() -> IssueRef {
        IssueRef {
            key: "DEVQA-5003".to_string(),
            summary: "Flash new firmware".to_string(),
            url: "https://jira.example.com/browse/DEVQA-5003".to_string(),
        }
    }

    fn coordinator_in(dir: &tempfile::TempDir, lookup: StubLookup) -> Coordinator {
        let store = FileStore::new(dir.path().join("occupancy.json")).unwrap();
        let manager = Arc::new(OccupancyManager::new(store).unwrap());
        Coordinator::new(
            manager,
            SessionStore::new(Duration::from_secs(600)),
            Arc::new(lookup),
        )
    }

    fn disk_state(dir: &tempfile::TempDir) -> Option<String> {
        std::fs::read_to_string(dir.path().join("occupancy.json")).ok()
    }

    #[tokio::test]
    async fn catalog_lists_all_servers() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        let catalog = coordinator.list_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(&(ServerId::X86, "server1")));
        assert!(catalog.contains(&(ServerId::Arm, "server2")));
    }

    #[tokio::test]
    async fn skip_token_occupies_without_issue() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        let record = coordinator.confirm_reservation("@alice", "-").await.unwrap();

        assert_eq!(record.user, "@alice");
        assert!(record.issue().is_none());
        assert_eq!(coordinator.status().await.len(), 1);
    }

    #[tokio::test]
    async fn found_issue_is_attached_to_the_record() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::Found(issue()));

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        let record = coordinator
            .confirm_reservation("@alice", "devqa-5003")
            .await
            .unwrap();

        assert_eq!(record.issue(), Some(issue()));
    }

    #[tokio::test]
    async fn unknown_server_rejected_before_any_state() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        let err = coordinator
            .begin_reservation("@alice", "riscv")
            .await
            .unwrap_err();
        assert!(matches!(err, OccupancyError::UnknownServer(ref s) if s == "riscv"));
        assert!(disk_state(&dir).is_none());
    }

    #[tokio::test]
    async fn begin_on_occupied_server_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        coordinator.confirm_reservation("@alice", "-").await.unwrap();

        let err = coordinator
            .begin_reservation("@bob", "x86")
            .await
            .unwrap_err();
        assert!(matches!(err, OccupancyError::AlreadyOccupied { .. }));
    }

    #[tokio::test]
    async fn failed_lookup_aborts_and_discards_session() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        let err = coordinator
            .confirm_reservation("@alice", "DEVQA-404")
            .await
            .unwrap_err();
        assert!(matches!(err, OccupancyError::IssueNotFound(ref k) if k == "DEVQA-404"));

        // Nothing persisted, and the session is gone: a retry must restart.
        assert!(coordinator.status().await.is_empty());
        let err = coordinator.confirm_reservation("@alice", "-").await.unwrap_err();
        assert!(matches!(err, OccupancyError::NoPendingReservation(_)));
    }

    #[tokio::test]
    async fn lookup_timeout_is_distinct_but_also_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::Timeout);

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        let err = coordinator
            .confirm_reservation("@alice", "DEVQA-1")
            .await
            .unwrap_err();
        assert!(matches!(err, OccupancyError::IssueLookupTimeout(_)));
        assert!(coordinator.status().await.is_empty());
    }

    #[tokio::test]
    async fn issue_key_is_uppercased_for_lookup() {
        struct KeyAssertingLookup;

        #[async_trait]
        impl IssueLookup for KeyAssertingLookup {
            async fn lookup(&self, key: &str) -> Result<Option<IssueRef>, LookupError> {
                assert_eq!(key, "DEVQA-5003");
                Ok(None)
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("occupancy.json")).unwrap();
        let manager = Arc::new(OccupancyManager::new(store).unwrap());
        let coordinator = Coordinator::new(
            manager,
            SessionStore::new(Duration::from_secs(600)),
            Arc::new(KeyAssertingLookup),
        );

        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        let _ = coordinator.confirm_reservation("@alice", "devqa-5003").await;
    }

    #[tokio::test]
    async fn cancelled_reservation_leaves_table_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        // Seed one real occupation so the state file exists.
        coordinator.begin_reservation("@alice", "x86").await.unwrap();
        coordinator.confirm_reservation("@alice", "-").await.unwrap();
        let before = disk_state(&dir).unwrap();

        coordinator.begin_reservation("@bob", "arm").await.unwrap();
        assert!(coordinator.cancel_reservation("@bob").await);

        assert_eq!(disk_state(&dir).unwrap(), before);
        let err = coordinator.confirm_reservation("@bob", "-").await.unwrap_err();
        assert!(matches!(err, OccupancyError::NoPendingReservation(_)));
    }

    #[tokio::test]
    async fn release_round_trip_through_id_strings() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_in(&dir, StubLookup::NotFound);

        coordinator.begin_reservation("@alice", "arm").await.unwrap();
        coordinator.confirm_reservation("@alice", "-").await.unwrap();

        assert_eq!(coordinator.release("arm").await.unwrap(), "@alice");
        assert!(matches!(
            coordinator.release("arm").await.unwrap_err(),
            OccupancyError::NotOccupied(ServerId::Arm)
        ));
        assert!(matches!(
            coordinator.release("riscv").await.unwrap_err(),
            OccupancyError::UnknownServer(_)
        ));
    }
}
