//! [`OccupancyManager`] — the per-server Free ↔ Occupied state machine.
//!
//! Holds the occupancy table in memory behind a single `RwLock` and writes
//! every mutation through the store before the in-memory view advances.
//! The write lock is the process-wide serialization point: two racing
//! occupy calls against the same free server cannot both observe it free.

use tokio::sync::RwLock;
use tracing::info;

use belegt_core::{IssueRef, OccupancyRecord, OccupancyTable, ServerId};
use belegt_store::FileStore;

use crate::error::OccupancyError;

pub struct OccupancyManager {
    store: FileStore,
    table: RwLock<OccupancyTable>,
}

impl std::fmt::Debug for OccupancyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OccupancyManager").finish_non_exhaustive()
    }
}

impl OccupancyManager {
    /// Load the persisted table once; it is the sole source of truth from
    /// here on.
    pub fn new(store: FileStore) -> Result<Self, OccupancyError> {
        let table = store.load()?;
        info!(
            path = %store.path().display(),
            occupied = table.len(),
            "occupancy state loaded"
        );
        Ok(Self {
            store,
            table: RwLock::new(table),
        })
    }

    /// Claim `server` for `occupant`.
    ///
    /// Fails with [`OccupancyError::AlreadyOccupied`] when a record exists —
    /// an existing hold is never overwritten, whoever asks. On a failed
    /// save nothing is claimed and the error surfaces to the caller.
    pub async fn occupy(
        &self,
        server: ServerId,
        occupant: &str,
        issue: Option<IssueRef>,
    ) -> Result<OccupancyRecord, OccupancyError> {
        let mut table = self.table.write().await;
        if let Some(existing) = table.get(&server) {
            return Err(OccupancyError::AlreadyOccupied {
                server,
                occupant: existing.user.clone(),
            });
        }

        let record = OccupancyRecord::new(occupant, issue);
        let mut next = table.clone();
        next.insert(server, record.clone());
        self.store.save(&next)?;
        *table = next;

        info!(server = %server, occupant, issue = ?record.issue_key, "server occupied");
        Ok(record)
    }

    /// Release `server`, returning the prior occupant's identity.
    ///
    /// Fails with [`OccupancyError::NotOccupied`] when no record exists.
    pub async fn release(&self, server: ServerId) -> Result<String, OccupancyError> {
        let mut table = self.table.write().await;
        let Some(record) = table.get(&server) else {
            return Err(OccupancyError::NotOccupied(server));
        };
        let occupant = record.user.clone();

        let mut next = table.clone();
        next.remove(&server);
        self.store.save(&next)?;
        *table = next;

        info!(server = %server, occupant = %occupant, "server released");
        Ok(occupant)
    }

    /// A consistent snapshot of the current table, for display and sweeps.
    pub async fn status(&self) -> OccupancyTable {
        self.table.read().await.clone()
    }
}
