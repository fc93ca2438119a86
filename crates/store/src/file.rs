//! [`FileStore`] — JSON-file backed occupancy state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use belegt_core::{OccupancyRecord, OccupancyTable, ServerId};

use crate::error::StoreError;

/// Current on-disk schema version.
const STATE_VERSION: u32 = 1;

/// Versioned on-disk envelope. Version 0 (legacy) files are a bare object
/// keyed by server id; those are still accepted on load.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    servers: serde_json::Map<String, serde_json::Value>,
}

/// JSON-file backed store for the occupancy table.
///
/// The store only guarantees durable, atomic load/save. Serializing
/// concurrent read-modify-write cycles is the occupancy manager's job.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a store at `path`, ensuring the parent directory exists.
    /// The file itself is created on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path })
    }

    /// The file this store reads and writes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last persisted table. A missing file is the first run and
    /// yields an empty table. Entries that fail to parse (unknown server
    /// id, malformed record or timestamp) are skipped with a warning so one
    /// bad entry cannot take the whole table down.
    pub fn load(&self) -> Result<OccupancyTable, StoreError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "state file missing, starting empty");
            return Ok(OccupancyTable::new());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let value: serde_json::Value =
            serde_json::from_str(&raw).map_err(|e| StoreError::Serde(e.to_string()))?;

        let entries = match value {
            serde_json::Value::Object(obj) if obj.contains_key("version") => {
                let state: StateFile = serde_json::from_value(serde_json::Value::Object(obj))
                    .map_err(|e| StoreError::Serde(e.to_string()))?;
                state.servers
            }
            // Legacy layout: the table itself at the top level.
            serde_json::Value::Object(obj) => obj,
            other => {
                return Err(StoreError::Serde(format!(
                    "state file root must be a JSON object, got {other}"
                )))
            }
        };

        let mut table = OccupancyTable::new();
        for (key, value) in entries {
            let server: ServerId = match key.parse() {
                Ok(id) => id,
                Err(_) => {
                    warn!(server = %key, "skipping state entry for unknown server");
                    continue;
                }
            };
            match serde_json::from_value::<OccupancyRecord>(value) {
                Ok(record) => {
                    table.insert(server, record);
                }
                Err(e) => {
                    warn!(server = %key, error = %e, "skipping malformed state entry");
                }
            }
        }
        Ok(table)
    }

    /// Persist the full table. Writes to a sibling temp file first and
    /// renames it over the target, so a crash can only leave the previous
    /// complete state or the new complete state.
    pub fn save(&self, table: &OccupancyTable) -> Result<(), StoreError> {
        let servers = table
            .iter()
            .map(|(id, record)| {
                serde_json::to_value(record)
                    .map(|v| (id.as_str().to_string(), v))
                    .map_err(|e| StoreError::Serde(e.to_string()))
            })
            .collect::<Result<serde_json::Map<_, _>, _>>()?;

        let state = StateFile {
            version: STATE_VERSION,
            servers,
        };
        let json = serde_json::to_string_pretty(&state)
            .map_err(|e| StoreError::Serde(e.to_string()))?;

        let tmp = self.tmp_path();
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), entries = table.len(), "state saved");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
