//! Durable persistence for the occupancy table.
//!
//! A single JSON file holds the whole table; writes go through a sibling
//! temp file and an atomic rename so a crash mid-write never leaves the
//! store malformed or half-applied.

mod error;
mod file;

pub use error::StoreError;
pub use file::FileStore;
