//! The occupancy core: who may claim which server, and how claims commit.
//!
//! This crate provides:
//! - `OccupancyManager` — the Free ↔ Occupied state machine over the store
//! - `SessionStore` — pending reservations bridging select and confirm
//! - `Coordinator` — the facade the transport layer calls into
//! - `OccupancyError` — domain rejections vs. system failures

mod coordinator;
mod error;
mod manager;
mod session;

pub use coordinator::{Coordinator, SKIP_TOKEN};
pub use error::OccupancyError;
pub use manager::OccupancyManager;
pub use session::{Reservation, SessionStore};
