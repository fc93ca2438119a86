use thiserror::Error;

use belegt_core::ServerId;
use belegt_store::StoreError;

/// Everything that can go wrong claiming or releasing a server.
///
/// Domain rejections are expected outcomes to explain to the requester;
/// the store variant is a system failure to alert operators about. Use
/// [`is_rejection`](OccupancyError::is_rejection) to tell them apart.
#[derive(Error, Debug)]
pub enum OccupancyError {
    #[error("unknown server: {0}")]
    UnknownServer(String),

    #[error("server {server} is already occupied by {occupant}")]
    AlreadyOccupied { server: ServerId, occupant: String },

    #[error("server {0} is not occupied")]
    NotOccupied(ServerId),

    #[error("no pending reservation for {0}")]
    NoPendingReservation(String),

    #[error("issue {0} not found")]
    IssueNotFound(String),

    #[error("issue lookup for {0} timed out")]
    IssueLookupTimeout(String),

    #[error("persistence failure: {0}")]
    Store(#[from] StoreError),
}

impl OccupancyError {
    /// True for expected domain rejections (tell the user), false for
    /// system failures (log and alert operators).
    pub fn is_rejection(&self) -> bool {
        !matches!(self, OccupancyError::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_failures_are_not_rejections() {
        let err = OccupancyError::Store(StoreError::Serde("bad json".to_string()));
        assert!(!err.is_rejection());
    }

    #[test]
    fn domain_errors_are_rejections() {
        let errors = [
            OccupancyError::UnknownServer("riscv".to_string()),
            OccupancyError::AlreadyOccupied {
                server: ServerId::X86,
                occupant: "@alice".to_string(),
            },
            OccupancyError::NotOccupied(ServerId::Arm),
            OccupancyError::NoPendingReservation("@bob".to_string()),
            OccupancyError::IssueNotFound("DEVQA-1".to_string()),
            OccupancyError::IssueLookupTimeout("DEVQA-1".to_string()),
        ];
        for err in errors {
            assert!(err.is_rejection(), "{err} should be a rejection");
        }
    }
}
