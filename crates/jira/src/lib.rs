//! Issue lookup against a Jira instance.
//!
//! This crate provides:
//! - `IssueLookup` trait for pluggable issue resolution
//! - `JiraClient` implementation doing a single authenticated REST GET
//!
//! Lookup failures are deliberately soft: a missing issue, a non-200
//! response, or an unconfigured client all resolve to "not found". Only
//! the timeout is surfaced as its own error so callers can log it apart.

mod client;

use async_trait::async_trait;

use belegt_core::IssueRef;

pub use client::JiraClient;

/// Errors from an issue lookup attempt.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("issue lookup timed out")]
    Timeout,

    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LookupError::Timeout
        } else {
            LookupError::Http(err)
        }
    }
}

/// Resolves an issue key to a reference, or `None` when the issue does not
/// exist (or cannot be told apart from not existing).
#[async_trait]
pub trait IssueLookup: Send + Sync {
    async fn lookup(&self, key: &str) -> Result<Option<IssueRef>, LookupError>;
}
