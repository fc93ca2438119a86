//! Occupancy records: who holds which server, since when, and for what.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ServerId;

/// A resolved issue-tracker reference attached to a hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: String,
    pub summary: String,
    pub url: String,
}

/// One occupation of one server. Created whole by a successful occupy,
/// replaced never, removed whole by release. `since` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupancyRecord {
    /// Identity of the occupant, as the transport layer reports it.
    pub user: String,
    pub issue_key: Option<String>,
    #[serde(default)]
    pub issue_summary: String,
    #[serde(default)]
    pub issue_url: String,
    /// Instant the hold started (RFC 3339 in the persisted form).
    pub since: DateTime<Utc>,
}

impl OccupancyRecord {
    /// Build a record starting now, optionally tagged with an issue.
    pub fn new(user: impl Into<String>, issue: Option<IssueRef>) -> Self {
        Self::starting_at(user, issue, Utc::now())
    }

    /// Build a record with an explicit start instant.
    pub fn starting_at(
        user: impl Into<String>,
        issue: Option<IssueRef>,
        since: DateTime<Utc>,
    ) -> Self {
        match issue {
            Some(issue) => Self {
                user: user.into(),
                issue_key: Some(issue.key),
                issue_summary: issue.summary,
                issue_url: issue.url,
                since,
            },
            None => Self {
                user: user.into(),
                issue_key: None,
                issue_summary: String::new(),
                issue_url: String::new(),
                since,
            },
        }
    }

    /// The attached issue reference, if the hold was tagged with one.
    pub fn issue(&self) -> Option<IssueRef> {
        self.issue_key.as_ref().map(|key| IssueRef {
            key: key.clone(),
            summary: self.issue_summary.clone(),
            url: self.issue_url.clone(),
        })
    }
}

/// Current occupancy of every server. Keys present only while occupied;
/// a missing key means the server is free. This is the unit of persistence.
pub type OccupancyTable = BTreeMap<ServerId, OccupancyRecord>;
