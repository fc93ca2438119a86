//! [`JiraClient`] — resolves issue keys via the Jira REST API.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use belegt_core::config::JiraConfig;
use belegt_core::IssueRef;

use crate::{IssueLookup, LookupError};

/// Looks up issues with `GET {base}/rest/api/2/issue/{key}` using a
/// personal access token. When base URL or token are missing the client
/// is disabled and every lookup resolves to not-found.
pub struct JiraClient {
    creds: Option<Creds>,
    client: reqwest::Client,
}

struct Creds {
    base_url: String,
    pat: String,
}

impl JiraClient {
    /// Build a client from configuration. The request timeout bounds the
    /// whole lookup; a slow Jira can never stall a caller past it.
    pub fn from_config(config: &JiraConfig) -> Result<Self, LookupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let creds = match (&config.base_url, &config.pat) {
            (Some(base_url), Some(pat)) => Some(Creds {
                base_url: base_url.trim_end_matches('/').to_string(),
                pat: pat.clone(),
            }),
            _ => {
                tracing::warn!("Jira not configured; issue lookups will resolve to not-found");
                None
            }
        };

        Ok(Self { creds, client })
    }
}

#[async_trait]
impl IssueLookup for JiraClient {
    async fn lookup(&self, key: &str) -> Result<Option<IssueRef>, LookupError> {
        let Some(creds) = &self.creds else {
            return Ok(None);
        };

        let url = format!("{}/rest/api/2/issue/{}", creds.base_url, key);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&creds.pat)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            debug!(issue = %key, %status, "issue lookup returned non-200");
            return Ok(None);
        }

        let body: serde_json::Value = response.json().await?;
        Ok(parse_issue(&body, &creds.base_url))
    }
}

/// Extract `{key, summary, url}` from a Jira issue response body.
/// Returns `None` when the expected fields are absent.
fn parse_issue(body: &serde_json::Value, base_url: &str) -> Option<IssueRef> {
    let key = body.get("key")?.as_str()?;
    let summary = body.get("fields")?.get("summary")?.as_str()?;
    Some(IssueRef {
        key: key.to_string(),
        summary: summary.to_string(),
        url: format!("{base_url}/browse/{key}"),
    })
}
