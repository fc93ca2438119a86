//! Application context: every long-lived component, constructed once at
//! startup and passed to whoever needs it. No import-time singletons.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use belegt_core::Config;
use belegt_jira::{IssueLookup, JiraClient};
use belegt_notify::{NotificationSink, TelegramSink};
use belegt_occupancy::{Coordinator, OccupancyManager, SessionStore};
use belegt_store::FileStore;

pub struct AppContext {
    pub config: Config,
    pub manager: Arc<OccupancyManager>,
    pub coordinator: Arc<Coordinator>,
    pub sink: Arc<dyn NotificationSink>,
}

impl AppContext {
    /// Wire up store, manager, sessions, lookup client, sink and
    /// coordinator. Fails fast on unusable configuration (no bot
    /// credentials, unreadable state file) rather than limping along.
    pub fn init(config: Config) -> anyhow::Result<Self> {
        let store = FileStore::new(&config.storage.state_file)
            .with_context(|| format!("cannot open state store at {}", config.storage.state_file.display()))?;
        let manager = Arc::new(OccupancyManager::new(store).context("loading occupancy state")?);

        let sessions = SessionStore::new(Duration::from_secs(config.sessions.ttl_secs));
        let lookup: Arc<dyn IssueLookup> =
            Arc::new(JiraClient::from_config(&config.jira).context("building Jira client")?);
        let coordinator = Arc::new(Coordinator::new(Arc::clone(&manager), sessions, lookup));

        let sink: Arc<dyn NotificationSink> = Arc::new(
            TelegramSink::from_config(&config.telegram).context("building Telegram sink")?,
        );

        Ok(Self {
            config,
            manager,
            coordinator,
            sink,
        })
    }
}
