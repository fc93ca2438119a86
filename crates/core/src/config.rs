use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64_opt(key: &str) -> Option<i64> {
    env_opt(key).and_then(|v| v.parse().ok())
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub telegram: TelegramConfig,
    pub jira: JiraConfig,
    pub storage: StorageConfig,
    pub sessions: SessionConfig,
    pub escalation: EscalationConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            telegram: TelegramConfig::from_env(),
            jira: JiraConfig::from_env(),
            storage: StorageConfig::from_env(),
            sessions: SessionConfig::from_env(),
            escalation: EscalationConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  telegram:   chat_id={}, thread={:?}, token={}",
            self.telegram.chat_id.as_deref().unwrap_or("(none)"),
            self.telegram.notify_thread_id,
            if self.telegram.bot_token.is_some() { "set" } else { "(none)" },
        );
        tracing::info!(
            "  jira:       url={}, pat={}, timeout={}s",
            self.jira.base_url.as_deref().unwrap_or("(none)"),
            if self.jira.pat.is_some() { "set" } else { "(none)" },
            self.jira.timeout_secs,
        );
        tracing::info!("  storage:    state_file={}", self.storage.state_file.display());
        tracing::info!("  sessions:   ttl={}s", self.sessions.ttl_secs);
        tracing::info!("  escalation: threshold={} business days", self.escalation.threshold_days);
        tracing::info!("  scheduler:  tick={}s", self.scheduler.tick_secs);
    }
}

// ── Telegram ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<String>,
    /// Sub-thread for server notifications (0 / unset = main chat).
    pub notify_thread_id: Option<i64>,
}

impl TelegramConfig {
    fn from_env() -> Self {
        Self {
            bot_token: env_opt("BOT_TOKEN"),
            chat_id: env_opt("CHAT_ID"),
            notify_thread_id: env_i64_opt("NOTIFY_THREAD_ID").filter(|&id| id != 0),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

// ── Jira ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    pub base_url: Option<String>,
    pub pat: Option<String>,
    pub timeout_secs: u64,
}

impl JiraConfig {
    fn from_env() -> Self {
        Self {
            base_url: env_opt("JIRA_URL"),
            pat: env_opt("JIRA_PAT"),
            timeout_secs: env_u64("JIRA_TIMEOUT_SECS", 10),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.pat.is_some()
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub state_file: PathBuf,
}

impl StorageConfig {
    fn from_env() -> Self {
        Self {
            state_file: PathBuf::from(env_or("STATE_FILE", "server_occupancy.json")),
        }
    }
}

// ── Reservation sessions ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// A pending reservation older than this is dropped.
    pub ttl_secs: u64,
}

impl SessionConfig {
    fn from_env() -> Self {
        Self {
            ttl_secs: env_u64("SESSION_TTL_SECS", 600),
        }
    }
}

// ── Escalation ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Holds older than this many business days get escalated.
    pub threshold_days: u64,
}

impl EscalationConfig {
    fn from_env() -> Self {
        Self {
            threshold_days: env_u64("ESCALATION_THRESHOLD_DAYS", 5),
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub tick_secs: u64,
}

impl SchedulerConfig {
    fn from_env() -> Self {
        Self {
            tick_secs: env_u64("SCHEDULER_TICK_SECS", 30),
        }
    }
}
