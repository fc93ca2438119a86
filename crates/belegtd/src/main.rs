//! belegtd — shared-server occupancy daemon.
//!
//! Loads the occupancy state, wires the coordinator the transport layer
//! talks to, and runs the scheduled jobs: the business-day escalation
//! sweep plus the team reminders.

mod context;
mod jobs;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveTime, Weekday};
use clap::Parser;
use tokio::sync::Notify;
use tracing::info;

use belegt_core::{config, Config};
use belegt_scheduler::{Scheduler, Trigger};

use crate::context::AppContext;
use crate::jobs::{EscalationJob, ReminderJob};

// ── CLI ─────────────────────────────────────────────────────────────

/// Shared-server occupancy daemon: state, escalations, reminders.
#[derive(Parser, Debug)]
#[command(name = "belegtd", version, about)]
struct Cli {
    /// Path to the occupancy state file.
    #[arg(long, env = "STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Scheduler tick interval in seconds.
    #[arg(long, env = "SCHEDULER_TICK_SECS")]
    tick_secs: Option<u64>,
}

// ── Schedule ────────────────────────────────────────────────────────

const STANDUP_TEXT: &str = "📢 Reminder: daily standup starts in 10 minutes.\n\
                            🔗 Join: https://meet.example.com/qa-team";

const TEMPO_WEEKLY_TEXT: &str = "📆 Don't forget to fill in Tempo for this week!\n\
                                 📆 Add comments to work items that are still open.\n\
                                 📆 Check the statuses of the issues assigned to you.";

const TEMPO_MONTHLY_TEXT: &str = "📆 The month is coming to an end! Make sure all hours \
                                  and comments in the time tracking system are up to date.";

fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid wall-clock time")
}

/// Register every job with its cadence.
fn build_schedule(ctx: &AppContext) -> Scheduler {
    let mut scheduler = Scheduler::new(Duration::from_secs(ctx.config.scheduler.tick_secs));

    scheduler.add_job(
        Arc::new(EscalationJob::new(
            Arc::clone(&ctx.manager),
            Arc::clone(&ctx.sink),
            ctx.config.escalation.threshold_days,
            ctx.config.telegram.notify_thread_id,
        )),
        Trigger::weekdays_at(at(9, 0)),
    );

    scheduler.add_job(
        Arc::new(ReminderJob::new(
            "standup-reminder",
            STANDUP_TEXT,
            Arc::clone(&ctx.sink),
        )),
        Trigger::weekdays_at(at(11, 50)),
    );

    scheduler.add_job(
        Arc::new(ReminderJob::new(
            "tempo-weekly-reminder",
            TEMPO_WEEKLY_TEXT,
            Arc::clone(&ctx.sink),
        )),
        Trigger::Weekly {
            days: vec![Weekday::Fri],
            at: at(16, 0),
        },
    );

    scheduler.add_job(
        Arc::new(ReminderJob::new(
            "tempo-monthly-reminder",
            TEMPO_MONTHLY_TEXT,
            Arc::clone(&ctx.sink),
        )),
        Trigger::MonthlyLastDay { at: at(10, 0) },
    );

    scheduler
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    config::load_dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(path) = cli.state_file {
        config.storage.state_file = path;
    }
    if let Some(tick) = cli.tick_secs {
        config.scheduler.tick_secs = tick;
    }
    config.log_summary();

    let ctx = AppContext::init(config)?;
    let scheduler = build_schedule(&ctx);
    let shutdown = Arc::new(Notify::new());

    let scheduler_handle = tokio::spawn(scheduler.run(Arc::clone(&shutdown)));

    let catalog = ctx.coordinator.list_catalog();
    info!(servers = catalog.len(), "belegtd started");

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    shutdown.notify_waiters();
    scheduler_handle.await?;
    info!("belegtd exited cleanly");
    Ok(())
}
