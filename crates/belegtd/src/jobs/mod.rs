//! Scheduled jobs: the escalation sweep and the fixed-text reminders.

pub mod escalation;
pub mod reminder;

pub use escalation::EscalationJob;
pub use reminder::ReminderJob;
