//! Notification delivery for occupancy announcements and reminders.
//!
//! This crate provides:
//! - `NotificationSink` trait for pluggable delivery channels
//! - Telegram sink implementation (the team chat)
//! - HTML escaping for message bodies

pub mod telegram;
pub mod traits;

pub use telegram::{escape_html, TelegramSink};
pub use traits::{NotificationSink, NotifyError};
