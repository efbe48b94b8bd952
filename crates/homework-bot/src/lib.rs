//! homework-bot - Practicum homework status notifier for Telegram
//!
//! Polls the Practicum homework-status API on a fixed interval and sends a
//! message to one Telegram chat whenever a submitted homework changes
//! review status.
//!
//! # Module Structure
//!
//! - `cli`: Command-line interface
//! - `config`: Environment-driven configuration
//! - `error`: Error types and their kinds
//! - `api`: Practicum API client
//! - `homework`: Response validation and status translation
//! - `notifier`: Telegram delivery
//! - `poller`: The poll loop
//! - `logging`: Logger setup

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod homework;
pub mod logging;
pub mod notifier;
pub mod poller;

// Re-export commonly used types for convenience
pub use api::{HomeworkApi, PracticumClient};
pub use config::{ChatTarget, Config, LogSettings};
pub use error::{BotError, BotResult, ConfigError, ErrorKind, ShapeError};
pub use homework::{check_response, parse_status, HomeworkStatus};
pub use notifier::{send_message, Notifier, TelegramNotifier};
pub use poller::{Clock, CycleOutcome, Poller, SystemClock};
