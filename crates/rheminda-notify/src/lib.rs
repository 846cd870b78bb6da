//! `rheminda-notify` — projection of reminders onto the OS notification queue.
//!
//! The OS queue is a cache of server state. [`scheduler::Scheduler`] keeps it
//! in line with whatever reminder records it is handed; it owns no state of
//! its own. Every native call goes through the [`bridge::NotificationBridge`]
//! trait, so the same scheduling rules run against the mobile plugin, a
//! desktop shell, or [`memory::MemoryBridge`] in tests and the CLI.
//!
//! Setup ([`setup::NotificationSetup`]) registers the alert channel and the
//! snooze / complete action set once per launch.

pub mod bridge;
pub mod error;
pub mod memory;
pub mod scheduler;
pub mod setup;
pub mod types;

pub use bridge::NotificationBridge;
pub use error::BridgeError;
pub use memory::MemoryBridge;
pub use scheduler::{CancelOutcome, CancelReason, Plan, ScheduleOutcome, Scheduler, SkipReason, SyncReport};
pub use setup::NotificationSetup;
pub use types::{ActionPerformed, LocalNotification, NotificationAction, Permission, Readiness};
