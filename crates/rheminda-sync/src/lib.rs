//! `rheminda-sync` — keeps server state and local notifications consistent.
//!
//! [`service::ReminderService`] wraps every UI mutation (edit, snooze,
//! complete, delete, refresh) as "server first, then scheduler".
//! [`reconciler::ActionReconciler`] does the same for actions the user takes
//! on a delivered notification, and runs as an event loop fed by the
//! bridge's action subscription. Both serialize work per reminder id through
//! [`lock::KeyedLocks`].

pub mod error;
pub mod lock;
pub mod reconciler;
pub mod service;

pub use error::{Result, SyncError};
pub use lock::{KeyGuard, KeyedLocks};
pub use reconciler::{ActionOutcome, ActionReconciler, NavigationIntent};
pub use service::{ReminderService, Rescheduled};
