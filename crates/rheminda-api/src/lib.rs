//! `rheminda-api` — client for the reminder server's REST surface.
//!
//! The server owns every reminder. [`ReminderApi`] is the seam the sync
//! layer talks through; [`HttpReminderApi`] is the `reqwest` implementation
//! and [`MemoryReminderApi`] an in-process stand-in with the same error
//! behaviour.

pub mod client;
pub mod error;
pub mod memory;

pub use client::{HttpReminderApi, ReminderApi};
pub use error::{ApiError, Result};
pub use memory::{ApiCall, MemoryReminderApi};
