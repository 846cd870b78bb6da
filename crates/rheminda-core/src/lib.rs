//! `rheminda-core` — shared model for the reminder notification core.
//!
//! # Overview
//!
//! The server owns every reminder; this crate only describes the transient
//! copy the client holds ([`types::Reminder`]), the partial updates it sends
//! back ([`types::ReminderPatch`]) and the one rule that links the two id
//! spaces: [`slot::slot_of`], which maps a server record id onto a local
//! notification slot.
//!
//! # Slot width
//!
//! | Part            | Value                                   |
//! |-----------------|-----------------------------------------|
//! | Source          | last 6 hex characters of the record id  |
//! | Width           | 24 bits                                 |
//! | Range           | `0 ..= 0xFF_FFFF`                       |
//! | Collisions      | possible, accepted, never resolved      |

pub mod config;
pub mod error;
pub mod slot;
pub mod types;

pub use config::{RescheduleStrategy, RhemindaConfig};
pub use error::{CoreError, Result};
pub use slot::{slot_of, Slot};
pub use types::{RecurringRule, Reminder, ReminderId, ReminderPatch, ReminderStatus};
