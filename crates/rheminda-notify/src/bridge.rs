use async_trait::async_trait;
use rheminda_core::Slot;
use tokio::sync::mpsc;

use crate::{
    error::BridgeError,
    types::{ActionPerformed, ActionType, ChannelSpec, LocalNotification, Permission},
};

/// Interface to the OS-owned notification subsystem.
///
/// Mirrors the native local-notification plugin: pending notifications are
/// addressed by [`Slot`], scheduling an occupied slot replaces its entry, and
/// cancelling an empty slot succeeds silently. Implementations must be
/// `Send + Sync` so the scheduler and the action reconciler can share one
/// bridge across Tokio tasks.
#[async_trait]
pub trait NotificationBridge: Send + Sync {
    /// Stable lowercase identifier for logs (e.g. `"memory"`).
    fn name(&self) -> &str;

    async fn check_permission(&self) -> Result<Permission, BridgeError>;

    /// Ask the user. Returns the answer, which may still be `Denied`.
    async fn request_permission(&self) -> Result<Permission, BridgeError>;

    /// Create or update the channel. May return [`BridgeError::AlreadyExists`].
    async fn create_channel(&self, channel: &ChannelSpec) -> Result<(), BridgeError>;

    /// Register the interactive action sets. Re-registering is allowed.
    async fn register_action_types(&self, types: &[ActionType]) -> Result<(), BridgeError>;

    /// Schedule notifications, replacing any pending entry on the same slot.
    async fn schedule(&self, notifications: Vec<LocalNotification>) -> Result<(), BridgeError>;

    /// Remove pending notifications. Unknown slots are ignored.
    async fn cancel(&self, slots: Vec<Slot>) -> Result<(), BridgeError>;

    /// Snapshot of every pending notification.
    async fn pending(&self) -> Result<Vec<LocalNotification>, BridgeError>;

    /// Subscribe to `actionPerformed` events. Each call returns a new receiver.
    async fn subscribe(&self) -> Result<mpsc::Receiver<ActionPerformed>, BridgeError>;
}
