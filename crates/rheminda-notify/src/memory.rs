//! In-process [`NotificationBridge`] with the same observable semantics as
//! the native plugin: overwrite by slot, silent cancel of empty slots,
//! idempotent channel and action registration.
//!
//! Used by the test suites and by `rheminda-cli`, which has no native shell
//! to talk to.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rheminda_core::{ReminderId, Slot};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::{
    bridge::NotificationBridge,
    error::BridgeError,
    types::{ActionPerformed, ActionType, ChannelSpec, LocalNotification, Permission},
};

/// Capacity of each action-event subscription.
const EVENT_BUFFER: usize = 64;

/// One recorded bridge call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    CheckPermission,
    RequestPermission,
    CreateChannel(String),
    RegisterActionTypes(Vec<String>),
    Schedule(Vec<Slot>),
    Cancel(Vec<Slot>),
}

struct MemoryState {
    available: bool,
    permission: Permission,
    /// What the simulated user answers when asked.
    answer: Permission,
    channels: HashMap<String, ChannelSpec>,
    action_types: HashMap<String, ActionType>,
    pending: BTreeMap<Slot, LocalNotification>,
    subscribers: Vec<mpsc::Sender<ActionPerformed>>,
    calls: Vec<BridgeCall>,
}

pub struct MemoryBridge {
    state: Mutex<MemoryState>,
}

impl MemoryBridge {
    /// A bridge whose permission is already granted.
    pub fn new() -> Self {
        Self::with_permission(Permission::Granted, Permission::Granted)
    }

    /// Start in `current`; a permission request resolves to `answer`.
    pub fn with_permission(current: Permission, answer: Permission) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                available: true,
                permission: current,
                answer,
                channels: HashMap::new(),
                action_types: HashMap::new(),
                pending: BTreeMap::new(),
                subscribers: Vec::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// A bridge that fails every call, as when running outside the native shell.
    pub fn unavailable() -> Self {
        let bridge = Self::new();
        bridge.set_available(false);
        bridge
    }

    pub fn set_available(&self, available: bool) {
        self.state().available = available;
    }

    pub fn set_permission(&self, permission: Permission) {
        self.state().permission = permission;
    }

    pub fn pending_at(&self, slot: Slot) -> Option<LocalNotification> {
        self.state().pending.get(&slot).cloned()
    }

    pub fn pending_for(&self, id: &ReminderId) -> Option<LocalNotification> {
        self.pending_at(rheminda_core::slot_of(id.as_str()))
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn channel(&self, id: &str) -> Option<ChannelSpec> {
        self.state().channels.get(id).cloned()
    }

    pub fn action_type(&self, id: &str) -> Option<ActionType> {
        self.state().action_types.get(id).cloned()
    }

    /// Every call made so far.
    pub fn calls(&self) -> Vec<BridgeCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Simulate the user acting on a delivered notification. The OS removes
    /// a notification from its queue once it has been delivered and acted on.
    /// Returns the number of subscribers that received the event.
    pub async fn perform(&self, event: ActionPerformed) -> usize {
        let subscribers = {
            let mut state = self.state();
            if let Some(id) = event.reminder_id() {
                state.pending.remove(&rheminda_core::slot_of(id.as_str()));
            }
            state.subscribers.retain(|tx| !tx.is_closed());
            state.subscribers.clone()
        };

        let mut delivered = 0;
        for tx in subscribers {
            if tx.send(event.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        debug!(action = %event.action_id, delivered, "memory bridge delivered action event");
        delivered
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guard(&self, call: BridgeCall) -> Result<MutexGuard<'_, MemoryState>, BridgeError> {
        let mut state = self.state();
        if !state.available {
            return Err(BridgeError::Unavailable("memory bridge switched off".to_string()));
        }
        state.calls.push(call);
        Ok(state)
    }
}

impl Default for MemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationBridge for MemoryBridge {
    fn name(&self) -> &str {
        "memory"
    }

    async fn check_permission(&self) -> Result<Permission, BridgeError> {
        let state = self.guard(BridgeCall::CheckPermission)?;
        Ok(state.permission)
    }

    async fn request_permission(&self) -> Result<Permission, BridgeError> {
        let mut state = self.guard(BridgeCall::RequestPermission)?;
        // The system prompt is shown once; afterwards the stored answer sticks.
        if state.permission == Permission::Prompt {
            state.permission = state.answer;
        }
        Ok(state.permission)
    }

    async fn create_channel(&self, channel: &ChannelSpec) -> Result<(), BridgeError> {
        let mut state = self.guard(BridgeCall::CreateChannel(channel.id.clone()))?;
        state.channels.insert(channel.id.clone(), channel.clone());
        Ok(())
    }

    async fn register_action_types(&self, types: &[ActionType]) -> Result<(), BridgeError> {
        let ids = types.iter().map(|t| t.id.clone()).collect();
        let mut state = self.guard(BridgeCall::RegisterActionTypes(ids))?;
        for ty in types {
            state.action_types.insert(ty.id.clone(), ty.clone());
        }
        Ok(())
    }

    async fn schedule(&self, notifications: Vec<LocalNotification>) -> Result<(), BridgeError> {
        let slots = notifications.iter().map(|n| n.id).collect();
        let mut state = self.guard(BridgeCall::Schedule(slots))?;
        if !state.permission.is_granted() {
            return Err(BridgeError::PermissionDenied);
        }
        for n in notifications {
            if !state.channels.contains_key(&n.channel_id) {
                warn!(slot = %n.id, channel = %n.channel_id, "scheduling onto an unregistered channel");
            }
            state.pending.insert(n.id, n);
        }
        Ok(())
    }

    async fn cancel(&self, slots: Vec<Slot>) -> Result<(), BridgeError> {
        let mut state = self.guard(BridgeCall::Cancel(slots.clone()))?;
        for slot in slots {
            state.pending.remove(&slot);
        }
        Ok(())
    }

    async fn pending(&self) -> Result<Vec<LocalNotification>, BridgeError> {
        let state = self.state();
        if !state.available {
            return Err(BridgeError::Unavailable("memory bridge switched off".to_string()));
        }
        Ok(state.pending.values().cloned().collect())
    }

    async fn subscribe(&self) -> Result<mpsc::Receiver<ActionPerformed>, BridgeError> {
        let mut state = self.state();
        if !state.available {
            return Err(BridgeError::Unavailable("memory bridge switched off".to_string()));
        }
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        state.subscribers.push(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NotificationExtra, NotificationSchedule};
    use chrono::{Duration, Utc};

    fn notification(slot: u32, minutes: i64) -> LocalNotification {
        LocalNotification {
            id: Slot(slot),
            title: "Rheminda".into(),
            body: format!("slot {slot}"),
            schedule: NotificationSchedule {
                at: Utc::now() + Duration::minutes(minutes),
            },
            channel_id: "rheminda_urgent".into(),
            action_type_id: "REMINDER_ACTIONS".into(),
            extra: NotificationExtra {
                reminder_id: "000000000000000000000001".into(),
            },
            small_icon: "ic_stat_icon".into(),
            icon_color: "#2563EB".into(),
        }
    }

    #[tokio::test]
    async fn schedule_overwrites_same_slot() {
        let bridge = MemoryBridge::new();
        bridge.schedule(vec![notification(7, 5)]).await.unwrap();
        let second = notification(7, 30);
        bridge.schedule(vec![second.clone()]).await.unwrap();

        assert_eq!(bridge.pending_count(), 1);
        assert_eq!(bridge.pending_at(Slot(7)), Some(second));
    }

    #[tokio::test]
    async fn cancel_of_empty_slot_is_ok() {
        let bridge = MemoryBridge::new();
        bridge.cancel(vec![Slot(42)]).await.unwrap();
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_bridge_fails_every_call() {
        let bridge = MemoryBridge::unavailable();
        assert!(bridge.check_permission().await.unwrap_err().is_unavailable());
        assert!(bridge.schedule(vec![notification(1, 5)]).await.is_err());
        assert!(bridge.subscribe().await.is_err());
        assert!(bridge.calls().is_empty());
    }

    #[tokio::test]
    async fn request_resolves_prompt_once() {
        let bridge = MemoryBridge::with_permission(Permission::Prompt, Permission::Denied);
        assert_eq!(bridge.request_permission().await.unwrap(), Permission::Denied);
        bridge.set_permission(Permission::Granted);
        assert_eq!(bridge.request_permission().await.unwrap(), Permission::Granted);
    }

    #[tokio::test]
    async fn denied_permission_refuses_schedule() {
        let bridge = MemoryBridge::with_permission(Permission::Denied, Permission::Denied);
        let err = bridge.schedule(vec![notification(1, 5)]).await.unwrap_err();
        assert!(matches!(err, BridgeError::PermissionDenied));
    }

    #[tokio::test]
    async fn perform_reaches_subscribers_and_clears_slot() {
        let bridge = MemoryBridge::new();
        let mut rx = bridge.subscribe().await.unwrap();
        bridge.schedule(vec![notification(1, 5)]).await.unwrap();

        let id = "000000000000000000000001";
        let delivered = bridge
            .perform(ActionPerformed::new("complete", id))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(rx.recv().await.unwrap().reminder_id().unwrap().as_str(), id);
        assert_eq!(bridge.pending_count(), 0);
    }
}
