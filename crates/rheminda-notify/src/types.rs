use chrono::{DateTime, Utc};
use rheminda_core::config::{ActionsConfig, ChannelConfig};
use rheminda_core::{ReminderId, Slot};
use serde::{Deserialize, Serialize};

/// Built-in action id the OS reports for a plain tap on the notification body.
pub const ACTION_TAP: &str = "tap";
pub const ACTION_SNOOZE: &str = "snooze";
pub const ACTION_COMPLETE: &str = "complete";

/// Notification permission as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Granted,
    Denied,
    /// Not decided yet; asking will show the system prompt.
    Prompt,
}

impl Permission {
    pub fn is_granted(self) -> bool {
        self == Permission::Granted
    }
}

/// Result of [`NotificationSetup::ensure_ready`](crate::setup::NotificationSetup::ensure_ready).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    /// Permission granted, channel and actions registered.
    Ready,
    /// Channel and actions are registered but the user declined alerts.
    PermissionDenied,
    /// No usable bridge; scheduling will be a no-op.
    BridgeUnavailable,
}

/// Notification channel definition (Android channel / iOS category settings).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub importance: u8,
    pub visibility: i8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<String>,
    pub vibration: bool,
}

impl From<&ChannelConfig> for ChannelSpec {
    fn from(c: &ChannelConfig) -> Self {
        Self {
            id: c.id.clone(),
            name: c.name.clone(),
            description: c.description.clone(),
            importance: c.importance,
            visibility: c.visibility,
            sound: c.sound.clone(),
            vibration: c.vibration,
        }
    }
}

/// One button on a delivered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: String,
    pub title: String,
    /// When false the OS runs the handler without bringing the app forward.
    pub foreground: bool,
}

/// A named set of actions attached to notifications via `actionTypeId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionType {
    pub id: String,
    pub actions: Vec<Action>,
}

impl From<&ActionsConfig> for ActionType {
    /// Snooze and complete, both handled in the background.
    fn from(c: &ActionsConfig) -> Self {
        Self {
            id: c.type_id.clone(),
            actions: vec![
                Action {
                    id: ACTION_SNOOZE.to_string(),
                    title: c.snooze_title.clone(),
                    foreground: false,
                },
                Action {
                    id: ACTION_COMPLETE.to_string(),
                    title: c.complete_title.clone(),
                    foreground: false,
                },
            ],
        }
    }
}

/// Opaque payload the OS hands back with every action event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationExtra {
    pub reminder_id: ReminderId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSchedule {
    pub at: DateTime<Utc>,
}

/// A notification as handed to the bridge for scheduling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalNotification {
    pub id: Slot,
    pub title: String,
    pub body: String,
    pub schedule: NotificationSchedule,
    pub channel_id: String,
    pub action_type_id: String,
    pub extra: NotificationExtra,
    pub small_icon: String,
    pub icon_color: String,
}

impl LocalNotification {
    pub fn fire_at(&self) -> DateTime<Utc> {
        self.schedule.at
    }

    pub fn reminder_id(&self) -> &ReminderId {
        &self.extra.reminder_id
    }
}

/// The notification half of an action event. The OS echoes back whatever
/// it stored, so every field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveredNotification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Slot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<NotificationExtra>,
}

/// `actionPerformed` event: `{actionId, notification: {extra: {reminderId}}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPerformed {
    pub action_id: String,
    #[serde(default)]
    pub notification: DeliveredNotification,
}

impl ActionPerformed {
    pub fn new(action_id: &str, reminder_id: impl Into<ReminderId>) -> Self {
        Self {
            action_id: action_id.to_string(),
            notification: DeliveredNotification {
                id: None,
                extra: Some(NotificationExtra {
                    reminder_id: reminder_id.into(),
                }),
            },
        }
    }

    pub fn reminder_id(&self) -> Option<&ReminderId> {
        self.notification.extra.as_ref().map(|e| &e.reminder_id)
    }

    pub fn action(&self) -> Option<NotificationAction> {
        NotificationAction::from_action_id(&self.action_id)
    }
}

/// The three things a user can do with a delivered reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Tap,
    Snooze,
    Complete,
}

impl NotificationAction {
    pub fn from_action_id(id: &str) -> Option<Self> {
        match id {
            ACTION_TAP => Some(NotificationAction::Tap),
            ACTION_SNOOZE => Some(NotificationAction::Snooze),
            ACTION_COMPLETE => Some(NotificationAction::Complete),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationAction::Tap => ACTION_TAP,
            NotificationAction::Snooze => ACTION_SNOOZE,
            NotificationAction::Complete => ACTION_COMPLETE,
        }
    }
}

impl std::fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
