use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Server-assigned reminder identifier (a Mongo ObjectId in hex form).
///
/// Opaque to the client apart from its trailing hex digits, which feed
/// [`slot_of`](crate::slot::slot_of).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReminderId(pub String);

impl ReminderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ReminderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ReminderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a reminder as stored on the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Snoozed,
    /// Terminal. A completed reminder never has a local notification.
    Completed,
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Snoozed => "snoozed",
            ReminderStatus::Completed => "completed",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReminderStatus::Pending),
            "snoozed" => Ok(ReminderStatus::Snoozed),
            "completed" => Ok(ReminderStatus::Completed),
            other => Err(CoreError::UnknownVariant {
                kind: "reminder status",
                value: other.to_string(),
            }),
        }
    }
}

/// Repeat rule attached to a reminder.
///
/// The client never computes occurrences: the server advances `remind_at`
/// when a recurring reminder completes, and the client only sees the result
/// on its next read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurringRule {
    None,
    Daily,
    /// Monday to Friday.
    Weekdays,
    /// Saturday and Sunday.
    Weekends,
    Weekly,
    Biweekly,
    Monthly,
    Bimonthly,
    Quarterly,
    /// Every four months.
    Triannual,
    /// Every six months.
    Biannual,
    Yearly,
    /// Produced by the server's rule generator. Opaque here and locked
    /// against edits.
    Custom,
}

impl RecurringRule {
    pub const ALL: [RecurringRule; 13] = [
        RecurringRule::None,
        RecurringRule::Daily,
        RecurringRule::Weekdays,
        RecurringRule::Weekends,
        RecurringRule::Weekly,
        RecurringRule::Biweekly,
        RecurringRule::Monthly,
        RecurringRule::Bimonthly,
        RecurringRule::Quarterly,
        RecurringRule::Triannual,
        RecurringRule::Biannual,
        RecurringRule::Yearly,
        RecurringRule::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurringRule::None => "none",
            RecurringRule::Daily => "daily",
            RecurringRule::Weekdays => "weekdays",
            RecurringRule::Weekends => "weekends",
            RecurringRule::Weekly => "weekly",
            RecurringRule::Biweekly => "biweekly",
            RecurringRule::Monthly => "monthly",
            RecurringRule::Bimonthly => "bimonthly",
            RecurringRule::Quarterly => "quarterly",
            RecurringRule::Triannual => "triannual",
            RecurringRule::Biannual => "biannual",
            RecurringRule::Yearly => "yearly",
            RecurringRule::Custom => "custom",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, RecurringRule::None)
    }

    /// Whether a user edit may replace this rule.
    pub fn is_editable(&self) -> bool {
        !matches!(self, RecurringRule::Custom)
    }
}

impl fmt::Display for RecurringRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurringRule {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecurringRule::ALL
            .into_iter()
            .find(|rule| rule.as_str() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "recurring rule",
                value: s.to_string(),
            })
    }
}

/// Client-side copy of a server reminder. Possibly stale the moment it is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(rename = "_id", alias = "id")]
    pub id: ReminderId,
    pub title: String,
    #[serde(deserialize_with = "deserialize_instant")]
    pub remind_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<String>,
    #[serde(default)]
    pub recurring_rule: Option<RecurringRule>,
    pub status: ReminderStatus,

    // Pass-through fields: carried, never interpreted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_mode: Option<String>,
}

impl Reminder {
    pub fn new(id: impl Into<ReminderId>, title: impl Into<String>, remind_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            remind_at,
            extra_info: None,
            recurring_rule: None,
            status: ReminderStatus::Pending,
            user_id: None,
            created_at: None,
            creation_mode: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ReminderStatus::Completed
    }

    /// True when `remind_at` is at or before `now`.
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        self.remind_at <= now
    }

    /// The effective rule, folding an absent rule into [`RecurringRule::None`].
    pub fn rule(&self) -> RecurringRule {
        self.recurring_rule.unwrap_or(RecurringRule::None)
    }

    /// Extra info trimmed, or `None` when absent or blank.
    pub fn note(&self) -> Option<&str> {
        self.extra_info
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Partial update sent with `PUT /reminders/{id}`.
///
/// Unset fields are omitted from the body so the server leaves them alone.
/// `recurring_rule` and `extra_info` are tri-state: `None` leaves the field,
/// `Some(None)` sends `null` and clears it, `Some(Some(value))` sets it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReminderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remind_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReminderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_rule: Option<Option<RecurringRule>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_info: Option<Option<String>>,
}

impl ReminderPatch {
    pub fn complete() -> Self {
        Self {
            status: Some(ReminderStatus::Completed),
            ..Self::default()
        }
    }

    pub fn snooze(until: DateTime<Utc>) -> Self {
        Self {
            status: Some(ReminderStatus::Snoozed),
            remind_at: Some(until),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Checks the patch against the stored record before it is sent.
    ///
    /// Rejects blank titles and any change to a custom rule.
    pub fn validate_against(&self, current: &Reminder) -> crate::error::Result<()> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(CoreError::Validation("title must not be empty".to_string()));
            }
        }
        if let Some(requested) = self.recurring_rule {
            let current_rule = current.rule();
            let requested = requested.unwrap_or(RecurringRule::None);
            if !current_rule.is_editable() && requested != current_rule {
                return Err(CoreError::Validation(format!(
                    "reminder {} has a custom schedule; its rule cannot be edited",
                    current.id
                )));
            }
            if requested == RecurringRule::Custom && current_rule != RecurringRule::Custom {
                return Err(CoreError::Validation(
                    "custom rules are produced by the server and cannot be set by hand".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Accepts RFC 3339 (`2024-05-01T09:30:00Z`) or a naive ISO timestamp
/// (`2024-05-01T09:30:00`, `2024-05-01T09:30`), reading naive values as UTC.
fn deserialize_instant<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_instant(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
}

pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
