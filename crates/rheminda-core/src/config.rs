use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_USER_ID: &str = "default_user";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

pub const DEFAULT_HEADING: &str = "Rheminda";
pub const DEFAULT_SNOOZE_MINUTES: u32 = 10;
pub const DEFAULT_CHANNEL_ID: &str = "rheminda_urgent";
pub const DEFAULT_ACTION_TYPE_ID: &str = "REMINDER_ACTIONS";
/// Android's IMPORTANCE_HIGH ceiling: heads-up, sound, vibration.
pub const CHANNEL_IMPORTANCE_MAX: u8 = 5;

/// Top-level config (rheminda.toml + RHEMINDA_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RhemindaConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Where the reminder server lives and how long to wait for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    /// Owner of the reminder list fetched on refresh.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            user_id: default_user_id(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Base URL with trailing slashes removed, ready for `format!("{base}/…")`.
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

/// How an already-pending notification is replaced on reschedule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RescheduleStrategy {
    /// Schedule on the same slot and let the OS replace the old entry.
    #[default]
    Overwrite,
    /// Cancel the slot first, then schedule. One extra bridge call, no
    /// reliance on overwrite semantics.
    CancelThenSchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Notification title; the reminder's own title goes in the body.
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default = "default_small_icon")]
    pub small_icon: String,
    #[serde(default = "default_icon_color")]
    pub icon_color: String,
    #[serde(default = "default_snooze_minutes")]
    pub snooze_minutes: u32,
    #[serde(default)]
    pub reschedule: RescheduleStrategy,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub actions: ActionsConfig,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            heading: default_heading(),
            small_icon: default_small_icon(),
            icon_color: default_icon_color(),
            snooze_minutes: DEFAULT_SNOOZE_MINUTES,
            reschedule: RescheduleStrategy::default(),
            channel: ChannelConfig::default(),
            actions: ActionsConfig::default(),
        }
    }
}

impl NotificationConfig {
    pub fn snooze_delay(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.snooze_minutes))
    }
}

/// The single high-importance channel every reminder is posted to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_channel_id")]
    pub id: String,
    #[serde(default = "default_channel_name")]
    pub name: String,
    #[serde(default = "default_channel_description")]
    pub description: String,
    #[serde(default = "default_importance")]
    pub importance: u8,
    /// 1 = public (full content on the lock screen).
    #[serde(default = "default_visibility")]
    pub visibility: i8,
    #[serde(default = "default_sound")]
    pub sound: Option<String>,
    #[serde(default = "bool_true")]
    pub vibration: bool,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: default_channel_id(),
            name: default_channel_name(),
            description: default_channel_description(),
            importance: default_importance(),
            visibility: default_visibility(),
            sound: default_sound(),
            vibration: true,
        }
    }
}

/// Button labels for the interactive action set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionsConfig {
    #[serde(default = "default_action_type_id")]
    pub type_id: String,
    #[serde(default = "default_snooze_title")]
    pub snooze_title: String,
    #[serde(default = "default_complete_title")]
    pub complete_title: String,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            type_id: default_action_type_id(),
            snooze_title: default_snooze_title(),
            complete_title: default_complete_title(),
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}
fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}
fn default_heading() -> String {
    DEFAULT_HEADING.to_string()
}
fn default_small_icon() -> String {
    "ic_stat_icon".to_string()
}
fn default_icon_color() -> String {
    "#2563EB".to_string()
}
fn default_snooze_minutes() -> u32 {
    DEFAULT_SNOOZE_MINUTES
}
fn default_channel_id() -> String {
    DEFAULT_CHANNEL_ID.to_string()
}
fn default_channel_name() -> String {
    "Rheminda Alerts".to_string()
}
fn default_channel_description() -> String {
    "High priority reminders".to_string()
}
fn default_importance() -> u8 {
    CHANNEL_IMPORTANCE_MAX
}
fn default_visibility() -> i8 {
    1
}
fn default_sound() -> Option<String> {
    Some("beep.wav".to_string())
}
fn default_action_type_id() -> String {
    DEFAULT_ACTION_TYPE_ID.to_string()
}
fn default_snooze_title() -> String {
    "💤 Snooze 10m".to_string()
}
fn default_complete_title() -> String {
    "✅ Mark Done".to_string()
}

impl RhemindaConfig {
    /// Load config from a TOML file with RHEMINDA_* env var overrides.
    ///
    /// Path resolution: explicit argument, else `~/.rheminda/rheminda.toml`.
    /// A missing file is not an error; every field has a default. Nested keys
    /// use a double underscore: `RHEMINDA_API__BASE_URL`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: RhemindaConfig = Figment::from(Serialized::defaults(RhemindaConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("RHEMINDA_").split("__"))
            .extract()
            .map_err(|e| crate::error::CoreError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.notifications.snooze_minutes == 0 {
            return Err(crate::error::CoreError::Config(
                "notifications.snooze_minutes must be at least 1".to_string(),
            ));
        }
        let importance = self.notifications.channel.importance;
        if !(1..=CHANNEL_IMPORTANCE_MAX).contains(&importance) {
            return Err(crate::error::CoreError::Config(format!(
                "notifications.channel.importance must be 1..={CHANNEL_IMPORTANCE_MAX}"
            )));
        }
        if self.api.normalized_base_url().is_empty() {
            return Err(crate::error::CoreError::Config("api.base_url is empty".to_string()));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.rheminda/rheminda.toml", home)
}
