use std::sync::Arc;

use rheminda_core::config::NotificationConfig;
use tracing::{info, warn};

use crate::{
    bridge::NotificationBridge,
    error::BridgeError,
    types::{ActionType, ChannelSpec, Permission, Readiness},
};

/// One-time, rerunnable setup of permission, channel and action set.
///
/// Touches only channel/action metadata on the bridge, never a slot, so it
/// can run concurrently with in-flight scheduling.
pub struct NotificationSetup {
    bridge: Arc<dyn NotificationBridge>,
    channel: ChannelSpec,
    action_types: Vec<ActionType>,
}

impl NotificationSetup {
    pub fn new(bridge: Arc<dyn NotificationBridge>, config: &NotificationConfig) -> Self {
        Self {
            bridge,
            channel: ChannelSpec::from(&config.channel),
            action_types: vec![ActionType::from(&config.actions)],
        }
    }

    /// Safe to call on every launch.
    ///
    /// Steps run in order: permission, channel, action types. A denied
    /// permission does not stop the remaining steps, so a later grant in
    /// system settings works without another setup pass.
    pub async fn ensure_ready(&self) -> Readiness {
        let bridge = self.bridge.name().to_string();

        let permission = match self.ensure_permission().await {
            Ok(p) => p,
            Err(e) if e.is_unavailable() => {
                warn!(%bridge, error = %e, "notification bridge unavailable; local alerts disabled");
                return Readiness::BridgeUnavailable;
            }
            Err(e) => {
                warn!(%bridge, error = %e, "permission query failed; treating as denied");
                Permission::Denied
            }
        };

        if let Err(e) = accept_existing(self.bridge.create_channel(&self.channel).await) {
            warn!(%bridge, channel = %self.channel.id, error = %e, "channel creation failed");
            return Readiness::BridgeUnavailable;
        }

        if let Err(e) = accept_existing(self.bridge.register_action_types(&self.action_types).await) {
            warn!(%bridge, error = %e, "action type registration failed");
            return Readiness::BridgeUnavailable;
        }

        if permission.is_granted() {
            info!(%bridge, channel = %self.channel.id, "notifications ready");
            Readiness::Ready
        } else {
            info!(%bridge, ?permission, "notification permission not granted; reminders stay in-app only");
            Readiness::PermissionDenied
        }
    }

    async fn ensure_permission(&self) -> Result<Permission, BridgeError> {
        let current = self.bridge.check_permission().await?;
        if current.is_granted() {
            return Ok(current);
        }
        self.bridge.request_permission().await
    }
}

/// Registering something that already exists is success from our side.
fn accept_existing(result: Result<(), BridgeError>) -> Result<(), BridgeError> {
    match result {
        Err(BridgeError::AlreadyExists(_)) => Ok(()),
        other => other,
    }
}
