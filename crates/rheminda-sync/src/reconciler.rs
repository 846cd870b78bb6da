use std::sync::Arc;

use chrono::{DateTime, Utc};
use rheminda_core::{ReminderId, Slot};
use rheminda_notify::{ActionPerformed, CancelOutcome, NotificationAction, ScheduleOutcome};
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::{error::SyncError, service::ReminderService};

/// Ask the UI to open the detail view for a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationIntent {
    pub reminder_id: ReminderId,
}

/// What handling one action event amounted to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Tap: navigation intent emitted, nothing mutated.
    Surfaced { reminder_id: ReminderId },
    Completed {
        reminder_id: ReminderId,
        cancel: CancelOutcome,
    },
    Snoozed {
        reminder_id: ReminderId,
        until: DateTime<Utc>,
        schedule: ScheduleOutcome,
    },
    /// The reminder no longer exists on the server.
    Gone { reminder_id: ReminderId },
    /// The server could not be reached or refused the change. Local
    /// notifications were left as they were.
    Deferred {
        reminder_id: ReminderId,
        action: NotificationAction,
        reason: String,
    },
    /// Unknown action or no reminder id in the payload.
    Ignored,
}

/// Turns notification action events into server mutations and the local
/// follow-up.
///
/// Holds no reminder state. Everything is rebuilt from the event payload and
/// a server read, so handling is safe after a cold start.
pub struct ActionReconciler {
    service: Arc<ReminderService>,
    intents: Option<mpsc::Sender<NavigationIntent>>,
}

impl ActionReconciler {
    pub fn new(service: Arc<ReminderService>) -> Self {
        Self {
            service,
            intents: None,
        }
    }

    /// Deliver tap events to the UI on `tx`.
    pub fn with_intents(mut self, tx: mpsc::Sender<NavigationIntent>) -> Self {
        self.intents = Some(tx);
        self
    }

    pub async fn handle(&self, event: ActionPerformed) -> ActionOutcome {
        self.handle_at(event, Utc::now()).await
    }

    /// [`handle`](Self::handle) against an explicit clock.
    pub async fn handle_at(&self, event: ActionPerformed, now: DateTime<Utc>) -> ActionOutcome {
        let Some(action) = event.action() else {
            warn!(action = %event.action_id, "unknown notification action, ignoring");
            return ActionOutcome::Ignored;
        };
        let Some(id) = event.reminder_id().cloned() else {
            warn!(%action, slot = ?event.notification.id.map(Slot::get), "action event carries no reminder id, ignoring");
            return ActionOutcome::Ignored;
        };

        debug!(reminder_id = %id, %action, "handling notification action");
        match action {
            NotificationAction::Tap => self.surface(id).await,
            NotificationAction::Complete => match self.service.complete(&id).await {
                Ok(cancel) => ActionOutcome::Completed {
                    reminder_id: id,
                    cancel,
                },
                Err(e) => classify(id, action, e),
            },
            NotificationAction::Snooze => match self.service.snooze_at(&id, now).await {
                Ok(done) => ActionOutcome::Snoozed {
                    reminder_id: id,
                    until: done.reminder.remind_at,
                    schedule: done.outcome,
                },
                Err(e) => classify(id, action, e),
            },
        }
    }

    /// Handle events until the stream closes or `shutdown` flips to `true`.
    ///
    /// Events are handled one at a time in arrival order.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<ActionPerformed>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("action reconciler started");
        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(event) => {
                            self.handle(event).await;
                        }
                        None => {
                            info!("action event stream closed");
                            break;
                        }
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("action reconciler shutting down");
                        break;
                    }
                }
            }
        }
    }

    async fn surface(&self, id: ReminderId) -> ActionOutcome {
        if let Some(tx) = &self.intents {
            let intent = NavigationIntent {
                reminder_id: id.clone(),
            };
            if tx.send(intent).await.is_err() {
                warn!(reminder_id = %id, "navigation receiver dropped");
            }
        }
        ActionOutcome::Surfaced { reminder_id: id }
    }
}

fn classify(id: ReminderId, action: NotificationAction, e: SyncError) -> ActionOutcome {
    if e.is_gone() {
        info!(reminder_id = %id, %action, "reminder no longer exists, nothing to do");
        return ActionOutcome::Gone { reminder_id: id };
    }
    warn!(reminder_id = %id, %action, error = %e, "action not applied; notification state left unchanged");
    ActionOutcome::Deferred {
        reminder_id: id,
        action,
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rheminda_api::MemoryReminderApi;
    use rheminda_core::{Reminder, RhemindaConfig};
    use rheminda_notify::{MemoryBridge, Scheduler};

    const ID: &str = "64fae2b1d9a0c123456789ab";

    fn reconciler(api: Arc<MemoryReminderApi>, bridge: Arc<MemoryBridge>) -> ActionReconciler {
        let config = RhemindaConfig::default();
        let scheduler = Arc::new(Scheduler::new(bridge, &config.notifications));
        ActionReconciler::new(Arc::new(ReminderService::new(api, scheduler, &config)))
    }

    #[tokio::test]
    async fn unknown_action_is_ignored() {
        let api = Arc::new(MemoryReminderApi::new());
        let r = reconciler(api.clone(), Arc::new(MemoryBridge::new()));
        let outcome = r.handle(ActionPerformed::new("dismiss", ID)).await;
        assert_eq!(outcome, ActionOutcome::Ignored);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn tap_emits_intent_without_server_call() {
        let api = Arc::new(MemoryReminderApi::new());
        let (tx, mut rx) = mpsc::channel(4);
        let r = reconciler(api.clone(), Arc::new(MemoryBridge::new())).with_intents(tx);

        let outcome = r.handle(ActionPerformed::new("tap", ID)).await;
        assert!(matches!(outcome, ActionOutcome::Surfaced { .. }));
        assert_eq!(rx.recv().await.unwrap().reminder_id.as_str(), ID);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let api = Arc::new(MemoryReminderApi::with_reminders([Reminder::new(
            ID,
            "Pay rent",
            Utc::now() + Duration::hours(1),
        )]));
        let r = Arc::new(reconciler(api.clone(), Arc::new(MemoryBridge::new())));
        let (events_tx, events_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = {
            let r = r.clone();
            tokio::spawn(async move { r.run(events_rx, shutdown_rx).await })
        };
        events_tx.send(ActionPerformed::new("complete", ID)).await.unwrap();

        // Wait for the event to be applied before stopping.
        for _ in 0..50 {
            if api.reminder(&ID.into()).unwrap().is_completed() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();
        assert!(api.reminder(&ID.into()).unwrap().is_completed());
    }
}
