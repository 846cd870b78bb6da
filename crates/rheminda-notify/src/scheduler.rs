use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rheminda_core::config::NotificationConfig;
use rheminda_core::{slot_of, Reminder, ReminderId, RescheduleStrategy, Slot};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    bridge::NotificationBridge,
    error::BridgeError,
    types::{LocalNotification, NotificationExtra, NotificationSchedule},
};

/// Why a reminder was cancelled instead of scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    Completed,
    PastDue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    PermissionNotGranted,
    BridgeUnavailable,
}

/// What the scheduler decided for one reminder, before touching the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    Schedule(LocalNotification),
    Cancel { slot: Slot, reason: CancelReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled { slot: Slot, at: DateTime<Utc> },
    Cancelled { slot: Slot, reason: CancelReason },
    /// Degraded to a no-op; the reminder stays visible in-app only.
    Skipped { slot: Slot, reason: SkipReason },
    Failed { slot: Slot },
}

impl ScheduleOutcome {
    pub fn slot(&self) -> Slot {
        match *self {
            ScheduleOutcome::Scheduled { slot, .. }
            | ScheduleOutcome::Cancelled { slot, .. }
            | ScheduleOutcome::Skipped { slot, .. }
            | ScheduleOutcome::Failed { slot } => slot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CancelOutcome {
    Cancelled { slot: Slot },
    Skipped { slot: Slot, reason: SkipReason },
    Failed { slot: Slot },
}

impl CancelOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CancelOutcome::Cancelled { .. })
    }
}

/// Tally of a [`Scheduler::sync`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub scheduled: usize,
    pub cancelled: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Slots claimed by more than one active reminder in the batch. The last
    /// reminder in list order owns the slot.
    pub collisions: Vec<Slot>,
}

/// Projects reminders onto the OS notification queue.
///
/// Holds no reminder state: every call works from the record it is given.
/// Bridge failures never propagate; they degrade to "no local alert" and are
/// logged.
pub struct Scheduler {
    bridge: Arc<dyn NotificationBridge>,
    config: NotificationConfig,
}

impl Scheduler {
    pub fn new(bridge: Arc<dyn NotificationBridge>, config: &NotificationConfig) -> Self {
        Self {
            bridge,
            config: config.clone(),
        }
    }

    pub fn bridge(&self) -> &Arc<dyn NotificationBridge> {
        &self.bridge
    }

    /// Decide what `reminder` should look like on the OS queue at `now`.
    ///
    /// Completed and past-due reminders are cancelled; everything else gets
    /// a single notification at `remind_at`. Recurring rules are not
    /// expanded.
    pub fn plan(&self, reminder: &Reminder, now: DateTime<Utc>) -> Plan {
        let slot = slot_of(reminder.id.as_str());
        if reminder.is_completed() {
            return Plan::Cancel {
                slot,
                reason: CancelReason::Completed,
            };
        }
        if reminder.is_past_due(now) {
            return Plan::Cancel {
                slot,
                reason: CancelReason::PastDue,
            };
        }
        Plan::Schedule(self.notification_for(reminder))
    }

    /// Build the bridge payload for `reminder` without checking its state.
    pub fn notification_for(&self, reminder: &Reminder) -> LocalNotification {
        LocalNotification {
            id: slot_of(reminder.id.as_str()),
            title: self.config.heading.clone(),
            body: compose_body(reminder),
            schedule: NotificationSchedule {
                at: reminder.remind_at,
            },
            channel_id: self.config.channel.id.clone(),
            action_type_id: self.config.actions.type_id.clone(),
            extra: NotificationExtra {
                reminder_id: reminder.id.clone(),
            },
            small_icon: self.config.small_icon.clone(),
            icon_color: self.config.icon_color.clone(),
        }
    }

    pub async fn schedule(&self, reminder: &Reminder) -> ScheduleOutcome {
        self.schedule_as_of(reminder, Utc::now()).await
    }

    /// [`schedule`](Self::schedule) against an explicit clock.
    pub async fn schedule_as_of(&self, reminder: &Reminder, now: DateTime<Utc>) -> ScheduleOutcome {
        let notification = match self.plan(reminder, now) {
            Plan::Cancel { slot, reason } => {
                debug!(reminder_id = %reminder.id, %slot, ?reason, "not schedulable, cancelling");
                return match self.cancel_slot(&reminder.id, slot).await {
                    CancelOutcome::Cancelled { slot } => ScheduleOutcome::Cancelled { slot, reason },
                    CancelOutcome::Skipped { slot, reason } => ScheduleOutcome::Skipped { slot, reason },
                    CancelOutcome::Failed { slot } => ScheduleOutcome::Failed { slot },
                };
            }
            Plan::Schedule(n) => n,
        };

        let slot = notification.id;
        let at = notification.fire_at();

        if let Err(reason) = self.permission_gate(slot).await {
            return ScheduleOutcome::Skipped { slot, reason };
        }

        if self.config.reschedule == RescheduleStrategy::CancelThenSchedule {
            if let Err(e) = self.bridge.cancel(vec![slot]).await {
                return self.degrade(&reminder.id, slot, e).into_schedule(slot);
            }
        }

        match self.bridge.schedule(vec![notification]).await {
            Ok(()) => {
                info!(reminder_id = %reminder.id, %slot, %at, "local notification scheduled");
                ScheduleOutcome::Scheduled { slot, at }
            }
            Err(e) => self.degrade(&reminder.id, slot, e).into_schedule(slot),
        }
    }

    /// Remove any pending notification for `id`. Empty slots are fine.
    pub async fn cancel(&self, id: &ReminderId) -> CancelOutcome {
        self.cancel_slot(id, slot_of(id.as_str())).await
    }

    /// Bring the OS queue in line with a freshly fetched list.
    pub async fn sync(&self, reminders: &[Reminder]) -> SyncReport {
        self.sync_as_of(reminders, Utc::now()).await
    }

    /// [`sync`](Self::sync) against an explicit clock.
    ///
    /// Cancels go out before schedules in two batched bridge calls, so an
    /// active reminder sharing a slot with a finished one keeps its alert.
    pub async fn sync_as_of(&self, reminders: &[Reminder], now: DateTime<Utc>) -> SyncReport {
        let mut report = SyncReport::default();
        let mut cancels = Vec::new();
        let mut schedules = Vec::new();
        let mut owners: HashMap<Slot, &ReminderId> = HashMap::new();

        for reminder in reminders {
            match self.plan(reminder, now) {
                Plan::Cancel { slot, .. } => cancels.push(slot),
                Plan::Schedule(n) => {
                    if let Some(previous) = owners.insert(n.id, &reminder.id) {
                        if previous != &reminder.id {
                            warn!(
                                slot = %n.id,
                                first = %previous,
                                second = %reminder.id,
                                "slot collision: later reminder replaces earlier one"
                            );
                            report.collisions.push(n.id);
                        }
                    }
                    schedules.push(n);
                }
            }
        }

        if !cancels.is_empty() {
            let count = cancels.len();
            match self.bridge.cancel(cancels).await {
                Ok(()) => report.cancelled += count,
                Err(e) => {
                    warn!(error = %e, count, "batch cancel failed");
                    tally_failure(&mut report, &e, count);
                }
            }
        }

        if !schedules.is_empty() {
            let count = schedules.len();
            let slot = schedules[0].id;
            if self.permission_gate(slot).await.is_err() {
                report.skipped += count;
            } else {
                let replaced: Vec<Slot> = schedules.iter().map(|n| n.id).collect();
                let cleared = if self.config.reschedule == RescheduleStrategy::CancelThenSchedule {
                    self.bridge.cancel(replaced).await
                } else {
                    Ok(())
                };
                match cleared {
                    Ok(()) => match self.bridge.schedule(schedules).await {
                        Ok(()) => report.scheduled += count,
                        Err(e) => {
                            warn!(error = %e, count, "batch schedule failed");
                            tally_failure(&mut report, &e, count);
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, count, "batch cancel before schedule failed");
                        tally_failure(&mut report, &e, count);
                    }
                }
            }
        }

        info!(
            scheduled = report.scheduled,
            cancelled = report.cancelled,
            skipped = report.skipped,
            failed = report.failed,
            collisions = report.collisions.len(),
            "notification sync complete"
        );
        report
    }

    // --- private helpers ---------------------------------------------------

    async fn cancel_slot(&self, id: &ReminderId, slot: Slot) -> CancelOutcome {
        match self.bridge.cancel(vec![slot]).await {
            Ok(()) => {
                debug!(reminder_id = %id, %slot, "local notification cancelled");
                CancelOutcome::Cancelled { slot }
            }
            Err(e) => self.degrade(id, slot, e),
        }
    }

    /// `Ok` when alerts may be posted; the skip reason otherwise.
    async fn permission_gate(&self, slot: Slot) -> Result<(), SkipReason> {
        match self.bridge.check_permission().await {
            Ok(p) if p.is_granted() => Ok(()),
            Ok(p) => {
                debug!(%slot, permission = ?p, "notification permission not granted, skipping");
                Err(SkipReason::PermissionNotGranted)
            }
            Err(e) if e.is_unavailable() => {
                debug!(%slot, error = %e, "bridge unavailable, skipping");
                Err(SkipReason::BridgeUnavailable)
            }
            Err(e) => {
                warn!(%slot, error = %e, "permission check failed, skipping");
                Err(SkipReason::PermissionNotGranted)
            }
        }
    }

    fn degrade(&self, id: &ReminderId, slot: Slot, e: BridgeError) -> CancelOutcome {
        match e {
            BridgeError::Unavailable(_) => {
                debug!(reminder_id = %id, %slot, error = %e, "bridge unavailable, ignoring");
                CancelOutcome::Skipped {
                    slot,
                    reason: SkipReason::BridgeUnavailable,
                }
            }
            BridgeError::PermissionDenied => CancelOutcome::Skipped {
                slot,
                reason: SkipReason::PermissionNotGranted,
            },
            other => {
                warn!(reminder_id = %id, %slot, error = %other, "notification bridge call failed");
                CancelOutcome::Failed { slot }
            }
        }
    }
}

impl CancelOutcome {
    fn into_schedule(self, slot: Slot) -> ScheduleOutcome {
        match self {
            CancelOutcome::Skipped { reason, .. } => ScheduleOutcome::Skipped { slot, reason },
            _ => ScheduleOutcome::Failed { slot },
        }
    }
}

fn tally_failure(report: &mut SyncReport, e: &BridgeError, count: usize) {
    match e {
        BridgeError::Unavailable(_) | BridgeError::PermissionDenied => report.skipped += count,
        _ => report.failed += count,
    }
}

/// The reminder title, then its extra info on a second line when present.
pub fn compose_body(reminder: &Reminder) -> String {
    match reminder.note() {
        Some(note) => format!("{}\n📝 {}", reminder.title, note),
        None => reminder.title.clone(),
    }
}
