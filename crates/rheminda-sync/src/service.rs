use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rheminda_api::ReminderApi;
use rheminda_core::{Reminder, ReminderId, ReminderPatch, RhemindaConfig};
use rheminda_notify::{CancelOutcome, ScheduleOutcome, Scheduler, SyncReport};
use tracing::{debug, info};

use crate::{error::Result, lock::KeyedLocks};

/// A reminder as re-read from the server after a change, with what the
/// scheduler did with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Rescheduled {
    pub reminder: Reminder,
    pub outcome: ScheduleOutcome,
}

/// Mutation paths: each is a server call followed by the matching
/// scheduler call.
///
/// Local notifications change only after the server accepted the change, so
/// a failed request leaves the OS queue as it was. Every mutation of an id
/// holds that id's lock for its whole duration.
pub struct ReminderService {
    api: Arc<dyn ReminderApi>,
    scheduler: Arc<Scheduler>,
    user_id: String,
    snooze_delay: Duration,
    locks: Arc<KeyedLocks>,
}

impl ReminderService {
    pub fn new(api: Arc<dyn ReminderApi>, scheduler: Arc<Scheduler>, config: &RhemindaConfig) -> Self {
        Self {
            api,
            scheduler,
            user_id: config.api.user_id.clone(),
            snooze_delay: config.notifications.snooze_delay(),
            locks: Arc::new(KeyedLocks::new()),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn snooze_delay(&self) -> Duration {
        self.snooze_delay
    }

    /// Fetch the full history and bring the OS queue in line with it.
    pub async fn refresh(&self) -> Result<(Vec<Reminder>, SyncReport)> {
        let reminders = self.api.history(&self.user_id).await?;
        let report = self.scheduler.sync(&reminders).await;
        Ok((reminders, report))
    }

    /// Same as [`refresh`](Self::refresh) for the home feed.
    pub async fn recent(&self) -> Result<(Vec<Reminder>, SyncReport)> {
        let reminders = self.api.home(&self.user_id).await?;
        let report = self.scheduler.sync(&reminders).await;
        Ok((reminders, report))
    }

    /// Schedule a reminder the UI just created.
    pub async fn track(&self, reminder: &Reminder) -> ScheduleOutcome {
        let _guard = self.locks.lock(&reminder.id).await;
        self.scheduler.schedule(reminder).await
    }

    pub async fn edit(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<Rescheduled> {
        let _guard = self.locks.lock(id).await;
        self.edit_locked(id, patch).await
    }

    pub async fn snooze(&self, id: &ReminderId) -> Result<Rescheduled> {
        self.snooze_at(id, Utc::now()).await
    }

    /// Push the reminder to `now + snooze delay` and schedule the server's
    /// copy of the result.
    pub async fn snooze_at(&self, id: &ReminderId, now: DateTime<Utc>) -> Result<Rescheduled> {
        let _guard = self.locks.lock(id).await;
        self.snooze_locked(id, now).await
    }

    /// Mark done on the server, then drop the local notification. Safe to
    /// repeat.
    pub async fn complete(&self, id: &ReminderId) -> Result<CancelOutcome> {
        let _guard = self.locks.lock(id).await;
        self.api.update(id, &ReminderPatch::complete()).await?;
        let cancel = self.scheduler.cancel(id).await;
        info!(reminder_id = %id, "reminder completed");
        Ok(cancel)
    }

    /// Delete on the server and cancel locally. A reminder already gone
    /// from the server is still cancelled.
    pub async fn delete(&self, id: &ReminderId) -> Result<CancelOutcome> {
        let _guard = self.locks.lock(id).await;
        match self.api.delete(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(reminder_id = %id, "already deleted on server");
            }
            Err(e) => return Err(e.into()),
        }
        Ok(self.scheduler.cancel(id).await)
    }

    async fn edit_locked(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<Rescheduled> {
        let current = self.api.get(id).await?;
        patch.validate_against(&current)?;
        if patch.is_empty() {
            let outcome = self.scheduler.schedule(&current).await;
            return Ok(Rescheduled {
                reminder: current,
                outcome,
            });
        }
        self.api.update(id, patch).await?;
        let fresh = self.api.get(id).await?;
        let outcome = self.scheduler.schedule(&fresh).await;
        info!(reminder_id = %id, "reminder edited");
        Ok(Rescheduled {
            reminder: fresh,
            outcome,
        })
    }

    async fn snooze_locked(&self, id: &ReminderId, now: DateTime<Utc>) -> Result<Rescheduled> {
        let until = now + self.snooze_delay;
        self.api.update(id, &ReminderPatch::snooze(until)).await?;
        // Never schedule from what we sent: the server may have adjusted it.
        let fresh = self.api.get(id).await?;
        let outcome = self.scheduler.schedule_as_of(&fresh, now).await;
        info!(reminder_id = %id, until = %fresh.remind_at, "reminder snoozed");
        Ok(Rescheduled {
            reminder: fresh,
            outcome,
        })
    }
}
