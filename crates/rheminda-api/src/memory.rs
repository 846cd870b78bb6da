//! In-process [`ReminderApi`] backed by a map, for tests and offline runs.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rheminda_core::{Reminder, ReminderId, ReminderPatch};

use crate::client::ReminderApi;
use crate::error::{ApiError, Result};

type UpdateHook = Box<dyn Fn(&mut Reminder) + Send + Sync>;

/// One request as the server saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    Get(ReminderId),
    History(String),
    Home(String),
    Update(ReminderId, ReminderPatch),
    Delete(ReminderId),
}

#[derive(Default)]
struct MemoryStore {
    reminders: HashMap<ReminderId, Reminder>,
    offline: bool,
    calls: Vec<ApiCall>,
}

#[derive(Default)]
pub struct MemoryReminderApi {
    store: Mutex<MemoryStore>,
    on_update: Option<UpdateHook>,
}

impl MemoryReminderApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reminders(reminders: impl IntoIterator<Item = Reminder>) -> Self {
        let api = Self::new();
        for r in reminders {
            api.insert(r);
        }
        api
    }

    /// Run `hook` on the stored record after every successful update, the
    /// way a server might normalize or enrich what it was sent.
    pub fn on_update(mut self, hook: impl Fn(&mut Reminder) + Send + Sync + 'static) -> Self {
        self.on_update = Some(Box::new(hook));
        self
    }

    pub fn insert(&self, reminder: Reminder) {
        self.store().reminders.insert(reminder.id.clone(), reminder);
    }

    pub fn remove(&self, id: &ReminderId) -> Option<Reminder> {
        self.store().reminders.remove(id)
    }

    pub fn reminder(&self, id: &ReminderId) -> Option<Reminder> {
        self.store().reminders.get(id).cloned()
    }

    /// While offline every request fails with [`ApiError::Network`].
    pub fn set_offline(&self, offline: bool) {
        self.store().offline = offline;
    }

    pub fn calls(&self) -> Vec<ApiCall> {
        self.store().calls.clone()
    }

    fn store(&self) -> MutexGuard<'_, MemoryStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request(&self, call: ApiCall) -> Result<MutexGuard<'_, MemoryStore>> {
        let mut store = self.store();
        if store.offline {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        store.calls.push(call);
        Ok(store)
    }

    fn list(store: &MemoryStore, user_id: &str) -> Vec<Reminder> {
        let mut list: Vec<Reminder> = store
            .reminders
            .values()
            .filter(|r| r.user_id.as_deref().map_or(true, |u| u == user_id))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.remind_at.cmp(&a.remind_at));
        list
    }
}

fn apply(reminder: &mut Reminder, patch: &ReminderPatch) {
    if let Some(title) = &patch.title {
        reminder.title = title.clone();
    }
    if let Some(at) = patch.remind_at {
        reminder.remind_at = at;
    }
    if let Some(status) = patch.status {
        reminder.status = status;
    }
    if let Some(rule) = patch.recurring_rule {
        reminder.recurring_rule = rule;
    }
    if let Some(info) = &patch.extra_info {
        reminder.extra_info = info.clone();
    }
}

#[async_trait]
impl ReminderApi for MemoryReminderApi {
    async fn get(&self, id: &ReminderId) -> Result<Reminder> {
        let store = self.request(ApiCall::Get(id.clone()))?;
        store
            .reminders
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound { id: id.clone() })
    }

    async fn history(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let store = self.request(ApiCall::History(user_id.to_string()))?;
        Ok(Self::list(&store, user_id))
    }

    async fn home(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let store = self.request(ApiCall::Home(user_id.to_string()))?;
        Ok(Self::list(&store, user_id).into_iter().take(2).collect())
    }

    async fn update(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()> {
        let mut store = self.request(ApiCall::Update(id.clone(), patch.clone()))?;
        let reminder = store
            .reminders
            .get_mut(id)
            .ok_or_else(|| ApiError::NotFound { id: id.clone() })?;
        apply(reminder, patch);
        if let Some(hook) = &self.on_update {
            hook(reminder);
        }
        Ok(())
    }

    async fn delete(&self, id: &ReminderId) -> Result<()> {
        let mut store = self.request(ApiCall::Delete(id.clone()))?;
        store
            .reminders
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::NotFound { id: id.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rheminda_core::ReminderStatus;

    const ID: &str = "64fae2b1d9a0c123456789ab";

    #[tokio::test]
    async fn update_applies_only_set_fields() {
        let api = MemoryReminderApi::with_reminders([Reminder::new(ID, "Pay rent", Utc::now())]);
        let until = Utc::now() + Duration::minutes(10);
        let id = ReminderId::from(ID);

        api.update(&id, &ReminderPatch::snooze(until)).await.unwrap();

        let stored = api.reminder(&id).unwrap();
        assert_eq!(stored.title, "Pay rent");
        assert_eq!(stored.status, ReminderStatus::Snoozed);
        assert_eq!(stored.remind_at, until);
    }

    #[tokio::test]
    async fn update_can_clear_a_note() {
        let mut noted = Reminder::new(ID, "Pay rent", Utc::now());
        noted.extra_info = Some("before 6pm".to_string());
        let api = MemoryReminderApi::with_reminders([noted]);
        let id = ReminderId::from(ID);

        let clear = ReminderPatch {
            extra_info: Some(None),
            ..ReminderPatch::default()
        };
        api.update(&id, &clear).await.unwrap();
        assert_eq!(api.reminder(&id).unwrap().extra_info, None);

        api.update(&id, &ReminderPatch::snooze(Utc::now())).await.unwrap();
        assert_eq!(api.reminder(&id).unwrap().extra_info, None);
    }

    #[tokio::test]
    async fn missing_and_offline_errors() {
        let api = MemoryReminderApi::new();
        let id = ReminderId::from(ID);
        assert!(api.get(&id).await.unwrap_err().is_not_found());

        api.set_offline(true);
        assert!(api.delete(&id).await.unwrap_err().is_network());
        assert!(api.calls().iter().all(|c| !matches!(c, ApiCall::Delete(_))));
    }

    #[tokio::test]
    async fn home_is_two_newest() {
        let now = Utc::now();
        let api = MemoryReminderApi::with_reminders([
            Reminder::new("000000000000000000000001", "a", now),
            Reminder::new("000000000000000000000002", "b", now + Duration::hours(1)),
            Reminder::new("000000000000000000000003", "c", now + Duration::hours(2)),
        ]);
        let titles: Vec<_> = api
            .home("default_user")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["c", "b"]);
    }
}
