use std::time::Duration;

use async_trait::async_trait;
use rheminda_core::config::ApiConfig;
use rheminda_core::{Reminder, ReminderId, ReminderPatch};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};

/// The server operations the notification core depends on.
///
/// Every read returns a fresh copy; implementations must not cache.
#[async_trait]
pub trait ReminderApi: Send + Sync {
    async fn get(&self, id: &ReminderId) -> Result<Reminder>;

    /// Full history for `user_id`, newest `remind_at` first.
    async fn history(&self, user_id: &str) -> Result<Vec<Reminder>>;

    /// The few most recent reminders shown on the home screen.
    async fn home(&self, user_id: &str) -> Result<Vec<Reminder>>;

    /// Partial update. Only the fields set on `patch` are sent.
    async fn update(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()>;

    async fn delete(&self, id: &ReminderId) -> Result<()>;
}

pub struct HttpReminderApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReminderApi {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config.normalized_base_url()))
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/reminders/{}", self.base_url, path)
    }

    /// Send `req`, mapping transport failures and non-2xx statuses.
    /// `id` turns a 404 into [`ApiError::NotFound`].
    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        id: Option<&ReminderId>,
    ) -> Result<reqwest::Response> {
        let resp = req.send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ApiError::Network(e.to_string())
            } else {
                ApiError::Http(e)
            }
        })?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                debug!(reminder_id = %id, "reminder not found on server");
                return Err(ApiError::NotFound { id: id.clone() });
            }
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "reminder API error");
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(resp)
    }

    async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        resp.json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

#[async_trait]
impl ReminderApi for HttpReminderApi {
    async fn get(&self, id: &ReminderId) -> Result<Reminder> {
        debug!(reminder_id = %id, "fetching reminder");
        let resp = self.send(self.client.get(self.url(id.as_str())), Some(id)).await?;
        Self::read_json(resp).await
    }

    async fn history(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let url = self.url(&format!("history/{user_id}"));
        let resp = self.send(self.client.get(url), None).await?;
        let reminders: Vec<Reminder> = Self::read_json(resp).await?;
        debug!(user_id, count = reminders.len(), "fetched reminder history");
        Ok(reminders)
    }

    async fn home(&self, user_id: &str) -> Result<Vec<Reminder>> {
        let url = self.url(&format!("home/{user_id}"));
        let resp = self.send(self.client.get(url), None).await?;
        Self::read_json(resp).await
    }

    async fn update(&self, id: &ReminderId, patch: &ReminderPatch) -> Result<()> {
        debug!(reminder_id = %id, status = ?patch.status, "updating reminder");
        let req = self.client.put(self.url(id.as_str())).json(patch);
        self.send(req, Some(id)).await?;
        Ok(())
    }

    async fn delete(&self, id: &ReminderId) -> Result<()> {
        debug!(reminder_id = %id, "deleting reminder");
        self.send(self.client.delete(self.url(id.as_str())), Some(id))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_loses_trailing_slashes() {
        let api = HttpReminderApi::with_client(reqwest::Client::new(), "http://127.0.0.1:8000//");
        assert_eq!(api.base_url(), "http://127.0.0.1:8000");
        assert_eq!(
            api.url("64fae2b1d9a0c123456789ab"),
            "http://127.0.0.1:8000/reminders/64fae2b1d9a0c123456789ab"
        );
    }

    #[test]
    fn builds_from_config() {
        let config = ApiConfig {
            base_url: "http://reminders.local/".into(),
            ..ApiConfig::default()
        };
        let api = HttpReminderApi::new(&config).unwrap();
        assert_eq!(api.base_url(), "http://reminders.local");
    }
}
