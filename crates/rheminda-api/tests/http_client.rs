use chrono::{TimeZone, Utc};
use rheminda_api::{ApiError, HttpReminderApi, ReminderApi};
use rheminda_core::config::ApiConfig;
use rheminda_core::{RecurringRule, ReminderId, ReminderPatch, ReminderStatus};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ID: &str = "64fae2b1d9a0c123456789ab";

fn api_for(server: &MockServer) -> HttpReminderApi {
    let config = ApiConfig {
        base_url: format!("{}/", server.uri()),
        request_timeout_secs: 1,
        connect_timeout_secs: 1,
        ..ApiConfig::default()
    };
    HttpReminderApi::new(&config).unwrap()
}

fn server_record() -> serde_json::Value {
    json!({
        "_id": ID,
        "title": "Pay rent",
        "remind_at": "2030-01-01T09:00:00",
        "extra_info": "landlord prefers transfer",
        "recurring_rule": "monthly",
        "status": "pending",
        "user_id": "default_user",
        "creation_mode": "text"
    })
}

#[tokio::test]
async fn get_parses_server_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/reminders/{ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(server_record()))
        .mount(&server)
        .await;

    let reminder = api_for(&server).get(&ReminderId::from(ID)).await.unwrap();
    assert_eq!(reminder.id.as_str(), ID);
    assert_eq!(reminder.remind_at, Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap());
    assert_eq!(reminder.recurring_rule, Some(RecurringRule::Monthly));
    assert_eq!(reminder.status, ReminderStatus::Pending);
    assert_eq!(reminder.creation_mode.as_deref(), Some("text"));
}

#[tokio::test]
async fn get_missing_reminder_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/reminders/{ID}")))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;

    let err = api_for(&server).get(&ReminderId::from(ID)).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn history_reads_a_list_with_null_rules() {
    let server = MockServer::start().await;
    let mut second = server_record();
    second["_id"] = json!("64fae2b1d9a0c1230000aaaa");
    second["recurring_rule"] = json!(null);
    second["status"] = json!("completed");
    Mock::given(method("GET"))
        .and(path("/reminders/history/default_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([server_record(), second])))
        .mount(&server)
        .await;

    let list = api_for(&server).history("default_user").await.unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].recurring_rule, None);
    assert!(list[1].is_completed());
}

#[tokio::test]
async fn home_hits_home_feed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reminders/home/sam"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([server_record()])))
        .expect(1)
        .mount(&server)
        .await;

    let list = api_for(&server).home("sam").await.unwrap();
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn snooze_patch_sends_only_status_and_time() {
    let server = MockServer::start().await;
    let until = Utc.with_ymd_and_hms(2030, 1, 1, 9, 10, 0).unwrap();
    Mock::given(method("PUT"))
        .and(path(format!("/reminders/{ID}")))
        .and(body_json(json!({
            "status": "snoozed",
            "remind_at": "2030-01-01T09:10:00Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "updated"})))
        .expect(1)
        .mount(&server)
        .await;

    api_for(&server)
        .update(&ReminderId::from(ID), &ReminderPatch::snooze(until))
        .await
        .unwrap();
}

#[tokio::test]
async fn clearing_a_rule_sends_null() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/reminders/{ID}")))
        .and(body_json(json!({"recurring_rule": null})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let patch = ReminderPatch {
        recurring_rule: Some(None),
        ..ReminderPatch::default()
    };
    api_for(&server)
        .update(&ReminderId::from(ID), &patch)
        .await
        .unwrap();
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/reminders/{ID}")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = api_for(&server).delete(&ReminderId::from(ID)).await.unwrap_err();
    match err {
        ApiError::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/reminders/{ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = api_for(&server).get(&ReminderId::from(ID)).await.unwrap_err();
    assert!(matches!(err, ApiError::Parse(_)), "got {err:?}");
}

#[tokio::test]
async fn slow_server_is_a_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(format!("/reminders/{ID}")))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let err = api_for(&server)
        .update(&ReminderId::from(ID), &ReminderPatch::complete())
        .await
        .unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_a_network_failure() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:1".into(),
        ..ApiConfig::default()
    };
    let api = HttpReminderApi::new(&config).unwrap();
    let err = api
        .update(&ReminderId::from(ID), &ReminderPatch::complete())
        .await
        .unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}
