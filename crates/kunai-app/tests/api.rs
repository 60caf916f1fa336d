#![expect(clippy::unwrap_used, reason = "Test setup panics on malformed fixtures")]
//! HTTP tests for the scheduling API, driven through salvo's test client.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use kunai_app::app::api::routes;
use kunai_app::config::{ConfigHandler, Settings};
use kunai_core::constants::USER_HEADER;
use kunai_service::clock::ManualClock;
use kunai_service::command::SchedulingContext;
use kunai_service::depot::SchedulingContextHandler;
use salvo::http::StatusCode;
use salvo::prelude::*;
use salvo::test::{RequestBuilder, ResponseExt, TestClient};
use serde_json::{Value, json};

const BASE: &str = "http://127.0.0.1:5800/api";

/// Tuesday 2026-10-20 13:00 UTC; users default to UTC.
fn service() -> Service {
    let settings = Settings::defaults().unwrap();
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 10, 20, 13, 0, 0).unwrap()));
    let context = Arc::new(SchedulingContext::from_settings(&settings, clock).unwrap());
    Service::new(
        Router::new()
            .hoop(ConfigHandler { settings })
            .hoop(SchedulingContextHandler { context })
            .push(routes()),
    )
}

fn as_user(builder: RequestBuilder, user: &str) -> RequestBuilder {
    builder.add_header(USER_HEADER, user.to_string(), true)
}

async fn send(builder: RequestBuilder, service: &Service) -> (StatusCode, Value) {
    let mut response = builder.send(service).await;
    let status = response.status_code.unwrap_or(StatusCode::OK);
    let body = response.take_json::<Value>().await.unwrap_or(Value::Null);
    (status, body)
}

async fn schedule(service: &Service, user: &str, text: &str) -> (StatusCode, Value) {
    send(
        as_user(TestClient::post(format!("{BASE}/schedule")), user).json(&json!({ "text": text })),
        service,
    )
    .await
}

#[tokio::test]
async fn health_needs_no_user() {
    let service = service();
    let (status, body) = send(TestClient::get(format!("{BASE}/health")), &service).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["reminders_enabled"], true);
}

#[tokio::test]
async fn missing_user_header_is_unauthorized() {
    let service = service();
    let (status, body) = send(TestClient::get(format!("{BASE}/meetings")), &service).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing x-kunai-user header");

    let (status, _) = send(as_user(TestClient::get(format!("{BASE}/meetings")), "  "), &service).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[test_log::test(tokio::test)]
async fn confident_request_is_created_and_listed() {
    let service = service();
    let (status, body) = schedule(&service, "alice", "standup every wednesday at 6:30pm").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "created");
    assert_eq!(body["meetings"].as_array().unwrap().len(), 1);

    let (status, body) = send(as_user(TestClient::get(format!("{BASE}/meetings")), "alice"), &service).await;
    assert_eq!(status, StatusCode::OK);
    let meetings = body.as_array().unwrap();
    assert_eq!(meetings.len(), 1);
    assert_eq!(meetings[0]["rrule"], "FREQ=WEEKLY;BYDAY=WE");
    assert_eq!(meetings[0]["next"], "2026-10-21T18:30:00Z");
    assert_eq!(meetings[0]["has_exceptions"], false);

    let (_, body) = send(as_user(TestClient::get(format!("{BASE}/meetings")), "bob"), &service).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn unreadable_request_fails() {
    let service = service();
    let (status, body) = schedule(&service, "alice", "asdkjasdkj").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["failures"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        as_user(TestClient::post(format!("{BASE}/schedule")), "alice").json(&json!({ "words": 1 })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_request_timezone_is_bad_request() {
    let service = service();
    let (status, _) = send(
        as_user(TestClient::post(format!("{BASE}/schedule")), "alice")
            .json(&json!({ "text": "call tomorrow at 3pm", "timezone": "Mars/Olympus_Mons" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn uncertain_request_is_confirmed_by_its_owner() {
    let service = service();
    let (status, body) = schedule(&service, "alice", "call at 7").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "needs_confirmation");
    let token = body["token"].clone();

    let (_, listed) = send(as_user(TestClient::get(format!("{BASE}/meetings")), "alice"), &service).await;
    assert_eq!(listed, json!([]));

    let confirm = format!("{BASE}/schedule/confirm");
    let (status, _) = send(
        as_user(TestClient::post(&confirm), "bob").json(&json!({ "token": token })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        as_user(TestClient::post(&confirm), "alice").json(&json!({ "token": token })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(
        as_user(TestClient::post(&confirm), "alice").json(&json!({ "token": token })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rejected_drafts_are_dropped() {
    let service = service();
    let (_, body) = schedule(&service, "alice", "call at 7").await;
    let (status, body) = send(
        as_user(TestClient::post(format!("{BASE}/schedule/reject")), "alice")
            .json(&json!({ "token": body["token"] })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rejected"], 1);
}

#[test_log::test(tokio::test)]
async fn manage_checks_id_and_owner() {
    let service = service();
    let (_, body) = schedule(&service, "alice", "standup every wednesday at 6:30pm").await;
    let id = body["meetings"][0]["id"].as_str().unwrap().to_string();
    let cancel = json!({ "action": "cancel-instance" });

    let (status, _) = send(
        as_user(TestClient::post(format!("{BASE}/meetings/not-an-id/manage")), "alice").json(&cancel),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        as_user(
            TestClient::post(format!("{BASE}/meetings/6f1c1d3e-8a7b-4c2d-9e0f-1a2b3c4d5e6f/manage")),
            "alice",
        )
        .json(&cancel),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let manage = format!("{BASE}/meetings/{id}/manage");
    let (status, _) = send(as_user(TestClient::post(&manage), "bob").json(&cancel), &service).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(as_user(TestClient::post(&manage), "alice").json(&cancel), &service).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "occurrence_cancelled");
    assert_eq!(body["date"], "2026-10-21");

    let (status, body) = send(
        as_user(TestClient::post(&manage), "alice")
            .json(&json!({ "action": "reschedule-instance", "text": "at 8pm", "date": "2026-10-28" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "occurrence_rescheduled");
    assert_eq!(body["at"], "2026-10-28T20:00:00Z");

    let (status, body) = send(
        as_user(TestClient::post(&manage), "alice")
            .json(&json!({ "action": "reschedule-series", "text": "asdkjasdkj" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{body}");

    let (status, body) = send(
        as_user(TestClient::post(&manage), "alice").json(&json!({ "action": "cancel-series" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "deleted");
}

#[tokio::test]
async fn clear_all_takes_two_steps() {
    let service = service();
    schedule(&service, "alice", "standup every wednesday at 6:30pm").await;
    schedule(&service, "alice", "standup every friday at 9am").await;

    let (status, request) = send(
        as_user(TestClient::post(format!("{BASE}/meetings/clear")), "alice"),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(request["pending"], 2);

    let confirm = format!("{BASE}/meetings/clear/confirm");
    let (status, _) = send(
        as_user(TestClient::post(&confirm), "alice")
            .json(&json!({ "token": "6f1c1d3e-8a7b-4c2d-9e0f-1a2b3c4d5e6f" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        as_user(TestClient::post(&confirm), "alice").json(&json!({ "token": request["token"] })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], 2);

    let (_, listed) = send(as_user(TestClient::get(format!("{BASE}/meetings")), "alice"), &service).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn timezone_is_normalized_and_stored() {
    let service = service();
    let url = format!("{BASE}/timezone");

    let (_, body) = send(as_user(TestClient::get(&url), "alice"), &service).await;
    assert_eq!(body["timezone"], "UTC");

    let (status, body) = send(
        as_user(TestClient::put(&url), "alice").json(&json!({ "timezone": "Eastern Standard Time" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timezone"], "America/New_York");

    let (_, body) = send(as_user(TestClient::get(&url), "alice"), &service).await;
    assert_eq!(body["timezone"], "America/New_York");

    let (status, _) = send(
        as_user(TestClient::put(&url), "alice").json(&json!({ "timezone": "Mars/Olympus_Mons" })),
        &service,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
