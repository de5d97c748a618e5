// ABOUTME: HTTP tests for the habit and health routes driven through the assembled router
// ABOUTME: Checks status mapping, identity headers, request ids and JSON payload shapes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]

mod common;
mod helpers;

use anyhow::Result;
use axum::http::StatusCode;
use axum::Router;
use chrono::TimeDelta;
use chrono_tz::Tz;
use common::{create_test_database, date, seed_client, tracking_service, ProgrammeBuilder};
use habit_coach_server::routes::{build_router, AppContext};
use habit_core::dates::{format_date, today_in};
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};
use std::time::Duration;

struct TestApp {
    router: Router,
    habit_id: uuid::Uuid,
}

impl TestApp {
    fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Client `alice` enrolled in a September programme with one Mon/Wed habit
async fn setup() -> Result<TestApp> {
    let db = create_test_database().await?;
    let alice = seed_client(&db, "alice").await?;
    seed_client(&db, "bob").await?;
    let fixture = ProgrammeBuilder::new("PRG-HTTP", date(2025, 9, 1), Some(date(2025, 9, 30)))
        .habit("Mobility", [1, 0, 1, 0, 0, 0, 0])
        .enrol(&alice)
        .create(&db)
        .await?;
    let router = build_router(
        AppContext::new(tracking_service(&db)),
        Duration::from_secs(30),
    );
    Ok(TestApp {
        router,
        habit_id: fixture.habit_id(0),
    })
}

#[tokio::test]
async fn test_health_and_ready() -> Result<()> {
    let app = setup().await?;

    let health = AxumTestRequest::get("/health").send(app.router()).await;
    assert!(health.header("x-request-id").is_some());
    let body: Value = health.assert_status(StatusCode::OK).json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "habit-coach-server");

    let ready: Value = AxumTestRequest::get("/ready")
        .header("x-request-id", "probe-1")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(ready["status"], "ready");
    Ok(())
}

#[tokio::test]
async fn test_request_id_is_echoed() -> Result<()> {
    let app = setup().await?;
    let response = AxumTestRequest::get("/health")
        .header("x-request-id", "trace-abc")
        .send(app.router())
        .await;
    assert_eq!(response.header("x-request-id").as_deref(), Some("trace-abc"));
    Ok(())
}

#[tokio::test]
async fn test_programmes_route() -> Result<()> {
    let app = setup().await?;

    let body: Value = AxumTestRequest::get("/api/clients/alice/programmes?begin=2025-09-30")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(body["client_id"], "alice");
    assert!(body.get("finish").is_none());
    assert_eq!(body["programmes"][0]["human_id"], "PRG-HTTP");
    assert_eq!(body["programmes"][0]["habits"][0]["title"], "Mobility");

    let after: Value = AxumTestRequest::get("/api/clients/alice/programmes?begin=2025-10-01")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(after["programmes"].as_array().unwrap().len(), 0);

    AxumTestRequest::get("/api/clients/alice/programmes")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::get("/api/clients/nobody/programmes?begin=2025-09-01")
        .as_staff("coach-1", "trainer")
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_identity_is_required_and_scoped() -> Result<()> {
    let app = setup().await?;
    let uri = "/api/clients/alice/days?begin=2025-09-01&finish=2025-09-07";

    AxumTestRequest::get(uri)
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    AxumTestRequest::get(uri)
        .as_client("bob")
        .send(app.router())
        .await
        .assert_status(StatusCode::FORBIDDEN);
    AxumTestRequest::get(uri)
        .as_staff("coach-1", "admin")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK);
    AxumTestRequest::get(uri)
        .as_client("alice")
        .header("x-authenticated-staff", "coach-1")
        .send(app.router())
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_upsert_then_days() -> Result<()> {
    let app = setup().await?;

    let record: Value = AxumTestRequest::put("/api/clients/alice/completions")
        .as_client("alice")
        .json(&json!({
            "programme_habit_id": app.habit_id,
            "habit_date": "2025-09-01",
            "times_done": 1
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(record["habit_date"], "2025-09-01");
    assert_eq!(record["times_done"], 1);
    assert_eq!(record["required_frequency"], 1);
    assert_eq!(record["done"], true);

    let days: Value = AxumTestRequest::get(
        "/api/clients/alice/days?begin=2025-09-01&finish=2025-09-07&tz=Europe/London",
    )
    .as_client("alice")
    .send(app.router())
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert_eq!(days["timezone"], "Europe/London");
    let days = days["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["date"], "2025-09-01");
    assert_eq!(days[0]["completion_rate"], 1.0);
    assert_eq!(days[0]["tier"], "complete");
    assert_eq!(days[0]["starts_at"], "2025-09-01T00:00:00+01:00");
    assert_eq!(days[2]["required_count"], 1);
    assert_eq!(days[2]["completion_rate"], 0.0);
    assert_eq!(days[1]["required_count"], 0);

    let completions: Value =
        AxumTestRequest::get("/api/clients/alice/completions?begin=2025-09-01&finish=2025-09-30")
            .as_client("alice")
            .send(app.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
    assert_eq!(completions["completions"].as_array().unwrap().len(), 1);
    assert_eq!(completions["range"]["begin"], "2025-09-01");
    Ok(())
}

#[tokio::test]
async fn test_upsert_rejects_bad_input() -> Result<()> {
    let app = setup().await?;

    let negative: Value = AxumTestRequest::put("/api/clients/alice/completions")
        .as_client("alice")
        .json(&json!({
            "programme_habit_id": app.habit_id,
            "habit_date": "2025-09-01",
            "times_done": -2
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST)
        .json();
    assert_eq!(negative["error"]["code"], "VALUE_OUT_OF_RANGE");

    AxumTestRequest::put("/api/clients/alice/completions")
        .as_client("alice")
        .json(&json!({
            "programme_habit_id": app.habit_id,
            "habit_date": "01/09/2025",
            "times_done": 1
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    AxumTestRequest::put("/api/clients/bob/completions")
        .as_client("bob")
        .json(&json!({
            "programme_habit_id": app.habit_id,
            "habit_date": "2025-09-01",
            "times_done": 1
        }))
        .send(app.router())
        .await
        .assert_status(StatusCode::NOT_FOUND);

    AxumTestRequest::get("/api/clients/alice/days?begin=2025-09-07&finish=2025-09-01")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_instant_boundaries_normalize_in_timezone() -> Result<()> {
    let app = setup().await?;

    // 02:30 UTC on the 2nd is still the 1st in New York
    let body: Value = AxumTestRequest::get(
        "/api/clients/alice/days?begin=2025-09-02T02:30:00Z&finish=2025-09-02T02:30:00Z&tz=America/New_York",
    )
    .as_client("alice")
    .send(app.router())
    .await
    .assert_status(StatusCode::OK)
    .json();
    assert_eq!(body["days"][0]["date"], "2025-09-01");
    Ok(())
}

#[tokio::test]
async fn test_weeks_and_calendar_routes() -> Result<()> {
    let app = setup().await?;

    let weeks: Value =
        AxumTestRequest::get("/api/clients/alice/weeks?begin=2025-09-03&finish=2025-09-09")
            .as_client("alice")
            .send(app.router())
            .await
            .assert_status(StatusCode::OK)
            .json();
    let weeks = weeks["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 2);
    assert_eq!(weeks[0]["week_start"], "2025-09-01");
    assert!(weeks[0]["days"][0].is_null());
    assert_eq!(weeks[0]["days"][2]["date"], "2025-09-03");

    let calendar: Value = AxumTestRequest::get("/api/clients/alice/calendar/2025/9?tz=UTC")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(calendar["year"], 2025);
    assert_eq!(calendar["month"], 9);
    assert_eq!(calendar["weeks"].as_array().unwrap().len(), 5);
    assert_eq!(calendar["weeks"][0][0]["is_current_month"], true);
    assert_eq!(calendar["weeks"][4][6]["is_current_month"], false);

    AxumTestRequest::get("/api/clients/alice/calendar/2025/13")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_calendar_route_rejects_years_without_four_digits() -> Result<()> {
    let app = setup().await?;

    for uri in [
        "/api/clients/alice/calendar/-262143/1",
        "/api/clients/alice/calendar/0/12",
        "/api/clients/alice/calendar/10000/1",
    ] {
        let body: Value = AxumTestRequest::get(uri)
            .as_client("alice")
            .send(app.router())
            .await
            .assert_status(StatusCode::BAD_REQUEST)
            .json();
        assert_eq!(body["error"]["code"], "INVALID_INPUT", "{uri}");
    }

    let first: Value = AxumTestRequest::get("/api/clients/alice/calendar/1/1")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(first["weeks"][0][0]["date"], "0001-01-01");

    let last: Value = AxumTestRequest::get("/api/clients/alice/calendar/9999/12")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(last["weeks"].as_array().unwrap().len(), 5);
    assert_eq!(last["weeks"][0][0]["date"], "9999-11-29");

    AxumTestRequest::get("/api/clients/alice/days?begin=0000-12-30&finish=0001-01-02")
        .as_client("alice")
        .send(app.router())
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_step_route_enforces_edit_window() -> Result<()> {
    let db = create_test_database().await?;
    let client = seed_client(&db, "carol").await?;
    let today = today_in(Tz::UTC);
    let fixture = ProgrammeBuilder::new("PRG-STEP", today - TimeDelta::days(20), None)
        .habit("Daily", [1, 1, 1, 1, 1, 1, 1])
        .enrol(&client)
        .create(&db)
        .await?;
    let router = build_router(AppContext::new(tracking_service(&db)), Duration::from_secs(30));

    let toggled: Value = AxumTestRequest::post("/api/clients/carol/completions/step")
        .as_client("carol")
        .json(&json!({
            "programme_habit_id": fixture.habit_id(0),
            "habit_date": format_date(today),
            "step": "toggle",
            "tz": "UTC"
        }))
        .send(router.clone())
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(toggled["times_done"], 1);
    assert_eq!(toggled["done"], true);

    let locked: Value = AxumTestRequest::post("/api/clients/carol/completions/step")
        .as_client("carol")
        .json(&json!({
            "programme_habit_id": fixture.habit_id(0),
            "habit_date": format_date(today - TimeDelta::days(10)),
            "step": "increment"
        }))
        .send(router)
        .await
        .assert_status(StatusCode::CONFLICT)
        .json();
    assert_eq!(locked["error"]["code"], "RESOURCE_LOCKED");
    Ok(())
}
