mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tally::models::{Activity, FollowUp, FollowUpStatus, FollowUpView, MarketingChannel};

use common::spawn_app;

#[tokio::test]
async fn follow_up_lifecycle() {
    let app = spawn_app();
    let yesterday = Utc::now() - Duration::days(1);

    let response = app
        .server
        .post("/api/follow-ups")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "due_date": yesterday, "notes": "call back" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let follow_up: FollowUp = response.json();

    let overdue: Vec<FollowUpView> = app
        .server
        .get("/api/follow-ups?overdue=true")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(overdue.len(), 1);
    assert!(overdue[0].overdue);

    let tomorrow = Utc::now() + Duration::days(1);
    let snoozed: FollowUp = app
        .server
        .patch(&format!("/api/follow-ups/{}/snooze", follow_up.id))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "due_date": tomorrow }))
        .await
        .json();
    assert_eq!(snoozed.status, FollowUpStatus::Snoozed);

    let done: FollowUp = app
        .server
        .patch(&format!("/api/follow-ups/{}/done", follow_up.id))
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(done.status, FollowUpStatus::Done);

    app.server
        .patch(&format!("/api/follow-ups/{}/snooze", follow_up.id))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "due_date": tomorrow }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    app.server
        .post("/api/follow-ups")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "notes": "no date" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_tasks_can_be_completed() {
    let app = spawn_app();

    let call: Activity = app
        .server
        .post("/api/activities")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "type": "call", "description": "intro call" }))
        .await
        .json();
    let task: Activity = app
        .server
        .post("/api/activities")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "type": "task", "description": "send deck" }))
        .await
        .json();

    app.server
        .patch(&format!("/api/activities/{}/complete", call.id))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "completed": true }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let completed: Activity = app
        .server
        .patch(&format!("/api/activities/{}/complete", task.id))
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "completed": true }))
        .await
        .json();
    assert!(completed.completed);

    app.server
        .post("/api/activities")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "type": "smoke-signal", "description": "?" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn marketing_channels_aggregate_activity() {
    let app = spawn_app();

    let channel: MarketingChannel = app
        .server
        .post("/api/marketing/channels")
        .authorization_bearer(&app.admin_token)
        .json(&json!({ "name": "Newsletter", "channel_type": "email" }))
        .await
        .json();

    for (leads, cost) in [(3, "10.50"), (2, "4.50")] {
        app.server
            .post(&format!("/api/marketing/channels/{}/activities", channel.id))
            .authorization_bearer(&app.admin_token)
            .json(&json!({ "description": "issue", "leads_generated": leads, "cost": cost }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let channels: Vec<Value> = app
        .server
        .get("/api/marketing/channels")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["total_leads"], 5);
    assert_eq!(channels[0]["total_cost"], "15.00");
}

#[tokio::test]
async fn daily_focus_is_one_row_per_day() {
    let app = spawn_app();

    for focus in ["ship proposal", "close Acme"] {
        app.server
            .put("/api/daily/focus")
            .authorization_bearer(&app.admin_token)
            .json(&json!({ "date": "2026-03-02", "focus": focus }))
            .await
            .assert_status_ok();
    }

    let focus: Value = app
        .server
        .get("/api/daily/focus?date=2026-03-02")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert_eq!(focus["focus"], "close Acme");

    let none: Value = app
        .server
        .get("/api/daily/focus?date=2026-03-03")
        .authorization_bearer(&app.admin_token)
        .await
        .json();
    assert!(none.is_null());
}

#[tokio::test]
async fn dashboard_reports_open_and_closed_deals() {
    let app = spawn_app();

    for (name, stage, value) in [("Open", "proposal", 400), ("Won", "active", 900), ("Old", "archive", 50)] {
        app.server
            .post("/api/deals")
            .authorization_bearer(&app.admin_token)
            .json(&json!({ "name": name, "stage_name": stage, "value": value }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let dashboard: Value = app
        .server
        .get("/api/dashboard")
        .authorization_bearer(&app.admin_token)
        .await
        .json();

    assert_eq!(dashboard["open_deals"], 1);
    assert_eq!(dashboard["open_pipeline_value"], "400");
    assert_eq!(dashboard["closed_this_month"]["count"], 2);
    assert_eq!(dashboard["tasks_today"], json!({ "done": 0, "total": 0 }));
}
