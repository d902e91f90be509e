use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppJson, AppPath, AppQuery, AppState};
use crate::models::{CreateFollowUpInput, FollowUp, FollowUpFilter, FollowUpView, SnoozeInput};
use tally_core::CrmError;

pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<FollowUpFilter>,
) -> ApiResult<Json<Vec<FollowUpView>>> {
    Ok(Json(state.db.list_follow_ups(&filter, Utc::now())?))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateFollowUpInput>,
) -> ApiResult<(StatusCode, Json<FollowUp>)> {
    Ok((StatusCode::CREATED, Json(state.db.create_follow_up(input)?)))
}

pub async fn done(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<FollowUp>> {
    Ok(Json(state.db.complete_follow_up(id)?))
}

pub async fn snooze(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<SnoozeInput>,
) -> ApiResult<Json<FollowUp>> {
    let due_date = input
        .due_date
        .ok_or_else(|| ApiError::BadRequest("due_date is required".to_string()))?;
    Ok(Json(state.db.snooze_follow_up(id, due_date)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_follow_up(id)? {
        return Err(CrmError::not_found("follow-up").into());
    }
    Ok(Json(json!({ "success": true })))
}
