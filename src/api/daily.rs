use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiError, ApiResult, AppJson, AppPath, AppQuery, AppState};
use crate::models::{CreateDailyTaskInput, DailyFocus, DailyTask, SetDailyFocusInput};
use tally_core::CrmError;

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    pub date: Option<NaiveDate>,
}

impl DayQuery {
    fn day(&self) -> NaiveDate {
        self.date.unwrap_or_else(today)
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub async fn list_tasks(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DayQuery>,
) -> ApiResult<Json<Vec<DailyTask>>> {
    Ok(Json(state.db.list_daily_tasks(query.day())?))
}

pub async fn create_task(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateDailyTaskInput>,
) -> ApiResult<(StatusCode, Json<DailyTask>)> {
    let task = state.db.create_daily_task(input, today())?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn toggle_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<DailyTask>> {
    Ok(Json(state.db.toggle_daily_task(id)?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_daily_task(id)? {
        return Err(CrmError::not_found("task").into());
    }
    Ok(Json(json!({ "success": true })))
}

/// `null` when nothing has been set for the day.
pub async fn get_focus(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<DayQuery>,
) -> ApiResult<Json<Option<DailyFocus>>> {
    Ok(Json(state.db.get_daily_focus(query.day())?))
}

pub async fn set_focus(
    State(state): State<AppState>,
    AppJson(input): AppJson<SetDailyFocusInput>,
) -> ApiResult<Json<DailyFocus>> {
    let focus = input
        .focus
        .ok_or_else(|| ApiError::BadRequest("focus is required".to_string()))?;
    let day = input.date.unwrap_or_else(today);
    Ok(Json(state.db.set_daily_focus(day, &focus)?))
}
