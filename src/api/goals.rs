use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiResult, AppJson, AppPath, AppState};
use crate::models::{CreateGoalInput, GoalProgressInput, GoalView};
use tally_core::CrmError;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<GoalView>>> {
    let goals = state.db.list_goals()?;
    Ok(Json(goals.into_iter().map(GoalView::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateGoalInput>,
) -> ApiResult<(StatusCode, Json<GoalView>)> {
    let goal = state.db.create_goal(input)?;
    Ok((StatusCode::CREATED, Json(goal.into())))
}

pub async fn progress(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<GoalProgressInput>,
) -> ApiResult<Json<GoalView>> {
    let goal = state.db.set_goal_progress(id, input.current_value)?;
    Ok(Json(goal.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_goal(id)? {
        return Err(CrmError::not_found("goal").into());
    }
    Ok(Json(json!({ "success": true })))
}
