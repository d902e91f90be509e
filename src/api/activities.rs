use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiResult, AppJson, AppPath, AppQuery, AppState};
use crate::models::{
    Activity, ActivityFilter, ActivityView, CompleteActivityInput, CreateActivityInput,
};
use tally_core::CrmError;

pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<ActivityFilter>,
) -> ApiResult<Json<Vec<ActivityView>>> {
    Ok(Json(state.db.list_activities(&filter)?))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateActivityInput>,
) -> ApiResult<(StatusCode, Json<Activity>)> {
    let activity = state.db.create_activity(input)?;
    tracing::debug!(id = %activity.id, kind = activity.activity_type.as_str(), "activity logged");
    Ok((StatusCode::CREATED, Json(activity)))
}

pub async fn complete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<CompleteActivityInput>,
) -> ApiResult<Json<Activity>> {
    Ok(Json(state.db.set_activity_completed(id, input.completed)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_activity(id)? {
        return Err(CrmError::not_found("activity").into());
    }
    Ok(Json(json!({ "success": true })))
}
