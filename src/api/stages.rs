use axum::extract::State;
use axum::Json;

use super::{ApiResult, AppPath, AppState};
use crate::models::PipelineStage;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<PipelineStage>>> {
    Ok(Json(state.deals.list_stages()?))
}

pub async fn get(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> ApiResult<Json<PipelineStage>> {
    Ok(Json(state.deals.resolve_stage_by_name(&name)?))
}
