use axum::extract::State;
use axum::Json;

use super::{ApiResult, AppState};
use crate::pipeline::Pipeline;

pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Pipeline>> {
    Ok(Json(state.deals.get_pipeline()?))
}
