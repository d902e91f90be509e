use axum::extract::State;
use axum::Json;
use chrono::Utc;

use super::{ApiResult, AppState};
use crate::models::Dashboard;

pub async fn get(State(state): State<AppState>) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.db.dashboard(state.deals.policy(), Utc::now())?))
}
