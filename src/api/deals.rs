use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiResult, AppJson, AppPath, AppQuery, AppState, ListResponse};
use crate::models::{
    CreateDealInput, Deal, DealFilter, DealView, StageTransitionInput, UpdateDealInput,
};

pub async fn list(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<DealFilter>,
) -> ApiResult<Json<ListResponse<DealView>>> {
    let deals = state.deals.list_deals(&filter)?;
    Ok(Json(deals.into()))
}

pub async fn get(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<DealView>> {
    Ok(Json(state.deals.get_deal(id)?))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateDealInput>,
) -> ApiResult<(StatusCode, Json<Deal>)> {
    let deal = state.deals.create(input)?;
    Ok((StatusCode::CREATED, Json(deal)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<UpdateDealInput>,
) -> ApiResult<Json<Deal>> {
    Ok(Json(state.deals.update(id, input)?))
}

pub async fn transition(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<StageTransitionInput>,
) -> ApiResult<Json<Deal>> {
    Ok(Json(state.deals.transition_stage(id, input)?))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    state.deals.delete(id)?;
    Ok(Json(json!({ "success": true })))
}
