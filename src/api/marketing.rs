use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::{ApiResult, AppJson, AppPath, AppState};
use crate::models::{
    ChannelActivity, ChannelInput, ChannelSummary, CreateChannelActivityInput, MarketingChannel,
};

pub async fn list_channels(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<ChannelSummary>>> {
    Ok(Json(state.db.list_channels()?))
}

pub async fn create_channel(
    State(state): State<AppState>,
    AppJson(input): AppJson<ChannelInput>,
) -> ApiResult<(StatusCode, Json<MarketingChannel>)> {
    Ok((StatusCode::CREATED, Json(state.db.create_channel(input)?)))
}

pub async fn update_channel(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<ChannelInput>,
) -> ApiResult<Json<MarketingChannel>> {
    Ok(Json(state.db.update_channel(id, input)?))
}

pub async fn list_activities(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Vec<ChannelActivity>>> {
    Ok(Json(state.db.list_channel_activities(id)?))
}

pub async fn create_activity(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<CreateChannelActivityInput>,
) -> ApiResult<(StatusCode, Json<ChannelActivity>)> {
    Ok((
        StatusCode::CREATED,
        Json(state.db.create_channel_activity(id, input)?),
    ))
}
