use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use super::{ApiResult, AppJson, AppState};
use crate::models::{CreateProductInput, Product};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.db.list_products()?))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<CreateProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    Ok((StatusCode::CREATED, Json(state.db.create_product(input)?)))
}
