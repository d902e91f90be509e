use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ApiResult, AppJson, AppPath, AppQuery, AppState, ListResponse};
use crate::models::{Contact, ContactInput, ContactWithDeals, DealFilter};
use tally_core::CrmError;

#[derive(Debug, Default, Deserialize)]
pub struct ContactQuery {
    pub search: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ContactQuery>,
) -> ApiResult<Json<ListResponse<Contact>>> {
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    Ok(Json(state.db.list_contacts(search)?.into()))
}

pub async fn get(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<ContactWithDeals>> {
    let contact = state
        .db
        .get_contact(id)?
        .ok_or_else(|| CrmError::not_found("contact"))?;
    let deals = state.deals.list_deals(&DealFilter {
        contact_id: Some(id),
        ..Default::default()
    })?;
    Ok(Json(ContactWithDeals { contact, deals }))
}

pub async fn create(
    State(state): State<AppState>,
    AppJson(input): AppJson<ContactInput>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let contact = state.db.create_contact(input)?;
    Ok((StatusCode::CREATED, Json(contact)))
}

pub async fn update(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(input): AppJson<ContactInput>,
) -> ApiResult<Json<Contact>> {
    let contact = state
        .db
        .update_contact(id, input)?
        .ok_or_else(|| CrmError::not_found("contact"))?;
    Ok(Json(contact))
}

pub async fn delete(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_contact(id)? {
        return Err(CrmError::not_found("contact").into());
    }
    Ok(Json(json!({ "success": true })))
}
