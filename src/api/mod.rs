//! JSON REST API.
//!
//! Everything lives under `/api`. `/api/health` and `/api/auth/login` are
//! open; `/api/auth/me` needs a valid token; every other route also needs the
//! `UseCrm` capability.

mod activities;
mod auth;
mod contacts;
mod daily;
mod dashboard;
mod deals;
mod error;
mod extract;
mod follow_ups;
mod goals;
mod health;
mod marketing;
mod pipeline;
mod products;
mod stages;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post, put};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{require_auth, require_crm_access, TokenKeys};
use crate::db::Database;
use crate::deals::DealService;
use crate::policy::ClosedStagePolicy;

pub use error::{panic_response, ApiError, ApiResult};
pub use extract::{AppJson, AppPath, AppQuery};

/// Shared, cheaply cloneable request state. Holds no mutable data of its
/// own; every request reads through to the store.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub deals: DealService,
    pub tokens: TokenKeys,
}

impl AppState {
    pub fn new(db: Database, policy: Arc<ClosedStagePolicy>, tokens: TokenKeys) -> Self {
        Self {
            deals: DealService::new(db.clone(), policy),
            db,
            tokens,
        }
    }
}

/// Envelope for list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub total: usize,
}

impl<T> From<Vec<T>> for ListResponse<T> {
    fn from(data: Vec<T>) -> Self {
        Self {
            total: data.len(),
            data,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let business = Router::new()
        .route("/deals", get(deals::list).post(deals::create))
        .route(
            "/deals/{id}",
            get(deals::get).put(deals::update).delete(deals::delete),
        )
        .route("/deals/{id}/stage", patch(deals::transition))
        .route("/pipeline", get(pipeline::get))
        .route("/stages", get(stages::list))
        .route("/stages/{name}", get(stages::get))
        .route("/contacts", get(contacts::list).post(contacts::create))
        .route(
            "/contacts/{id}",
            get(contacts::get)
                .put(contacts::update)
                .delete(contacts::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route("/activities", get(activities::list).post(activities::create))
        .route("/activities/{id}", axum::routing::delete(activities::delete))
        .route("/activities/{id}/complete", patch(activities::complete))
        .route("/follow-ups", get(follow_ups::list).post(follow_ups::create))
        .route("/follow-ups/{id}", axum::routing::delete(follow_ups::delete))
        .route("/follow-ups/{id}/done", patch(follow_ups::done))
        .route("/follow-ups/{id}/snooze", patch(follow_ups::snooze))
        .route(
            "/marketing/channels",
            get(marketing::list_channels).post(marketing::create_channel),
        )
        .route("/marketing/channels/{id}", put(marketing::update_channel))
        .route(
            "/marketing/channels/{id}/activities",
            get(marketing::list_activities).post(marketing::create_activity),
        )
        .route("/goals", get(goals::list).post(goals::create))
        .route("/goals/{id}", axum::routing::delete(goals::delete))
        .route("/goals/{id}/progress", patch(goals::progress))
        .route("/daily/tasks", get(daily::list_tasks).post(daily::create_task))
        .route("/daily/tasks/{id}", axum::routing::delete(daily::delete_task))
        .route("/daily/tasks/{id}/toggle", patch(daily::toggle_task))
        .route("/daily/focus", get(daily::get_focus).put(daily::set_focus))
        .route("/dashboard", get(dashboard::get))
        .route_layer(from_fn(require_crm_access))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let session = Router::new()
        .route("/auth/me", get(auth::me))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let api = Router::new()
        .route("/health", get(health::health))
        .route("/auth/login", post(auth::login))
        .merge(session)
        .merge(business);

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(CatchPanicLayer::custom(panic_response)),
        )
        .with_state(state)
}
