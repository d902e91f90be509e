use std::any::Any;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use tally_core::CrmError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Crm(#[from] CrmError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Crm(CrmError::Validation(_)) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Crm(CrmError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Crm(CrmError::Store(_)) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Response for a handler that panicked: a generic 500 in the usual
/// `{"error"}` shape. The panic message is logged, never returned.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = %detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal server error" })),
    )
        .into_response()
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Expired | AuthError::Invalid(_) => Self::Unauthorized(err.to_string()),
            AuthError::Signing(_) | AuthError::Hashing(_) => Self::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_kind() {
        let cases = [
            (ApiError::from(CrmError::validation("name is required")), 400),
            (ApiError::from(CrmError::not_found("deal")), 404),
            (ApiError::from(CrmError::Store("disk I/O error".into())), 500),
            (ApiError::Unauthorized("no".into()), 401),
            (ApiError::Forbidden("no".into()), 403),
        ];
        for (err, status) in cases {
            assert_eq!(err.status().as_u16(), status, "{}", err);
        }
    }

    #[test]
    fn message_is_the_error_text() {
        assert_eq!(
            ApiError::from(CrmError::not_found("deal")).to_string(),
            "deal not found"
        );
    }

    #[tokio::test]
    async fn panicking_handlers_become_internal_errors() {
        use axum::routing::get;
        use axum::Router;
        use axum_test::TestServer;
        use tower_http::catch_panic::CatchPanicLayer;

        async fn boom() -> &'static str {
            panic!("store exploded")
        }

        let app = Router::new()
            .route("/boom", get(boom))
            .layer(CatchPanicLayer::custom(panic_response));
        let server = TestServer::new(app).unwrap();

        let response = server.get("/boom").await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        response.assert_json(&json!({ "error": "internal server error" }));
    }
}
