use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;

use super::{has_capability, AuthError, Capability, Identity};
use crate::api::{ApiError, AppState};

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies the bearer token and attaches the caller's [`Identity`].
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;

    let identity = state.tokens.verify(token).map_err(|e| match e {
        AuthError::Expired => ApiError::Unauthorized("token expired".to_string()),
        other => {
            tracing::debug!(error = %other, "rejected bearer token");
            ApiError::Unauthorized("invalid token".to_string())
        }
    })?;

    req.extensions_mut().insert(identity);
    Ok(next.run(req).await)
}

/// Role gate for business routes. Runs after [`require_auth`].
pub async fn require_crm_access(req: Request, next: Next) -> Result<Response, ApiError> {
    let Some(identity) = req.extensions().get::<Identity>() else {
        return Err(ApiError::Unauthorized("missing bearer token".to_string()));
    };
    if !has_capability(identity, Capability::UseCrm) {
        tracing::info!(user = %identity.email, "denied crm access");
        return Err(ApiError::Forbidden("insufficient permissions".to_string()));
    }
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_tokens() {
        assert_eq!(bearer_token(&headers("Bearer abc.def")), Some("abc.def"));
        assert_eq!(bearer_token(&headers("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers("Basic abc")), None);
        assert_eq!(bearer_token(&headers("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
