use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use shelf_http::AppError;

use crate::{AuthError, TokenService};

/// Authenticated caller, inserted by [`require_bearer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
}

/// Extract the token from `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Reject the request with 401 unless it carries a valid bearer token.
pub async fn require_bearer(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers()).ok_or_else(|| {
        tracing::warn!(path = %request.uri().path(), "missing bearer token");
        AuthError::MissingToken
    })?;

    let claims = tokens.verify(token).inspect_err(|e| {
        tracing::warn!(error = %e, "bearer token rejected");
    })?;

    request.extensions_mut().insert(AuthUser {
        id: claims.data.id,
        username: claims.data.username,
    });

    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<AuthUser>().cloned().ok_or_else(|| {
            tracing::error!("AuthUser requested on a route without require_bearer");
            AppError::unauthorized("authentication required")
        })
    }
}
