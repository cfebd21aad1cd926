//! HTTP Basic authentication filter.
//!
//! Runs in front of every route, the not-found fallback included. On success
//! the [`AuthenticatedUser`](crate::security::AuthenticatedUser) is stored in
//! the request extensions.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::error::AppError;
use super::state::AppState;
use crate::security::{AuthError, BasicCredentials};

pub async fn require_basic_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingCredentials)?
        .to_str()
        .map_err(|_| AuthError::MalformedHeader("header is not visible ASCII".to_string()))?;

    let credentials = BasicCredentials::parse(value)?;
    let user = state.credentials.verify(&credentials).await?;
    debug!(username = %user.username, "authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
