//! HTTP request handlers.
//!
//! Handlers only extract request input; the controller does the rest.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{Method, Uri},
    response::Response,
    Json,
};

use super::dto::SaveUserBody;
use super::error::AppError;
use super::state::AppState;

/// GET /user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    state.users.get_user(id.parse::<i64>().ok()).await
}

/// GET /user/
pub async fn get_user_without_id(State(state): State<AppState>) -> Result<Response, AppError> {
    state.users.get_user(None).await
}

/// POST /user/
pub async fn save_user(
    State(state): State<AppState>,
    body: Result<Json<SaveUserBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = body.map_err(|rejection| match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            AppError::NotFound("POST /user without a JSON content type".to_string())
        }
        other => AppError::BadRequest(other.body_text()),
    })?;

    state.users.save_user(&body).await
}

/// Catch-all for unmatched paths and methods.
pub async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("{} {}", method, uri))
}
