//! Controller for the `/user` resource.
//!
//! Translates parsed request input into service calls and shapes the
//! responses. Persistence errors are not handled here; they propagate as
//! [`AppError::Repository`].

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::dto::SaveUserBody;
use super::error::AppError;
use crate::models::{User, UserId};
use crate::services::UserService;

#[derive(Clone)]
pub struct UserController {
    service: UserService,
}

impl UserController {
    pub fn new(service: UserService) -> Self {
        Self { service }
    }

    /// Look up a user by id.
    ///
    /// A missing id and an unknown id both answer 400.
    pub async fn get_user(&self, id: Option<i64>) -> Result<Response, AppError> {
        let Some(id) = id else {
            return Err(AppError::BadRequest("missing or non-numeric user id".to_string()));
        };

        match self.service.get_user(UserId::new(id)).await? {
            Some(user) => Ok((StatusCode::OK, Json(user)).into_response()),
            None => Err(AppError::BadRequest(format!("user {} not found", id))),
        }
    }

    /// Persist a new user named by `body["name"]`.
    ///
    /// Answers 201 with the new id in `Location` and no body.
    pub async fn save_user(&self, body: &SaveUserBody) -> Result<Response, AppError> {
        let name = body
            .get("name")
            .ok_or_else(|| AppError::BadRequest("field 'name' is required".to_string()))?;

        let saved = self.service.save_user(&User::new(name.clone())).await?;
        let id = saved
            .id
            .ok_or_else(|| AppError::Internal("repository returned a user without id".to_string()))?;

        Ok((StatusCode::CREATED, [(header::LOCATION, id.to_string())]).into_response())
    }
}
