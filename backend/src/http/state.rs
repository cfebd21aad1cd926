//! Application state for the HTTP server.

use std::sync::Arc;

use super::controller::UserController;
use crate::security::CredentialVerifier;
use crate::services::UserService;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Controller for the `/user` resource
    pub users: UserController,
    /// Credential source used by the authentication filter
    pub credentials: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Create a new application state around the user service.
    pub fn new(service: UserService, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            users: UserController::new(service),
            credentials,
        }
    }
}
