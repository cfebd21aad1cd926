//! Router configuration for the HTTP API.
//!
//! Sets up the `/user` routes and the middleware stack (authentication,
//! CORS, tracing).

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::{auth, handlers, negotiation};
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let users = Router::new()
        .route("/user/{id}", get(handlers::get_user))
        .route(
            "/user/",
            get(handlers::get_user_without_id).post(handlers::save_user),
        )
        .route("/user", post(handlers::save_user))
        .route_layer(middleware::from_fn(negotiation::require_json_accept));

    // Authentication wraps CORS so preflight requests are not exempt.
    Router::new()
        .merge(users)
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use crate::security::InMemoryCredentialStore;
    use crate::services::UserService;
    use std::sync::Arc;

    #[test]
    fn test_router_creation() {
        let service = UserService::new(Arc::new(LocalRepository::new()));
        let state = AppState::new(service, Arc::new(InMemoryCredentialStore::new()));
        let _router = create_router(state);
    }
}
