#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().expect("ENV_LOCK poisoned");
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

#[cfg(feature = "http-server")]
pub mod app {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request};
    use axum::Router;
    use user_api::db::LocalRepository;
    use user_api::http::{create_router, AppState};
    use user_api::security::{BasicCredentials, InMemoryCredentialStore};
    use user_api::services::UserService;

    pub const USERNAME: &str = "test-username";
    pub const PASSWORD: &str = "test-password";

    /// Lowest bcrypt cost, keeps hashing fast in tests.
    const TEST_COST: u32 = 4;

    /// Router over a fresh in-memory repository with one configured user.
    pub fn test_app() -> (Router, Arc<LocalRepository>) {
        let repository = Arc::new(LocalRepository::new());
        let credentials = InMemoryCredentialStore::new()
            .with_user(USERNAME, PASSWORD, vec!["USER".to_string()], TEST_COST)
            .expect("hash test password");
        let state = AppState::new(
            UserService::new(repository.clone()),
            Arc::new(credentials),
        );
        (create_router(state), repository)
    }

    pub fn basic_auth(username: &str, password: &str) -> String {
        BasicCredentials::new(username, password).to_header_value()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(USERNAME, PASSWORD))
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .expect("request")
    }

    pub fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, basic_auth(USERNAME, PASSWORD))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }
}
