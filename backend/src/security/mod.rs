//! HTTP Basic authentication.
//!
//! - [`basic`]: parsing of the `Authorization: Basic ...` header
//! - [`credentials`]: the credential store and password verification
//!
//! The axum middleware that enforces authentication on every request lives in
//! `http::auth`.

pub mod basic;
pub mod credentials;

pub use basic::BasicCredentials;
pub use credentials::{
    encode_password, AuthenticatedUser, CredentialVerifier, InMemoryCredentialStore,
};

/// Realm advertised in `WWW-Authenticate` challenges.
pub const REALM: &str = "Realm";

/// Errors raised while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Malformed Authorization header: {0}")]
    MalformedHeader(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

impl AuthError {
    /// Whether the client can fix this by sending other credentials.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, AuthError::Hashing(_))
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(err: bcrypt::BcryptError) -> Self {
        AuthError::Hashing(err.to_string())
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
