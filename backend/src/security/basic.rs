//! `Authorization: Basic` header parsing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::{AuthError, AuthResult};

/// A username/password pair decoded from a Basic header.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Decode the value of an `Authorization` header.
    ///
    /// The scheme name is case-insensitive. The decoded payload is split at
    /// the first `:`, so passwords may themselves contain colons.
    pub fn parse(header_value: &str) -> AuthResult<Self> {
        let (scheme, payload) = header_value
            .trim()
            .split_once(' ')
            .ok_or_else(|| AuthError::MalformedHeader("missing scheme".to_string()))?;

        if !scheme.eq_ignore_ascii_case("basic") {
            return Err(AuthError::MalformedHeader(format!(
                "unsupported scheme '{}'",
                scheme
            )));
        }

        let decoded = STANDARD
            .decode(payload.trim())
            .map_err(|e| AuthError::MalformedHeader(format!("invalid base64: {}", e)))?;
        let decoded = String::from_utf8(decoded)
            .map_err(|_| AuthError::MalformedHeader("credentials are not UTF-8".to_string()))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| AuthError::MalformedHeader("missing ':' separator".to_string()))?;

        Ok(Self::new(username, password))
    }

    /// Render as an `Authorization` header value.
    pub fn to_header_value(&self) -> String {
        let raw = format!("{}:{}", self.username, self.password);
        format!("Basic {}", STANDARD.encode(raw))
    }
}
