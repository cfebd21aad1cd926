//! Credential store and password verification.
//!
//! Passwords are stored as bcrypt hashes. Hashing and verification are CPU
//! bound, so both run on tokio's blocking pool when called from async code.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::{AuthError, AuthResult, BasicCredentials};
use crate::config::SecuritySettings;

const BCRYPT_PREFIX: &str = "{bcrypt}";
const NOOP_PREFIX: &str = "{noop}";

/// The principal attached to an authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub username: String,
    pub roles: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Verifies Basic credentials against some credential source.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Resolve `credentials` to a principal.
    ///
    /// Unknown users and wrong passwords both yield
    /// [`AuthError::InvalidCredentials`].
    async fn verify(&self, credentials: &BasicCredentials) -> AuthResult<AuthenticatedUser>;
}

/// Hash a configured password for storage.
///
/// Accepts a bare password, `{noop}<plain>` (hashed like a bare value) or an
/// already hashed `{bcrypt}<hash>` which is stored as-is.
pub fn encode_password(raw: &str, cost: u32) -> AuthResult<String> {
    if let Some(hash) = raw.strip_prefix(BCRYPT_PREFIX) {
        if !hash.starts_with("$2") {
            return Err(AuthError::Hashing(
                "{bcrypt} value is not a bcrypt hash".to_string(),
            ));
        }
        return Ok(hash.to_string());
    }
    let plain = raw.strip_prefix(NOOP_PREFIX).unwrap_or(raw);
    Ok(bcrypt::hash(plain, cost)?)
}

#[derive(Debug, Clone)]
struct StoredCredential {
    password_hash: String,
    roles: Vec<String>,
}

/// Credential store held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: Arc<HashMap<String, StoredCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user, hashing `password` with [`encode_password`].
    ///
    /// Blocking: call during startup or from a blocking context.
    pub fn with_user(
        mut self,
        username: impl Into<String>,
        password: &str,
        roles: Vec<String>,
        cost: u32,
    ) -> AuthResult<Self> {
        let password_hash = encode_password(password, cost)?;
        Arc::make_mut(&mut self.users).insert(
            username.into(),
            StoredCredential {
                password_hash,
                roles,
            },
        );
        Ok(self)
    }

    /// Build the single-user store described by the security settings.
    pub fn from_settings(settings: &SecuritySettings) -> AuthResult<Self> {
        let password = settings
            .password
            .as_deref()
            .ok_or_else(|| AuthError::Hashing("no password configured".to_string()))?;
        Self::new().with_user(
            settings.username.clone(),
            password,
            settings.roles.clone(),
            settings.bcrypt_cost,
        )
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for InMemoryCredentialStore {
    async fn verify(&self, credentials: &BasicCredentials) -> AuthResult<AuthenticatedUser> {
        let stored = self.users.get(&credentials.username).cloned();

        // Unknown users still pay for one verify so timing does not leak names
        let Some(hash) = stored
            .as_ref()
            .or_else(|| self.users.values().next())
            .map(|c| c.password_hash.clone())
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let password = credentials.password.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Hashing(format!("Task join error: {}", e)))??;

        let stored = match stored {
            Some(stored) if matches => stored,
            _ => return Err(AuthError::InvalidCredentials),
        };

        Ok(AuthenticatedUser {
            username: credentials.username.clone(),
            roles: stored.roles,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn store() -> InMemoryCredentialStore {
        InMemoryCredentialStore::new()
            .with_user(
                "test-username",
                "test-password",
                vec!["USER".to_string()],
                TEST_COST,
            )
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_credentials_resolve_principal() {
        let user = store()
            .verify(&BasicCredentials::new("test-username", "test-password"))
            .await
            .unwrap();
        assert_eq!(user.username, "test-username");
        assert!(user.has_role("USER"));
        assert!(!user.has_role("ADMIN"));
    }

    #[tokio::test]
    async fn test_wrong_password_is_rejected() {
        let err = store()
            .verify(&BasicCredentials::new("test-username", "wrong-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_user_is_rejected() {
        let err = store()
            .verify(&BasicCredentials::new("username", "test-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_user_with_another_users_password_is_rejected() {
        let store = store()
            .with_user("other", "other-password", vec![], TEST_COST)
            .unwrap();
        for password in ["test-password", "other-password"] {
            let err = store
                .verify(&BasicCredentials::new("nobody", password))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::InvalidCredentials));
        }
    }

    #[tokio::test]
    async fn test_unknown_user_still_runs_bcrypt() {
        // A malformed stored hash makes bcrypt fail, which shows it ran
        let store = InMemoryCredentialStore::new()
            .with_user("broken", "{bcrypt}$2invalid", vec![], TEST_COST)
            .unwrap();
        let err = store
            .verify(&BasicCredentials::new("nobody", "whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Hashing(_)));
    }

    #[tokio::test]
    async fn test_empty_store_rejects_everyone() {
        let err = InMemoryCredentialStore::new()
            .verify(&BasicCredentials::new("test-username", "test-password"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[test]
    fn test_password_is_never_stored_in_plain() {
        let hash = encode_password("secret", TEST_COST).unwrap();
        assert_ne!(hash, "secret");
        assert!(bcrypt::verify("secret", &hash).unwrap());
    }

    #[test]
    fn test_noop_prefix_is_stripped_before_hashing() {
        let hash = encode_password("{noop}secret", TEST_COST).unwrap();
        assert!(bcrypt::verify("secret", &hash).unwrap());
    }

    #[test]
    fn test_prehashed_password_is_kept() {
        let hash = bcrypt::hash("secret", TEST_COST).unwrap();
        let stored = encode_password(&format!("{{bcrypt}}{}", hash), TEST_COST).unwrap();
        assert_eq!(stored, hash);
        assert!(encode_password("{bcrypt}not-a-hash", TEST_COST).is_err());
    }

    #[test]
    fn test_from_settings_requires_password() {
        let settings = SecuritySettings::default();
        assert!(InMemoryCredentialStore::from_settings(&settings).is_err());

        let settings = SecuritySettings {
            password: Some("pw".to_string()),
            bcrypt_cost: TEST_COST,
            ..Default::default()
        };
        let store = InMemoryCredentialStore::from_settings(&settings).unwrap();
        assert_eq!(store.len(), 1);
    }
}
