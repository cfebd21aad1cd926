//! Repository trait definitions for database operations.
//!
//! - [`error`]: Error types for repository operations
//! - [`UserRepository`]: persistence of the `User` entity
//!
//! Implementations live in [`crate::db::repositories`].

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use async_trait::async_trait;

use crate::models::{User, UserId};

/// Persistence operations for users.
///
/// Every method is a single awaited call; implementations must not block the
/// calling async worker while the round trip is in flight.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// Insert `user` and return the stored row with its assigned id.
    ///
    /// Any id already present on `user` is ignored.
    async fn save(&self, user: &User) -> RepositoryResult<User>;

    /// Fetch a single user by id, `None` if no row matches.
    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;

    /// Remove every user. Used to reset state between tests.
    async fn delete_all(&self) -> RepositoryResult<()>;
}
