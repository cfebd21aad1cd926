//! User service.
//!
//! Pure delegation to the repository: no validation, caching or mapping
//! happens here. The layer exists so the controller never depends on a
//! storage backend directly.

use std::sync::Arc;

use crate::db::repository::{RepositoryResult, UserRepository};
use crate::models::{User, UserId};

/// Service wrapping a shared [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Persist a new user and return it with its assigned id.
    pub async fn save_user(&self, user: &User) -> RepositoryResult<User> {
        self.repository.save(user).await
    }

    /// Look up a user by id.
    pub async fn get_user(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.repository.find_by_id(id).await
    }

    /// Check that the backing store is reachable.
    pub async fn health_check(&self) -> RepositoryResult<bool> {
        self.repository.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;

    #[tokio::test]
    async fn test_save_then_get_round_trips_through_repository() {
        let service = UserService::new(Arc::new(LocalRepository::new()));

        let saved = service.save_user(&User::new("Monika")).await.unwrap();
        let id = saved.id.unwrap();

        let found = service.get_user(id).await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn test_get_missing_user_is_none() {
        let service = UserService::new(Arc::new(LocalRepository::new()));
        assert!(service.get_user(UserId::new(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_repository_errors_propagate() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);
        let service = UserService::new(Arc::new(repo));

        assert!(service.save_user(&User::new("Monika")).await.is_err());
        assert!(!service.health_check().await.unwrap());
    }
}
