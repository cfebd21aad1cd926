//! In-memory local repository implementation.
//!
//! Suitable for unit testing and local development. Rows live in a `BTreeMap`
//! keyed by id and ids come from a sequence that starts at 1 and is never
//! reset, mirroring a Postgres identity column.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::db::repository::{RepositoryError, RepositoryResult, UserRepository};
use crate::models::{User, UserId};

/// In-memory local repository.
///
/// # Example
/// ```
/// use user_api::db::repositories::LocalRepository;
/// use user_api::db::repository::UserRepository;
/// use user_api::models::User;
///
/// # tokio_test_block_on(async {
/// let repo = LocalRepository::new();
/// let saved = repo.save(&User::new("Monika")).await.unwrap();
/// assert_eq!(saved.id.unwrap().value(), 1);
/// # });
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    users: BTreeMap<UserId, User>,
    next_user_id: i64,
    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            next_user_id: 1,
            is_healthy: true,
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Simulate the store becoming unreachable (or recovering).
    ///
    /// While unhealthy, every operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Number of stored users.
    pub fn len(&self) -> usize {
        self.data.read().users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_healthy(data: &LocalData, operation: &str) -> RepositoryResult<()> {
        if data.is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection("Local repository marked unhealthy")
                .with_operation(operation)
                .with_entity("user"))
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn save(&self, user: &User) -> RepositoryResult<User> {
        let mut data = self.data.write();
        Self::check_healthy(&data, "save")?;

        let id = UserId::new(data.next_user_id);
        data.next_user_id += 1;

        let stored = User::with_id(id, user.name.clone());
        data.users.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let data = self.data.read();
        Self::check_healthy(&data, "find_by_id")?;
        Ok(data.users.get(&id).cloned())
    }

    async fn delete_all(&self) -> RepositoryResult<()> {
        let mut data = self.data.write();
        Self::check_healthy(&data, "delete_all")?;
        data.users.clear();
        Ok(())
    }
}
