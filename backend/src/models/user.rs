//! The `User` entity.

use serde::{Deserialize, Serialize};

crate::define_id_type!(i64, UserId);

/// A user record.
///
/// `id` is `None` until the repository persists the record and the database
/// assigns one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Option<UserId>,
    pub name: String,
}

impl User {
    /// Create an unsaved user.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }

    /// Create a user that already carries a database id.
    pub fn with_id(id: UserId, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}
