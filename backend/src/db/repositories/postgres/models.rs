use diesel::prelude::*;

use super::schema::users;
use crate::models::{User, UserId};

/// Row shape returned by `RETURNING *` and `SELECT *` on `users`.
#[derive(Debug, Clone, QueryableByName)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i64,
    pub name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::with_id(UserId::new(row.id), row.name)
    }
}
