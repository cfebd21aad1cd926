//! Postgres repository implementation using Diesel.
//!
//! Statements are issued as raw SQL through `diesel::sql_query` and mapped to
//! [`User`] via [`models::UserRow`]. Every call hops onto the blocking pool
//! through [`run_blocking`], so the async workers never wait on the socket.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Pool statistics for monitoring
//! - Automatic migration execution
//!
//! ## Configuration
//!
//! [`PostgresConfig`] is normally produced by
//! [`RepositoryConfig::to_postgres_config`](crate::db::RepositoryConfig::to_postgres_config),
//! which applies the `DATABASE_URL`, `POSTGRES_*` and `PG_*` environment
//! overrides.

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::sql_query;
use diesel::sql_types::{BigInt, Text};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::db::blocking::{ensure_blocking_allowed, run_blocking};
use crate::db::repo_config::check_pool_bounds;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult, UserRepository};
use crate::models::{User, UserId};

mod models;
mod schema;

use models::UserRow;

type PgPool = Pool<ConnectionManager<PgConnection>>;
type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

const INSERT_USER: &str = "INSERT INTO users (name) VALUES ($1) RETURNING *";
const SELECT_USER_BY_ID: &str = "SELECT * FROM users WHERE id = $1";
const DELETE_ALL_USERS: &str = "DELETE FROM users";

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total statements executed
    pub total_queries: u64,
    /// Total failed statements
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

#[derive(Debug, Default)]
struct QueryCounters {
    total: AtomicU64,
    failed: AtomicU64,
    retried: AtomicU64,
}

/// Diesel-backed user repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    counters: Arc<QueryCounters>,
}

impl PostgresRepository {
    /// Build the pool and run pending migrations.
    ///
    /// This blocks the calling thread while connecting. From async code use
    /// [`PostgresRepository::connect`] instead.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        // r2d2's builder panics on these instead of returning an error
        check_pool_bounds(config.max_pool_size, config.min_pool_size)
            .map_err(RepositoryError::configuration)?;

        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool
                .get()
                .map_err(|e| RepositoryError::from(e).with_operation("get_connection_for_migrations"))?;
            Self::run_migrations(&mut conn)?;
        }
        info!(
            "Postgres repository ready (pool max={}, min={})",
            config.max_pool_size, config.min_pool_size
        );

        Ok(Self {
            pool,
            config,
            counters: Arc::new(QueryCounters::default()),
        })
    }

    /// Build the repository on the blocking pool.
    pub async fn connect(config: PostgresConfig) -> RepositoryResult<Self> {
        run_blocking("connect", move || Self::new(config)).await
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;
        Ok(())
    }

    fn checkout(pool: &PgPool) -> RepositoryResult<PgPooledConnection> {
        ensure_blocking_allowed("get_connection")?;
        pool.get()
            .map_err(|e| RepositoryError::from(e).with_operation("get_connection"))
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// The operation is retried up to `max_retries` times with exponential
    /// backoff when the error is retryable (pool checkout failures, timeouts,
    /// serialization failures).
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let counters = self.counters.clone();

        run_blocking(operation, move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    counters.retried.fetch_add(1, Ordering::Relaxed);
                    // Already on the blocking pool
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2;
                }

                let mut conn = match Self::checkout(&pool) {
                    Ok(c) => c,
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        warn!("{}: connection checkout failed, retrying: {}", operation, e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                };

                counters.total.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        warn!("{}: transient failure, retrying: {}", operation, e);
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        counters.failed.fetch_add(1, Ordering::Relaxed);
                        return Err(e.with_operation(operation));
                    }
                }
            }

            counters.failed.fetch_add(1, Ordering::Relaxed);
            Err(last_error
                .unwrap_or_else(|| RepositoryError::internal("Max retries exceeded with no error captured"))
                .with_operation(operation))
        })
        .await
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.counters.total.load(Ordering::Relaxed),
            failed_queries: self.counters.failed.load(Ordering::Relaxed),
            retried_operations: self.counters.retried.load(Ordering::Relaxed),
        }
    }
}

fn map_diesel_error(err: diesel::result::Error) -> RepositoryError {
    RepositoryError::from(err).with_entity("user")
}

/// Collapse a `RETURNING` result set that must hold exactly one row.
fn exactly_one(rows: Vec<UserRow>) -> RepositoryResult<User> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row.into()),
        _ => Err(RepositoryError::row_count(
            1,
            count,
            ErrorContext::new("save").with_entity("user"),
        )),
    }
}

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map(|_| true)
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn save(&self, user: &User) -> RepositoryResult<User> {
        let name = user.name.clone();
        let saved = self
            .with_conn("save", move |conn| {
                let rows = sql_query(INSERT_USER)
                    .bind::<Text, _>(name)
                    .load::<UserRow>(conn)
                    .map_err(map_diesel_error)?;
                exactly_one(rows)
            })
            .await?;
        debug!("Inserted user id={:?}", saved.id);
        Ok(saved)
    }

    async fn find_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        self.with_conn("find_by_id", move |conn| {
            sql_query(SELECT_USER_BY_ID)
                .bind::<BigInt, _>(id.value())
                .get_result::<UserRow>(conn)
                .optional()
                .map(|row| row.map(User::from))
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete_all(&self) -> RepositoryResult<()> {
        let deleted = self
            .with_conn("delete_all", |conn| {
                sql_query(DELETE_ALL_USERS)
                    .execute(conn)
                    .map_err(map_diesel_error)
            })
            .await?;
        debug!("Deleted {} users", deleted);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_accepts_single_row() {
        let user = exactly_one(vec![UserRow {
            id: 7,
            name: "Monika".to_string(),
        }])
        .unwrap();
        assert_eq!(user, User::with_id(UserId::new(7), "Monika"));
    }

    #[test]
    fn test_exactly_one_rejects_empty_and_multiple() {
        assert!(matches!(
            exactly_one(vec![]),
            Err(RepositoryError::RowCountMismatch { actual: 0, .. })
        ));

        let rows = vec![
            UserRow {
                id: 1,
                name: "a".to_string(),
            },
            UserRow {
                id: 2,
                name: "b".to_string(),
            },
        ];
        assert!(matches!(
            exactly_one(rows),
            Err(RepositoryError::RowCountMismatch { actual: 2, .. })
        ));
    }

    #[test]
    fn test_with_url_keeps_pool_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/users");
        assert_eq!(config.database_url, "postgres://localhost/users");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_new_rejects_inverted_pool_bounds_before_connecting() {
        let mut config = PostgresConfig::with_url("postgres://unused@127.0.0.1:1/none");
        config.max_pool_size = 2;
        config.min_pool_size = 5;

        let err = PostgresRepository::new(config).unwrap_err();
        assert!(matches!(err, RepositoryError::ConfigurationError { .. }));

        let mut config = PostgresConfig::with_url("postgres://unused@127.0.0.1:1/none");
        config.max_pool_size = 0;
        config.min_pool_size = 0;
        assert!(matches!(
            PostgresRepository::new(config),
            Err(RepositoryError::ConfigurationError { .. })
        ));
    }
}
