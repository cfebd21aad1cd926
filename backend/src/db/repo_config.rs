//! Repository configuration file support.
//!
//! The `[repository]` and `[postgres]` tables of the service configuration
//! file. Environment variables override file values through
//! [`RepositoryConfig::apply_env_overrides`].

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::config::DbConfig;
use super::factory::RepositoryType;
use super::repository::RepositoryError;
use crate::db::PostgresConfig;

/// Repository configuration from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub postgres: PostgresSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repo_type")]
    pub repo_type: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repo_type(),
        }
    }
}

/// Postgres connection settings.
///
/// Either `database_url` or the `host`/`database`/`username`/`password`
/// group must be provided; the URL wins when both are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresSettings {
    #[serde(default)]
    pub database_url: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            host: None,
            port: default_port(),
            database: None,
            username: None,
            password: None,
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout: default_connect_timeout(),
            idle_timeout: default_idle_timeout(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

fn default_repo_type() -> String {
    "local".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

/// Check pool bounds r2d2 can build a pool from.
///
/// `max` must be at least 1 and `min` must not exceed it.
pub fn check_pool_bounds(max: u32, min: u32) -> Result<(), String> {
    if max == 0 {
        return Err("postgres.max_connections must be at least 1".to_string());
    }
    if min > max {
        return Err(format!(
            "postgres.min_connections ({}) must not exceed postgres.max_connections ({})",
            min, max
        ));
    }
    Ok(())
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = std::env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

fn env_override_opt(key: &str, target: &mut Option<String>) {
    if let Ok(value) = std::env::var(key) {
        *target = Some(value);
    }
}

impl PostgresSettings {
    /// Resolve the connection URL from the explicit URL or the component fields.
    pub fn resolved_database_url(&self) -> Option<String> {
        if !self.database_url.is_empty() {
            return Some(self.database_url.clone());
        }

        let components = DbConfig {
            host: self.host.clone()?,
            port: self.port,
            database: self.database.clone()?,
            username: self.username.clone()?,
            password: self.password.clone().unwrap_or_default(),
        };
        Some(components.database_url())
    }

    pub fn check_pool_bounds(&self) -> Result<(), String> {
        check_pool_bounds(self.max_connections, self.min_connections)
    }
}

impl RepositoryConfig {
    /// Override file values with environment variables.
    ///
    /// `REPOSITORY_TYPE` selects the backend. When it is unset and a
    /// `DATABASE_URL`/`PG_DATABASE_URL` is present, Postgres is selected.
    pub fn apply_env_overrides(&mut self) {
        let url = std::env::var("DATABASE_URL").or_else(|_| std::env::var("PG_DATABASE_URL"));
        if let Ok(url) = url {
            self.postgres.database_url = url;
            self.repository.repo_type = "postgres".to_string();
        }
        if let Ok(repo_type) = std::env::var("REPOSITORY_TYPE") {
            self.repository.repo_type = repo_type;
        }

        let pg = &mut self.postgres;
        env_override_opt("POSTGRES_HOST", &mut pg.host);
        env_override("POSTGRES_PORT", &mut pg.port);
        env_override_opt("POSTGRES_DATABASE", &mut pg.database);
        env_override_opt("POSTGRES_USERNAME", &mut pg.username);
        env_override_opt("POSTGRES_PASSWORD", &mut pg.password);
        env_override("PG_POOL_MAX", &mut pg.max_connections);
        env_override("PG_POOL_MIN", &mut pg.min_connections);
        env_override("PG_CONN_TIMEOUT_SEC", &mut pg.connect_timeout);
        env_override("PG_IDLE_TIMEOUT_SEC", &mut pg.idle_timeout);
        env_override("PG_MAX_RETRIES", &mut pg.max_retries);
        env_override("PG_RETRY_DELAY_MS", &mut pg.retry_delay_ms);
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }

    /// Convert to PostgresConfig if this is a Postgres configuration.
    #[cfg(feature = "postgres-repo")]
    pub fn to_postgres_config(&self) -> Result<Option<PostgresConfig>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type != RepositoryType::Postgres {
            return Ok(None);
        }

        self.postgres
            .check_pool_bounds()
            .map_err(RepositoryError::configuration)?;

        let database_url = self.postgres.resolved_database_url().ok_or_else(|| {
            RepositoryError::configuration(
                "Postgres repository requires 'postgres.database_url' or host/database/username",
            )
        })?;

        Ok(Some(PostgresConfig {
            database_url,
            max_pool_size: self.postgres.max_connections,
            min_pool_size: self.postgres.min_connections,
            connection_timeout_sec: self.postgres.connect_timeout,
            idle_timeout_sec: self.postgres.idle_timeout,
            max_retries: self.postgres.max_retries,
            retry_delay_ms: self.postgres.retry_delay_ms,
        }))
    }

    /// Convert to PostgresConfig when the feature is disabled.
    #[cfg(not(feature = "postgres-repo"))]
    pub fn to_postgres_config(&self) -> Result<Option<PostgresConfig>, RepositoryError> {
        let repo_type = self.repository_type().map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })?;

        if repo_type == RepositoryType::Postgres {
            return Err(RepositoryError::configuration(
                "Postgres repository feature not enabled",
            ));
        }

        Ok(None)
    }
}
