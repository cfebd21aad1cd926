//! Service configuration.
//!
//! Settings come from a TOML file and are then overridden by environment
//! variables. A minimal file looks like:
//!
//! ```toml
//! [server]
//! port = 8080
//!
//! [repository]
//! type = "postgres"
//!
//! [postgres]
//! host = "localhost"
//! database = "postgres"
//! username = "postgres"
//! password = "postgres"
//!
//! [security]
//! username = "test-username"
//! password = "test-password"
//! roles = ["USER"]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::db::{RepositoryConfig, RepositoryType};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "USER_API_CONFIG";

// Range accepted by bcrypt
const MIN_BCRYPT_COST: u32 = 4;
const MAX_BCRYPT_COST: u32 = 31;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    #[serde(flatten)]
    pub storage: RepositoryConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// The single user allowed through Basic authentication.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecuritySettings {
    #[serde(default = "default_username")]
    pub username: String,
    /// Plain password, `{noop}<plain>`, or a pre-hashed `{bcrypt}<hash>`.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            username: default_username(),
            password: None,
            roles: default_roles(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

// Keeps the password out of logs.
impl std::fmt::Debug for SecuritySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecuritySettings")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("roles", &self.roles)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_username() -> String {
    "user".to_string()
}

fn default_roles() -> Vec<String> {
    vec!["USER".to_string()]
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn env_override<T: FromStr>(key: &str, target: &mut T) {
    if let Some(value) = std::env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}

impl AppConfig {
    /// Load configuration.
    ///
    /// Resolution order for the file: `path`, then `USER_API_CONFIG`, then
    /// `user-api.toml` in the standard locations. With no file at all the
    /// defaults are used. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));

        let mut config = match explicit.or_else(Self::find_default_file) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a TOML configuration file without applying overrides.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn find_default_file() -> Option<PathBuf> {
        [
            "user-api.toml",
            "backend/user-api.toml",
            "../user-api.toml",
        ]
        .into_iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    }

    /// Override file values with environment variables.
    pub fn apply_env_overrides(&mut self) {
        env_override("HOST", &mut self.server.host);
        env_override("PORT", &mut self.server.port);

        env_override("SECURITY_USERNAME", &mut self.security.username);
        if let Ok(password) = std::env::var("SECURITY_PASSWORD") {
            self.security.password = Some(password);
        }
        if let Ok(roles) = std::env::var("SECURITY_ROLES") {
            self.security.roles = roles
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(str::to_string)
                .collect();
        }
        env_override("BCRYPT_COST", &mut self.security.bcrypt_cost);

        self.storage.apply_env_overrides();
    }

    /// Check the settings the server cannot start without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.username.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "security.username must not be empty".to_string(),
            ));
        }
        if self.security.password.as_deref().map_or(true, str::is_empty) {
            return Err(ConfigError::Invalid(
                "security.password must be set (or SECURITY_PASSWORD)".to_string(),
            ));
        }
        if !(MIN_BCRYPT_COST..=MAX_BCRYPT_COST).contains(&self.security.bcrypt_cost) {
            return Err(ConfigError::Invalid(format!(
                "security.bcrypt_cost must be between {} and {}",
                MIN_BCRYPT_COST, MAX_BCRYPT_COST
            )));
        }
        let repo_type = self
            .storage
            .repository_type()
            .map_err(ConfigError::Invalid)?;
        if repo_type == RepositoryType::Postgres {
            self.storage
                .postgres
                .check_pool_bounds()
                .map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// Socket address string for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
