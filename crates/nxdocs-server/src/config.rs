//! Server configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The storage backend is chosen once from the deployment target and
//! `DATABASE_URL`, and never changes afterwards.

use std::net::SocketAddr;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Which deployment this process runs as.
    pub deployment: DeploymentTarget,
    /// PostgreSQL connection string, if provided.
    pub database_url: Option<String>,
    /// Clear and reseed the relational tables at startup.
    pub seed_database: bool,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

/// Deployment flavours, which disagree on what a missing `DATABASE_URL` means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentTarget {
    /// Long-running server. Falls back to in-memory storage.
    Server,
    /// Edge functions. A database is mandatory.
    Functions,
}

impl std::fmt::Display for DeploymentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server => write!(f, "server"),
            Self::Functions => write!(f, "functions"),
        }
    }
}

impl std::str::FromStr for DeploymentTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "server" => Ok(Self::Server),
            "functions" | "pages" => Ok(Self::Functions),
            other => Err(ConfigError::UnknownDeployment(other.to_owned())),
        }
    }
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory, seeded from fixtures; saved commands are lost on restart.
    Memory,
    /// PostgreSQL relational tables.
    Postgres { url: String },
}

/// Configuration errors that stop startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("DATABASE_URL environment variable is required")]
    MissingDatabaseUrl,

    #[error("unknown deployment target '{0}', expected 'server' or 'functions'")]
    UnknownDeployment(String),
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `NXDOCS_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:5000`)
    /// - `NXDOCS_DEPLOYMENT`: `server` or `functions` (default: `server`)
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `NXDOCS_SEED_DATABASE`: reseed relational tables at startup (default: `false`)
    /// - `NXDOCS_LOG_LEVEL`: log filter (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDeployment`] for an unrecognised deployment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownDeployment`] for an unrecognised deployment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        // Priority: NXDOCS_BIND_ADDR > PORT > default 127.0.0.1:5000
        let default_addr = SocketAddr::from(([127, 0, 0, 1], 5000));
        let bind_addr = if let Some(addr) = lookup("NXDOCS_BIND_ADDR") {
            addr.parse().unwrap_or(default_addr)
        } else if let Some(port_str) = lookup("PORT") {
            let port: u16 = port_str.parse().unwrap_or(5000);
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            default_addr
        };

        let deployment = match lookup("NXDOCS_DEPLOYMENT") {
            Some(value) => value.parse()?,
            None => DeploymentTarget::Server,
        };

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        let seed_database = lookup("NXDOCS_SEED_DATABASE")
            .is_some_and(|v| v == "true" || v == "1");

        let log_level = lookup("NXDOCS_LOG_LEVEL").unwrap_or_else(|| "info".to_owned());

        Ok(Self {
            bind_addr,
            deployment,
            database_url,
            seed_database,
            log_level,
        })
    }

    /// Choose the storage backend for this deployment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when a `functions`
    /// deployment has no `DATABASE_URL`.
    pub fn storage_backend(&self) -> Result<StorageBackendType, ConfigError> {
        match (&self.database_url, self.deployment) {
            (Some(url), _) => Ok(StorageBackendType::Postgres { url: url.clone() }),
            (None, DeploymentTarget::Server) => Ok(StorageBackendType::Memory),
            (None, DeploymentTarget::Functions) => Err(ConfigError::MissingDatabaseUrl),
        }
    }
}
