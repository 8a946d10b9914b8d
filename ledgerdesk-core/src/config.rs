use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Which row store backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::Invalid {
                name: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Server configuration.
///
/// Read from environment variables (a `.env` file is loaded first by the
/// binary):
///
/// | Variable | Default |
/// |---|---|
/// | `SERVER_HOST` | `0.0.0.0` |
/// | `SERVER_PORT` | `3000` |
/// | `STORE_BACKEND` | `postgres` |
/// | `DATABASE_URL` | required for `postgres` |
/// | `DATABASE_MAX_CONNECTIONS` | `10` |
/// | `SEED_FILE` | none; optional for `memory` |
/// | `JWT_SECRET` | required |
/// | `RECONCILE_USERS` | empty (nobody may reconcile) |
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub seed_file: Option<PathBuf>,
    pub jwt_secret: String,

    /// Usernames allowed to reconcile or unreconcile months
    pub reconcile_users: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = non_empty("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or("SERVER_PORT", non_empty("SERVER_PORT"), 3000u16)?;
        let max_connections = parse_or(
            "DATABASE_MAX_CONNECTIONS",
            non_empty("DATABASE_MAX_CONNECTIONS"),
            10u32,
        )?;

        let backend = match non_empty("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => StoreBackend::Postgres,
        };

        let database_url = non_empty("DATABASE_URL");
        if backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }

        let jwt_secret = non_empty("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let reconcile_users = non_empty("RECONCILE_USERS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host,
            port,
            backend,
            database_url,
            max_connections,
            seed_file: non_empty("SEED_FILE").map(PathBuf::from),
            jwt_secret,
            reconcile_users,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { name, value: raw }),
        None => Ok(default),
    }
}
