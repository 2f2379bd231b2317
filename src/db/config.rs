use std::time::Duration;

use thiserror::Error;

use crate::config::{env_bool, env_string, env_u64};

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub primary_url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, DbConfigError> {
        let primary_url = env_string("DATABASE_URL").ok_or(DbConfigError::Missing {
            key: "DATABASE_URL",
        })?;

        Ok(Self {
            primary_url,
            max_connections: env_u64("DATABASE_MAX_CONNECTIONS").unwrap_or(10) as u32,
            acquire_timeout: Duration::from_millis(
                env_u64("DATABASE_ACQUIRE_TIMEOUT_MS").unwrap_or(5_000),
            ),
            run_migrations: env_bool("RUN_MIGRATIONS", true),
        })
    }
}

#[derive(Debug, Error)]
pub enum DbConfigError {
    #[error("missing env var {key}")]
    Missing { key: &'static str },
}
