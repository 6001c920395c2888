//! Config module contains the top-level config for the app.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Basic settings - HTTP binding address and database DSN
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub database: String,
    pub thread_count: usize,
    pub database_pool: DatabasePool,
}

/// r2d2 pool settings
#[derive(Debug, Deserialize, Clone)]
pub struct DatabasePool {
    pub max_size: u32,
    pub idle_timeout_secs: u64,
    pub connection_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Session {
    pub ttl_hours: i64,
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
}

/// Local image storage
#[derive(Debug, Deserialize, Clone)]
pub struct Uploads {
    pub dir: String,
    pub public_url: String,
    pub max_size_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Logging {
    pub level: String,
}

/// Service configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub session: Session,
    pub uploads: Uploads,
    pub logging: Logging,
}

impl Config {
    /// Creates config from base.toml, which is overwritten by <env>.toml, where env is taken
    /// from `RUN_MODE` (defaults to development). After that it could be overwritten by env
    /// variables like STQ_STOREFRONT_SERVER__PORT.
    pub fn new() -> Result<Self, ConfigError> {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Config::with_env(env)
    }

    pub fn with_env<S: Into<String>>(env: S) -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.into())).required(false))?;
        s.merge(Environment::with_prefix("STQ_STOREFRONT").separator("__"))?;
        s.try_into()
    }
}
