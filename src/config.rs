use std::{env, fmt::Display, str::FromStr};

use tracing::info;

use crate::error::ConfigError;

pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: try_load("PORT", "8080")?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key,
        reason: e.to_string(),
    })
}
