use chrono_tz::Tz;
use std::collections::HashMap;
use std::net::IpAddr;
use thiserror::Error;

use crate::clock::DEFAULT_TIMEZONE;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub database_path: String,
    pub business_timezone: Tz,
    pub seed_path: Option<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let bind_addr = env_map
            .get("BIND_ADDR")
            .map(|s| s.as_str())
            .unwrap_or("127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "BIND_ADDR".to_string(),
                    "must be an IPv4 or IPv6 address".to_string(),
                )
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let business_timezone = match env_map.get("BUSINESS_TIMEZONE") {
            None => DEFAULT_TIMEZONE,
            Some(name) => name.trim().parse::<Tz>().map_err(|_| {
                ConfigError::InvalidValue(
                    "BUSINESS_TIMEZONE".to_string(),
                    format!("unknown IANA timezone {}", name),
                )
            })?,
        };

        let seed_path = env_map
            .get("SEED_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Config {
            port,
            bind_addr,
            database_path,
            business_timezone,
            seed_path,
        })
    }
}
