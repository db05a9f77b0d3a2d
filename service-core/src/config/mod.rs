use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()
            .map_err(|e| AppError::Config(anyhow::Error::new(e)))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(anyhow::Error::new(e)))
    }
}

/// Read a required environment variable. Absence is a startup-fatal
/// configuration error, never a per-request failure.
pub fn require_env(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::Config(anyhow::anyhow!("missing required environment variable {name}")))
}

/// Read an optional environment variable, falling back to a default.
pub fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read and parse an optional environment variable, falling back to a default.
pub fn env_parse_or<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(anyhow::anyhow!("invalid value for {name}: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Read and parse a required environment variable.
pub fn require_env_parse<T: FromStr>(name: &str) -> Result<T, AppError> {
    let raw = require_env(name)?;
    raw.parse()
        .map_err(|_| AppError::Config(anyhow::anyhow!("invalid value for {name}: {raw}")))
}
