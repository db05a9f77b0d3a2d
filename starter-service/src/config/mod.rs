use service_core::config as core_config;
use service_core::config::{env_or, env_parse_or, require_env, require_env_parse};
use service_core::error::AppError;
use service_core::observability::audit_trail::AuditTrailConfig;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub log_level: String,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub audit_log: AuditTrailConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Prod,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Token signing material. Two independent secret/TTL pairs; all four
/// variables are required and their absence aborts startup.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::Config(anyhow::anyhow!(e)))?;

        Ok(AppConfig {
            common,
            environment,
            service_name: env_or("SERVICE_NAME", "starter-service"),
            log_level: env_or("LOG_LEVEL", "info"),
            database: DatabaseConfig {
                url: require_env("DATABASE_URL")?,
                max_connections: env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: env_parse_or("DATABASE_MIN_CONNECTIONS", 1)?,
            },
            jwt: JwtConfig {
                access_secret: require_env("ACCESS_SECRET")?,
                refresh_secret: require_env("REFRESH_SECRET")?,
                access_ttl_secs: require_env_parse("ACCESS_TTL")?,
                refresh_ttl_secs: require_env_parse("REFRESH_TTL")?,
            },
            audit_log: AuditTrailConfig {
                dir: env_or("LOG_DIR", "logs"),
                retention_days: env_parse_or("LOG_RETENTION_DAYS", 14)?,
            },
        })
    }
}
