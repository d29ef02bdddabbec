// src/config.rs

use std::env;
use std::str::FromStr;

use dotenvy::dotenv;

/// Runtime configuration, built once at startup and carried in `AppState`.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Admin token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub log_dir: String,
    pub bind_addr: String,
    /// Bootstrap admin credentials. Seeding is skipped unless both are set.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    /// Idle lifetime of a student's transient session state.
    pub attempt_ttl_seconds: u64,
    /// Lifetime of an unread review handoff.
    pub handoff_ttl_seconds: u64,
    pub allowed_origins: Vec<String>,
    pub static_dir: String,
    /// Problems found while reading the environment. Logged by `main` once
    /// tracing is up.
    pub env_warnings: Vec<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://pinquiz.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let mut env_warnings = Vec::new();
        let jwt_expiration = parse_env("JWT_EXPIRATION", 86_400, &mut env_warnings);
        let attempt_ttl_seconds = parse_env("ATTEMPT_TTL_SECONDS", 4 * 60 * 60, &mut env_warnings);
        let handoff_ttl_seconds = parse_env("HANDOFF_TTL_SECONDS", 30 * 60, &mut env_warnings);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            attempt_ttl_seconds,
            handoff_ttl_seconds,
            allowed_origins,
            static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            env_warnings,
        }
    }
}

fn parse_env<T: FromStr + Copy + std::fmt::Display>(
    key: &str,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    parse_value(key, env::var(key).ok(), default, warnings)
}

/// Parses `raw`, falling back to `default` with a warning when it is malformed.
fn parse_value<T: FromStr + Copy + std::fmt::Display>(
    key: &str,
    raw: Option<String>,
    default: T,
    warnings: &mut Vec<String>,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        warnings.push(format!("Invalid value '{}' for {}, using {}", raw, key, default));
        default
    })
}
