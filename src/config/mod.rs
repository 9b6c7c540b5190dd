use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub api_server: ServerConfig,
    pub http: HttpConfig,
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Allowed CORS origins; an empty list means any origin
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "HttpConfig::default_max_request_bytes")]
    pub max_request_bytes: usize,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// Per-client-IP request quotas. Reads are GET/HEAD/OPTIONS, everything
/// else counts against the write quota.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub read_per_minute: u32,
    pub write_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_per_minute: 300,
            write_per_minute: 60,
        }
    }
}

impl HttpConfig {
    const fn default_max_request_bytes() -> usize {
        10 * 1024 * 1024
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            cors_allowed_origins: Vec::new(),
            max_request_bytes: Self::default_max_request_bytes(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let backend_str =
            std::env::var("DATABASE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());

        let backend = match backend_str.to_lowercase().as_str() {
            "postgres" | "postgresql" => DatabaseBackend::Postgres,
            "sqlite" => DatabaseBackend::Sqlite,
            other => {
                tracing::warn!(
                    "Unknown DATABASE_BACKEND '{other}', falling back to 'sqlite'. Supported values: sqlite, postgres"
                );
                DatabaseBackend::Sqlite
            }
        };

        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./sidepanel.db".to_string());

        let max_connections = std::env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?;

        let api_host = std::env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let api_port = std::env::var("API_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse::<u16>()
            .context("API_PORT must be a valid port number")?;

        let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_default();

        let max_request_bytes = match std::env::var("MAX_REQUEST_BYTES") {
            Ok(v) => v
                .parse::<usize>()
                .context("MAX_REQUEST_BYTES must be a byte count")?,
            Err(_) => HttpConfig::default_max_request_bytes(),
        };

        let rate_limit = rate_limit_from_env()?;

        let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Config {
            database: DatabaseConfig {
                backend,
                url: database_url,
                max_connections,
            },
            api_server: ServerConfig {
                host: api_host,
                port: api_port,
            },
            http: HttpConfig {
                cors_allowed_origins,
                max_request_bytes,
                rate_limit,
            },
            log_level,
        })
    }
}

fn rate_limit_from_env() -> anyhow::Result<RateLimitConfig> {
    let defaults = RateLimitConfig::default();

    let enabled = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
        .unwrap_or(defaults.enabled);

    let read_per_minute = match std::env::var("RATE_LIMIT_READ_PER_MINUTE") {
        Ok(v) => v
            .parse::<u32>()
            .context("RATE_LIMIT_READ_PER_MINUTE must be a positive integer")?,
        Err(_) => defaults.read_per_minute,
    };
    let write_per_minute = match std::env::var("RATE_LIMIT_WRITE_PER_MINUTE") {
        Ok(v) => v
            .parse::<u32>()
            .context("RATE_LIMIT_WRITE_PER_MINUTE must be a positive integer")?,
        Err(_) => defaults.write_per_minute,
    };

    if enabled && (read_per_minute == 0 || write_per_minute == 0) {
        anyhow::bail!("rate limit quotas must be non-zero; set RATE_LIMIT_ENABLED=false to disable");
    }

    Ok(RateLimitConfig {
        enabled,
        read_per_minute,
        write_per_minute,
    })
}

/// Comma-separated origin list; `*` (or nothing) allows any origin.
fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}
