//! Configuration module for the PlateShare backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Front-end origins allowed to call the API when nothing else is configured.
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "http://localhost:3000",
    "https://plateshare-6602a.web.app",
    "https://plateshare-6602a.firebaseapp.com",
];

/// Cross-origin policy for the HTTP layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    /// Any origin is accepted.
    Any,
    /// Only the listed origins are accepted.
    List(Vec<String>),
}

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Allowed cross-origin callers
    pub cors_origins: CorsOrigins,
    /// Pool acquire timeout and SQLite busy timeout
    pub db_timeout: Duration,
    /// Upper bound on the time spent serving one HTTP request
    pub request_timeout: Duration,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
}

/// A configuration variable that could not be parsed.
#[derive(Debug)]
pub struct ConfigError {
    pub variable: &'static str,
    pub value: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value for {}: {:?}", self.variable, self.value)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = lookup("PLATESHARE_DB_PATH")
            .unwrap_or_else(|| "./data/plateshare.sqlite".to_string())
            .into();

        let raw_addr =
            lookup("PLATESHARE_BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let mut bind_addr: SocketAddr = raw_addr.parse().map_err(|_| ConfigError {
            variable: "PLATESHARE_BIND_ADDR",
            value: raw_addr.clone(),
        })?;

        // Hosting platforms hand out the port through PORT.
        if let Some(port) = lookup("PORT") {
            let parsed = port.trim().parse::<u16>().map_err(|_| ConfigError {
                variable: "PORT",
                value: port.clone(),
            })?;
            bind_addr.set_port(parsed);
        }

        let cors_origins = match lookup("PLATESHARE_CORS_ORIGINS") {
            Some(raw) => parse_origins(&raw),
            None => CorsOrigins::List(
                DEFAULT_CORS_ORIGINS
                    .iter()
                    .map(|origin| origin.to_string())
                    .collect(),
            ),
        };

        let db_timeout = parse_secs(&lookup, "PLATESHARE_DB_TIMEOUT_SECS", 30)?;
        let request_timeout = parse_secs(&lookup, "PLATESHARE_REQUEST_TIMEOUT_SECS", 30)?;

        let log_level = lookup("PLATESHARE_LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("PLATESHARE_LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError {
                    variable: "PLATESHARE_LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            db_path,
            bind_addr,
            cors_origins,
            db_timeout,
            request_timeout,
            log_level,
            log_format,
        })
    }
}

fn parse_origins(raw: &str) -> CorsOrigins {
    if raw.trim() == "*" {
        return CorsOrigins::Any;
    }
    CorsOrigins::List(
        raw.split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn parse_secs<F>(lookup: &F, variable: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(variable) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
            _ => Err(ConfigError { variable, value }),
        },
    }
}
