use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveTime;

use crate::workflows::marriage::scheduling::SchedulingConfig;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the registry service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scheduling: SchedulingConfig,
    pub reminders: ReminderConfig,
    pub geocoding: GeocodingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let defaults = SchedulingConfig::default();
        let scheduling = SchedulingConfig {
            venue_daily_capacity: parse_var("KUA_VENUE_DAILY_CAP", defaults.venue_daily_capacity)?,
            officiant_daily_quota: parse_var(
                "KUA_OFFICIANT_DAILY_CAP",
                defaults.officiant_daily_quota,
            )?,
            assignment_separation_minutes: parse_var(
                "KUA_ASSIGN_SEPARATION_MINUTES",
                defaults.assignment_separation_minutes,
            )?,
            change_separation_minutes: parse_var(
                "KUA_CHANGE_SEPARATION_MINUTES",
                defaults.change_separation_minutes,
            )?,
            ..defaults
        };

        let reminder_raw = env::var("KUA_REMINDER_TIME").unwrap_or_else(|_| "08:00".to_string());
        let run_at = NaiveTime::parse_from_str(reminder_raw.trim(), "%H:%M").map_err(|_| {
            ConfigError::InvalidTime {
                variable: "KUA_REMINDER_TIME",
                value: reminder_raw.clone(),
            }
        })?;

        let ttl_days: u32 = parse_var("KUA_GEOCODE_CACHE_TTL_DAYS", 30)?;
        let timeout_ms: u64 = parse_var("KUA_GEOCODE_TIMEOUT_MS", 3_000)?;

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scheduling,
            reminders: ReminderConfig { run_at },
            geocoding: GeocodingConfig {
                cache_ttl: chrono::Duration::days(i64::from(ttl_days)),
                timeout: Duration::from_millis(timeout_ms),
            },
        })
    }
}

fn parse_var<T: FromStr>(variable: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber {
                variable,
                value: raw,
            }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Wall-clock time of the daily reminder scan.
#[derive(Debug, Clone, Copy)]
pub struct ReminderConfig {
    pub run_at: NaiveTime,
}

#[derive(Debug, Clone, Copy)]
pub struct GeocodingConfig {
    pub cache_ttl: chrono::Duration,
    pub timeout: Duration,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        variable: &'static str,
        value: String,
    },
    InvalidTime {
        variable: &'static str,
        value: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative integer (found '{value}')")
            }
            ConfigError::InvalidTime { variable, value } => {
                write!(f, "{variable} must be a 24-hour HH:MM time (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidTime { .. } => None,
        }
    }
}
