use std::env;
use std::net::{IpAddr, SocketAddr};

const DEFAULT_INVOICE_CURRENCY: &str = "PGK";
const DEFAULT_INVOICE_DUE_DAYS: u32 = 30;

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

/// Top-level configuration for the permit service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub workflow: WorkflowConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(&env_or("APP_ENV", "development"));

        let host = env_or("APP_HOST", "127.0.0.1");
        let port = env_or("APP_PORT", "3000")
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env_or("APP_LOG_LEVEL", "info");

        let invoice_currency = env_or("EPERMIT_INVOICE_CURRENCY", DEFAULT_INVOICE_CURRENCY)
            .trim()
            .to_ascii_uppercase();
        if invoice_currency.len() != 3 || !invoice_currency.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ConfigError::InvalidCurrency(invoice_currency));
        }

        let invoice_due_days = match env::var("EPERMIT_INVOICE_DUE_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|days| *days > 0)
                .ok_or(ConfigError::InvalidDueDays(raw))?,
            Err(_) => DEFAULT_INVOICE_DUE_DAYS,
        };

        let review_notes_required = match env::var("EPERMIT_REVIEW_NOTES_REQUIRED") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "EPERMIT_REVIEW_NOTES_REQUIRED",
                value: raw,
            })?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            workflow: WorkflowConfig {
                invoice_currency,
                invoice_due_days,
                review_notes_required,
            },
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
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
    pub ansi: bool,
}

/// Business dials for invoicing and review validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub invoice_currency: String,
    pub invoice_due_days: u32,
    pub review_notes_required: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            invoice_currency: DEFAULT_INVOICE_CURRENCY.to_string(),
            invoice_due_days: DEFAULT_INVOICE_DUE_DAYS,
            review_notes_required: true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("EPERMIT_INVOICE_CURRENCY must be a three letter ISO code, found '{0}'")]
    InvalidCurrency(String),
    #[error("EPERMIT_INVOICE_DUE_DAYS must be a positive number of days, found '{0}'")]
    InvalidDueDays(String),
    #[error("{name} must be a boolean flag, found '{value}'")]
    InvalidFlag { name: &'static str, value: String },
}
