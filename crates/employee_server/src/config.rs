//! Environment-driven server configuration.
//!
//! # Responsibility
//! - Resolve every setting from `EMPLOYEE_*` variables with documented
//!   defaults.
//! - Reject malformed values at startup instead of at first use.

use employee_core::default_log_level;
use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DB_PATH_KEY: &str = "EMPLOYEE_DB_PATH";
pub const BIND_ADDR_KEY: &str = "EMPLOYEE_BIND_ADDR";
pub const PORT_KEY: &str = "EMPLOYEE_PORT";
pub const STATIC_DIR_KEY: &str = "EMPLOYEE_STATIC_DIR";
pub const STORE_TIMEOUT_KEY: &str = "EMPLOYEE_STORE_TIMEOUT_SECS";
pub const LOG_LEVEL_KEY: &str = "EMPLOYEE_LOG_LEVEL";
pub const LOG_DIR_KEY: &str = "EMPLOYEE_LOG_DIR";

const DEFAULT_DB_PATH: &str = "employees.sqlite3";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_STATIC_DIR: &str = "./frontend/dist";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// SQLite file holding the three employee collections.
    pub db_path: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Built single-page app; `index.html` is the fallback for unknown paths.
    pub static_dir: PathBuf,
    /// Upper bound for the store work of one request.
    pub store_timeout: Duration,
    pub log_level: String,
    /// Rolling log directory; `None` logs to stderr.
    pub log_dir: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let store_timeout_secs: u64 =
            try_load(STORE_TIMEOUT_KEY, var(STORE_TIMEOUT_KEY), DEFAULT_STORE_TIMEOUT_SECS)?;
        if store_timeout_secs == 0 {
            return Err(ConfigError::new(
                STORE_TIMEOUT_KEY,
                "0",
                "timeout must be at least one second",
            ));
        }

        Ok(Self {
            db_path: var(DB_PATH_KEY).map_or(defaults.db_path, PathBuf::from),
            bind_addr: try_load(BIND_ADDR_KEY, var(BIND_ADDR_KEY), defaults.bind_addr)?,
            port: try_load(PORT_KEY, var(PORT_KEY), defaults.port)?,
            static_dir: var(STATIC_DIR_KEY).map_or(defaults.static_dir, PathBuf::from),
            store_timeout: Duration::from_secs(store_timeout_secs),
            log_level: var(LOG_LEVEL_KEY).unwrap_or(defaults.log_level),
            log_dir: var(LOG_DIR_KEY),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn try_load<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|err: T::Err| ConfigError::new(key, &value, err.to_string())),
        None => Ok(default),
    }
}

/// A configuration variable holding an unusable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

impl ConfigError {
    fn new(key: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            key,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value `{}`: {}", self.key, self.value, self.reason)
    }
}

impl Error for ConfigError {}
