//! Server configuration

use crate::error::{Error, Result};
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// Configuration shared by the SMTP and POP3 servers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub smtp_port: u16,
    pub pop3_port: u16,
    /// Name announced in the greeting banners.
    pub hostname: String,
    /// Maximum number of messages the mail store keeps.
    pub capacity: usize,
    /// Whether one SMTP session may carry more than one message.
    pub multiple_messages: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            smtp_port: 2525,
            pop3_port: 8110,
            hostname: "mailstand.local".to_string(),
            capacity: 10,
            multiple_messages: true,
        }
    }
}

impl ServerConfig {
    /// Load the configuration from environment variables
    ///
    /// Reads from `.env` file if present. Every variable is optional:
    /// - `MAILSTAND_HOST` (default: `127.0.0.1`)
    /// - `MAILSTAND_SMTP_PORT` (default: `2525`)
    /// - `MAILSTAND_POP3_PORT` (default: `8110`)
    /// - `MAILSTAND_HOSTNAME` (default: `mailstand.local`)
    /// - `MAILSTAND_CAPACITY` (default: `10`, must be positive)
    /// - `MAILSTAND_MULTIPLE_MESSAGES` (default: `true`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a variable cannot be parsed or the
    /// result does not [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            host: var_or("MAILSTAND_HOST", defaults.host)?,
            smtp_port: var_or("MAILSTAND_SMTP_PORT", defaults.smtp_port)?,
            pop3_port: var_or("MAILSTAND_POP3_PORT", defaults.pop3_port)?,
            hostname: env::var("MAILSTAND_HOSTNAME").unwrap_or(defaults.hostname),
            capacity: var_or("MAILSTAND_CAPACITY", defaults.capacity)?,
            multiple_messages: var_or("MAILSTAND_MULTIPLE_MESSAGES", defaults.multiple_messages)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the servers cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a zero capacity or a blank hostname.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be greater than zero".into()));
        }
        if self.hostname.trim().is_empty() {
            return Err(Error::Config("hostname must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub const fn smtp_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.smtp_port)
    }

    #[must_use]
    pub const fn pop3_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.pop3_port)
    }
}

fn var_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {name}: {e}"))),
        Err(_) => Ok(default),
    }
}
