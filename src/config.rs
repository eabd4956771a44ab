//! Configuration for varnish-admin
//!
//! Centralized session configuration with sensible defaults.

use std::fmt;
use std::time::Duration;

use crate::error::{AdminError, Result};
use crate::protocol::ProtocolVersion;

/// Default host of the admin socket
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default admin socket port
pub const DEFAULT_PORT: u16 = 6082;

/// Default connect/read timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Address of the admin socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// Create an address, rejecting an empty host
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(AdminError::Config("host must not be empty".to_string()));
        }
        Ok(Self { host, port })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Main configuration for an admin session
#[derive(Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Admin socket address (host:port)
    pub address: ServerAddress,

    /// Applied to the connect attempt and to every read and write
    pub timeout: Duration,

    // -------------------------------------------------------------------------
    // Protocol Configuration
    // -------------------------------------------------------------------------
    /// Command dialect, fixed for the lifetime of the session
    pub version: ProtocolVersion,

    /// Shared secret, only used if the server issues a challenge
    pub secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            address: ServerAddress::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            version: ProtocolVersion::default(),
            secret: None,
        }
    }
}

// The secret stays out of debug output.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("address", &self.address)
            .field("timeout", &self.timeout)
            .field("version", &self.version)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
///
/// Values are validated in [`ConfigBuilder::build`], so an invalid host or
/// an unsupported version never reaches a session.
pub struct ConfigBuilder {
    host: String,
    port: u16,
    version: Option<String>,
    secret: Option<String>,
    timeout: Duration,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            version: None,
            secret: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ConfigBuilder {
    /// Set the admin socket host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the admin socket port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the server version string, e.g. "3.0.4" or "4.1"
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the authentication secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the connect/read timeout (in seconds)
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Set the connect/read timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<Config> {
        let address = ServerAddress::new(self.host, self.port)?;

        let version = match self.version {
            Some(v) => v.parse::<ProtocolVersion>()?,
            None => ProtocolVersion::default(),
        };

        // A zero timeout is rejected by the socket API
        if self.timeout.is_zero() {
            return Err(AdminError::Config("timeout must be non-zero".to_string()));
        }

        Ok(Config {
            address,
            timeout: self.timeout,
            version,
            secret: self.secret,
        })
    }
}
