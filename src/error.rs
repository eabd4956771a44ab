//! Error types for varnish-admin
//!
//! Provides a unified error type for all session operations.

use thiserror::Error;

/// Result type alias using AdminError
pub type Result<T> = std::result::Result<T, AdminError>;

/// Unified error type for admin socket operations
#[derive(Debug, Error)]
pub enum AdminError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Failed to connect to varnishadm on {host}:{port}; \"{source}\"")]
    Connection {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out reading from socket {host}:{port}")]
    Timeout { host: String, port: u16 },

    #[error("Failed to write to varnishadm on {host}:{port}")]
    Write { host: String, port: u16 },

    #[error("Not connected; call connect() first")]
    NotConnected,

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{command} command responded {status}:\n > {body}")]
    Command {
        command: String,
        status: u16,
        body: String,
    },

    // -------------------------------------------------------------------------
    // Handshake Errors
    // -------------------------------------------------------------------------
    #[error("Authentication required; see AdminSession::set_secret")]
    AuthRequired,

    #[error("Authentication failed")]
    AuthFailed,

    #[error("Bad response {status} from varnishadm on {host}:{port}")]
    BadResponse { host: String, port: u16, status: u16 },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Only versions 3 and 4 of Varnish are supported, got {0:?}")]
    UnsupportedVersion(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdminError {
    /// Status code carried by the error, if it came from a server response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            AdminError::Command { status, .. } | AdminError::BadResponse { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Whether the error is a read timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, AdminError::Timeout { .. })
    }
}
