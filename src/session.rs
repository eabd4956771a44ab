//! Session Module
//!
//! The admin session: connection handshake, authentication and command
//! dispatch.
//!
//! ## Handshake
//! ```text
//! Disconnected ──connect──► Connecting ──► AwaitingBanner
//!                                              │
//!                   ┌──────── 200 ─────────────┤
//!                   │                          │ 107
//!                   ▼                          ▼
//!                 Ready ◄──── auth 200 ── Authenticating
//!                   │
//!              close / quit
//!                   ▼
//!                Closed
//! ```
//! Any other banner status, or a failed authentication, drops the
//! connection and leaves the session `Disconnected`. So does a transport
//! failure during a command.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::config::{Config, ServerAddress};
use crate::error::{AdminError, Result};
use crate::network::{Connector, TcpConnector, Transport};
use crate::protocol::{
    status, write_command, ChildState, CommandSet, Operation, ProtocolVersion, Response,
};

/// Handshake state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    AwaitingBanner,
    Authenticating,
    Ready,
    Closed,
}

/// A session with one admin socket
///
/// Owns at most one transport. Every operation takes `&mut self`, so a
/// second command can never be issued while one is in flight.
pub struct AdminSession<C: Connector = TcpConnector> {
    /// Socket address
    address: ServerAddress,

    /// Applied to connect and every read/write
    timeout: Duration,

    /// Command literals for the configured dialect
    commands: CommandSet,

    /// Shared secret for the authentication challenge
    secret: Option<String>,

    /// Opens the transport on connect
    connector: C,

    /// Present between a successful open and close
    transport: Option<C::Transport>,

    state: SessionState,
}

impl AdminSession<TcpConnector> {
    /// Create a TCP session from a validated config
    pub fn new(config: Config) -> Self {
        Self::with_connector(config, TcpConnector)
    }
}

impl Default for AdminSession<TcpConnector> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<C: Connector> AdminSession<C> {
    /// Create a session that opens its transport through `connector`
    pub fn with_connector(config: Config, connector: C) -> Self {
        Self {
            address: config.address,
            timeout: config.timeout,
            commands: config.version.commands(),
            secret: config.secret,
            connector,
            transport: None,
            state: SessionState::Disconnected,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn version(&self) -> ProtocolVersion {
        self.commands.version()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Set the authentication secret
    ///
    /// May be called once, before the first `connect`. A secret read from a
    /// file may need its trailing newline kept.
    pub fn set_secret(&mut self, secret: impl Into<String>) -> Result<()> {
        if self.secret.is_some() {
            return Err(AdminError::Config("secret is already set".to_string()));
        }
        if self.state != SessionState::Disconnected {
            return Err(AdminError::Config(
                "secret must be set before connecting".to_string(),
            ));
        }
        self.secret = Some(secret.into());
        Ok(())
    }

    // =========================================================================
    // Connection Lifecycle
    // =========================================================================

    /// Connect with the configured timeout and return the banner text
    pub fn connect(&mut self) -> Result<String> {
        self.connect_with_timeout(self.timeout)
    }

    /// Connect, answer an authentication challenge if one is issued, and
    /// return the banner text
    pub fn connect_with_timeout(&mut self, timeout: Duration) -> Result<String> {
        // Drop any previous connection first
        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }

        self.state = SessionState::Connecting;
        let transport = match self.connector.open(&self.address, timeout) {
            Ok(t) => t,
            Err(e) => {
                self.state = SessionState::Disconnected;
                return Err(e);
            }
        };
        self.transport = Some(transport);

        match self.handshake() {
            Ok(banner) => {
                self.state = SessionState::Ready;
                tracing::debug!("Session ready on {}", self.address);
                Ok(banner)
            }
            Err(e) => {
                tracing::debug!("Handshake with {} failed: {}", self.address, e);
                self.abort();
                self.state = SessionState::Disconnected;
                Err(e)
            }
        }
    }

    /// Read the banner and authenticate when challenged
    fn handshake(&mut self) -> Result<String> {
        self.state = SessionState::AwaitingBanner;
        let banner = self.transport_mut()?.read_response()?;

        match banner.status {
            status::OK => Ok(banner.text()),
            status::AUTH => {
                self.state = SessionState::Authenticating;
                let secret = self
                    .secret
                    .as_deref()
                    .filter(|s| !s.is_empty())
                    .ok_or(AdminError::AuthRequired)?;
                let token = auth_token(banner.challenge(), secret);
                tracing::debug!("Answering authentication challenge from {}", self.address);
                self.command(&format!("auth {}", token), status::OK)
                    .map_err(|_| AdminError::AuthFailed)
            }
            other => Err(AdminError::BadResponse {
                host: self.address.host().to_string(),
                port: self.address.port(),
                status: other,
            }),
        }
    }

    /// Close the connection without sending `quit`
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            self.state = SessionState::Closed;
        }
    }

    /// Send `quit`, then close regardless of the outcome
    pub fn quit(&mut self) {
        let quit = self.commands.literal(Operation::Quit);
        if let Err(e) = self.command(quit, status::CLOSE) {
            tracing::debug!("Ignoring quit failure on {}: {}", self.address, e);
        }
        self.close();
    }

    // =========================================================================
    // Command Dispatch
    // =========================================================================

    /// Send a command and return the response body
    ///
    /// Fails with `AdminError::Command` when the status differs from
    /// `expected`.
    ///
    /// A transport failure (timeout, write or read error) drops the
    /// connection: a late reply would otherwise be paired with the next
    /// command. The session is then `Disconnected`.
    pub fn command(&mut self, text: &str, expected: u16) -> Result<String> {
        let response = match self.exchange(text) {
            Ok(response) => response,
            Err(AdminError::NotConnected) => return Err(AdminError::NotConnected),
            Err(e) => {
                tracing::warn!(
                    "Dropping connection to {} after {:?} failed: {}",
                    self.address,
                    text,
                    e
                );
                self.abort();
                return Err(e);
            }
        };

        if response.status != expected {
            return Err(AdminError::Command {
                command: text.to_string(),
                status: response.status,
                body: indent_body(&response.text()),
            });
        }

        Ok(response.text())
    }

    fn exchange(&mut self, text: &str) -> Result<Response> {
        let transport = self.transport_mut()?;
        write_command(transport, text)?;
        transport.read_response()
    }

    /// Release a transport whose stream can no longer be trusted
    fn abort(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            self.state = SessionState::Disconnected;
        }
    }

    fn transport_mut(&mut self) -> Result<&mut C::Transport> {
        self.transport.as_mut().ok_or(AdminError::NotConnected)
    }

    fn run(&mut self, op: Operation, arg: Option<&str>) -> Result<String> {
        let text = self.commands.render(op, arg);
        self.command(&text, status::OK)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Ban objects matching an expression such as `req.http.host == example.com`
    pub fn purge(&mut self, expr: &str) -> Result<String> {
        self.run(Operation::Purge, Some(expr))
    }

    /// Ban objects by URL, using the dialect's URL ban syntax
    pub fn purge_url(&mut self, url: &str) -> Result<String> {
        self.run(Operation::PurgeUrl, Some(url))
    }

    /// List configured backends
    pub fn backend_list(&mut self) -> Result<String> {
        self.run(Operation::BackendList, None)
    }

    /// Start the child process
    ///
    /// Returns `true` without sending anything if it already runs.
    pub fn start(&mut self) -> Result<bool> {
        if self.status() {
            tracing::info!("varnish host already started on {}", self.address);
            return Ok(true);
        }
        self.run(Operation::Start, None)?;
        Ok(true)
    }

    /// Stop the child process
    ///
    /// Returns `true` without sending anything if it is not running.
    pub fn stop(&mut self) -> Result<bool> {
        if !self.status() {
            tracing::info!("varnish host already stopped on {}", self.address);
            return Ok(true);
        }
        self.run(Operation::Stop, None)?;
        Ok(true)
    }

    /// Whether the child process is running
    ///
    /// Any failure, including an unreachable server, reads as not running.
    /// Use [`AdminSession::child_state`] to tell the two apart.
    pub fn status(&mut self) -> bool {
        match self.child_state() {
            Ok(state) => state.is_running(),
            Err(e) => {
                tracing::debug!("Status on {} treated as not running: {}", self.address, e);
                false
            }
        }
    }

    /// Child process state, propagating command and parse failures
    pub fn child_state(&mut self) -> Result<ChildState> {
        let body = self.run(Operation::Status, None)?;
        ChildState::parse(&body).ok_or_else(|| {
            AdminError::Protocol(format!("unrecognized status response: {}", body.trim()))
        })
    }
}

impl<C: Connector> Drop for AdminSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Lowercase hex SHA-256 answer to an authentication challenge
pub fn auth_token(challenge: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(b"\n");
    hasher.update(secret.as_bytes());
    hasher.update(challenge);
    hasher.update(b"\n");
    format!("{:x}", hasher.finalize())
}

/// Rewrite line breaks of an error body into an indented block
fn indent_body(body: &str) -> String {
    body.trim().split('\n').collect::<Vec<_>>().join("\n > ")
}
