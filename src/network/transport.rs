//! Transport abstraction
//!
//! The duplex byte stream a session talks through, and the connector that
//! opens it.

use std::time::Duration;

use crate::config::ServerAddress;
use crate::error::Result;
use crate::protocol::Response;

/// An open duplex stream to the admin socket
pub trait Transport {
    /// Perform one blocking write
    ///
    /// Fails with `AdminError::Write` unless every byte was written.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read one framed response
    fn read_response(&mut self) -> Result<Response>;

    /// Release the stream. Safe to call more than once.
    fn close(&mut self);
}

/// Opens transports to an admin socket
pub trait Connector {
    type Transport: Transport;

    /// Establish a stream, applying `timeout` to the connect attempt and to
    /// every subsequent read and write
    fn open(&self, address: &ServerAddress, timeout: Duration) -> Result<Self::Transport>;
}
