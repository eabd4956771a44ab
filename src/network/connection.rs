//! TCP Connection
//!
//! Blocking TCP transport to the admin socket.

use std::io::{self, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::{Connector, Transport};
use crate::config::ServerAddress;
use crate::error::{AdminError, Result};
use crate::protocol::{read_response, Response};

/// Opens [`TcpConnection`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    type Transport = TcpConnection;

    fn open(&self, address: &ServerAddress, timeout: Duration) -> Result<TcpConnection> {
        TcpConnection::open(address, timeout)
    }
}

/// A single connection to the admin socket
pub struct TcpConnection {
    /// Buffered read half; `None` once closed
    reader: Option<BufReader<TcpStream>>,

    /// Write half, unbuffered so every write reports its own count
    writer: Option<TcpStream>,

    /// Address for error context and logging
    address: ServerAddress,
}

impl TcpConnection {
    /// Connect to the admin socket
    ///
    /// Every resolved address is tried in turn; the last failure is reported.
    pub fn open(address: &ServerAddress, timeout: Duration) -> Result<Self> {
        let connection_error = |source: io::Error| AdminError::Connection {
            host: address.host().to_string(),
            port: address.port(),
            source,
        };

        let addrs = (address.host(), address.port())
            .to_socket_addrs()
            .map_err(connection_error)?;

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        let stream = match stream {
            Some(s) => s,
            None => {
                let cause = last_err.unwrap_or_else(|| {
                    io::Error::new(io::ErrorKind::NotFound, "host resolved to no addresses")
                });
                return Err(connection_error(cause));
            }
        };

        // Commands are tiny request/response exchanges
        stream.set_nodelay(true).map_err(connection_error)?;
        stream.set_read_timeout(Some(timeout)).map_err(connection_error)?;
        stream.set_write_timeout(Some(timeout)).map_err(connection_error)?;

        let read_stream = stream.try_clone().map_err(connection_error)?;

        tracing::debug!("Connection established to {}", address);

        Ok(Self {
            reader: Some(BufReader::new(read_stream)),
            writer: Some(stream),
            address: address.clone(),
        })
    }

    pub fn address(&self) -> &ServerAddress {
        &self.address
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    fn write_error(&self) -> AdminError {
        AdminError::Write {
            host: self.address.host().to_string(),
            port: self.address.port(),
        }
    }

    fn closed_error() -> AdminError {
        AdminError::Io(io::Error::new(io::ErrorKind::NotConnected, "connection closed"))
    }
}

impl Transport for TcpConnection {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let writer = self.writer.as_mut().ok_or_else(Self::closed_error)?;
        let written = match writer.write(data) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Error writing to {}: {}", self.address, e);
                return Err(self.write_error());
            }
        };
        if written != data.len() {
            tracing::warn!(
                "Short write to {}: {} of {} bytes",
                self.address,
                written,
                data.len()
            );
            return Err(self.write_error());
        }
        Ok(written)
    }

    fn read_response(&mut self) -> Result<Response> {
        let reader = self.reader.as_mut().ok_or_else(Self::closed_error)?;
        match read_response(reader) {
            Ok(response) => Ok(response),
            // Unix reports a read timeout as WouldBlock, Windows as TimedOut
            Err(AdminError::Io(ref e))
                if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) =>
            {
                Err(AdminError::Timeout {
                    host: self.address.host().to_string(),
                    port: self.address.port(),
                })
            }
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) {
        self.reader = None;
        if let Some(stream) = self.writer.take() {
            let _ = stream.shutdown(Shutdown::Both);
            tracing::debug!("Connection to {} closed", self.address);
        }
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        self.close();
    }
}
