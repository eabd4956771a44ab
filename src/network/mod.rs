//! Network Module
//!
//! Transport to the admin socket.
//!
//! ## Architecture
//! - `Transport`: one open duplex stream, owned by a session
//! - `Connector`: opens transports; TCP by default
//! - Responses are decoded by the protocol codec over the buffered stream

mod transport;
mod connection;

pub use transport::{Connector, Transport};
pub use connection::{TcpConnection, TcpConnector};
