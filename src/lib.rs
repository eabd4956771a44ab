//! # varnish-admin
//!
//! A client for the Varnish administrative socket (`varnishadm` protocol):
//! - Line-oriented text protocol with length-prefixed responses
//! - Challenge-response authentication with a shared secret
//! - Command dialects for Varnish 3 and 4
//! - Blocking I/O with a uniform connect/read timeout
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      AdminSession                            │
//! │        (handshake, authentication, command dispatch)         │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ CommandSet  │          │  Transport  │
//!   │  (V3 / V4)  │          │   (TCP)     │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │    Codec    │
//!                           │ (framing)   │
//!                           └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use varnish_admin::{AdminSession, Config};
//!
//! let config = Config::builder().version("4.1").secret("s3cret\n").build()?;
//! let mut admin = AdminSession::new(config);
//! admin.connect()?;
//! admin.purge_url("/products/.*")?;
//! admin.quit();
//! # Ok::<(), varnish_admin::AdminError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod network;
pub mod session;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{AdminError, Result};
pub use config::{Config, ServerAddress};
pub use protocol::{ChildState, ProtocolVersion};
pub use session::{AdminSession, SessionState};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of varnish-admin
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
