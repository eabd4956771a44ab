//! Response definitions
//!
//! Represents responses read from the admin socket.

use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;

/// Status codes with a protocol meaning
pub mod status {
    /// Command succeeded; also the plain banner
    pub const OK: u16 = 200;

    /// Banner carrying an authentication challenge
    pub const AUTH: u16 = 107;

    /// Acknowledgement of `quit`
    pub const CLOSE: u16 = 500;
}

/// Length of the challenge token at the start of a 107 banner
pub const CHALLENGE_LEN: usize = 32;

// ASCII word characters only, like the server's own state names
static CHILD_STATE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Child in state ([A-Za-z0-9_]+)").expect("valid child state pattern")
});

/// A response read from the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Three digit status code
    pub status: u16,

    /// Body of exactly the declared length, unless the stream ended early
    pub body: Bytes,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == status::OK
    }

    /// Body decoded as text, replacing invalid UTF-8
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Challenge token embedded at the start of a 107 banner
    pub fn challenge(&self) -> &[u8] {
        let end = self.body.len().min(CHALLENGE_LEN);
        &self.body[..end]
    }
}

/// State of the cache child process, as reported by `status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChildState {
    Running,
    Stopped,
    Other(String),
}

impl ChildState {
    /// Extract the child state from a `status` body
    pub fn parse(body: &str) -> Option<Self> {
        let caps = CHILD_STATE_REGEX.captures(body)?;
        Some(match &caps[1] {
            "running" => ChildState::Running,
            "stopped" => ChildState::Stopped,
            other => ChildState::Other(other.to_string()),
        })
    }

    pub fn is_running(&self) -> bool {
        matches!(self, ChildState::Running)
    }
}
