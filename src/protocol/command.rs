//! Command definitions
//!
//! Logical admin operations and the dialect-specific literals they map to.

use std::fmt;
use std::str::FromStr;

use crate::error::AdminError;

/// Logical operations understood by the admin socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Ban by free-form expression
    Purge,

    /// Ban by request URL
    PurgeUrl,

    /// Start the child process
    Start,

    /// Stop the child process
    Stop,

    /// Report the child process state
    Status,

    /// Close the session from the server side
    Quit,

    /// List configured backends
    BackendList,
}

/// Protocol dialect, selected from the server's major version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVersion {
    #[default]
    V3,
    V4,
}

impl ProtocolVersion {
    pub fn major(self) -> u32 {
        match self {
            ProtocolVersion::V3 => 3,
            ProtocolVersion::V4 => 4,
        }
    }

    /// Command set for this dialect
    pub fn commands(self) -> CommandSet {
        CommandSet { version: self }
    }
}

impl FromStr for ProtocolVersion {
    type Err = AdminError;

    /// Parse a dotted version string by its leading integer component
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let major = s.trim().split('.').next().unwrap_or_default();
        match major.parse::<u32>() {
            Ok(3) => Ok(ProtocolVersion::V3),
            Ok(4) => Ok(ProtocolVersion::V4),
            _ => Err(AdminError::UnsupportedVersion(s.to_string())),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.major())
    }
}

/// Literal command vocabulary of one dialect
///
/// This is the only place where dialects differ. Adding a dialect means
/// adding a `ProtocolVersion` variant and its arms here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSet {
    version: ProtocolVersion,
}

impl CommandSet {
    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    /// Literal command text for an operation
    pub fn literal(&self, op: Operation) -> &'static str {
        match (op, self.version) {
            (Operation::Purge, _) => "ban",
            (Operation::PurgeUrl, ProtocolVersion::V3) => "ban.url",
            (Operation::PurgeUrl, ProtocolVersion::V4) => "ban req.url ~",
            (Operation::Start, _) => "start",
            (Operation::Stop, _) => "stop",
            (Operation::Status, _) => "status",
            (Operation::Quit, _) => "quit",
            (Operation::BackendList, _) => "backend.list",
        }
    }

    /// Full command text, with the argument appended after a space
    pub fn render(&self, op: Operation, arg: Option<&str>) -> String {
        let literal = self.literal(op);
        match arg {
            Some(arg) => format!("{} {}", literal, arg),
            None => literal.to_string(),
        }
    }
}
