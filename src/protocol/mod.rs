//! Protocol Module
//!
//! Defines the text protocol spoken on the admin socket.
//!
//! ## Request Format
//! ```text
//! <command text>\n
//! ```
//!
//! ### Commands
//! - `ban <expr>`            - ban by expression
//! - `ban.url <url>`         - ban by URL (dialect 3)
//! - `ban req.url ~ <url>`   - ban by URL (dialect 4)
//! - `start` / `stop`        - control the child process
//! - `status`                - report the child state
//! - `backend.list`          - list backends
//! - `auth <sha256-hex>`     - answer an authentication challenge
//! - `quit`                  - close the session
//!
//! ## Response Format
//! ```text
//! <code> <len>\n<body of len bytes>\n
//! ```
//!
//! ### Status Codes
//! - 200: OK
//! - 107: AUTH (banner only)
//! - 500: CLOSE (answer to quit)
//! - anything else: error, body holds the detail

mod command;
mod response;
mod codec;

pub use command::{CommandSet, Operation, ProtocolVersion};
pub use response::{status, ChildState, Response, CHALLENGE_LEN};
pub use codec::{parse_header, read_response, write_command, MAX_BODY_SIZE, TERMINATOR};
