//! Session Tests
//!
//! Handshake and command dispatch against a scripted admin socket over TCP.

#[path = "../support/fake_server.rs"]
mod fake_server;

use std::time::Duration;

use fake_server::FakeServer;
use varnish_admin::session::auth_token;
use varnish_admin::{AdminError, AdminSession, Config, SessionState};

const BANNER: &str = "-----------------------------\nVarnish Cache CLI 1.0\n-----------------------------\nLinux,4.15.0,x86_64,-jnone,-smalloc,-smalloc,-hcritbit\nvarnish-4.1.10 revision 1d090c5\n\nType 'help' for command list.\nType 'quit' to close CLI session.";
const CHALLENGE: &str = "ixslvvxrgkjptxmcgnnsdxsvdmvfympg\n\nAuthentication required.\n";

// =============================================================================
// Handshake Tests
// =============================================================================

#[test]
fn test_connect_returns_banner() {
    let server = FakeServer::start((200, BANNER), &[]);
    let mut admin = AdminSession::new(server.config("3"));

    assert_eq!(admin.connect().unwrap(), BANNER);
    assert_eq!(admin.state(), SessionState::Ready);

    admin.close();
    assert!(server.received().is_empty());
}

#[test]
fn test_auth_required_sends_nothing() {
    let server = FakeServer::start((107, CHALLENGE), &[]);
    let mut admin = AdminSession::new(server.config("3"));

    let err = admin.connect().unwrap_err();
    assert!(matches!(err, AdminError::AuthRequired));
    assert!(!admin.is_connected());

    assert!(server.received().is_empty());
}

#[test]
fn test_auth_success() {
    let server = FakeServer::start((107, CHALLENGE), &[(200, BANNER)]);
    let mut admin = AdminSession::new(server.config("4"));
    admin.set_secret("s3cret\n").unwrap();

    assert_eq!(admin.connect().unwrap(), BANNER);
    admin.close();

    let expected = format!(
        "auth {}",
        auth_token(b"ixslvvxrgkjptxmcgnnsdxsvdmvfympg", "s3cret\n")
    );
    assert_eq!(server.received(), vec![expected]);
}

#[test]
fn test_secret_from_config() {
    let server = FakeServer::start((107, CHALLENGE), &[(200, BANNER)]);
    let config = Config::builder()
        .port(server.port)
        .secret("s3cret\n")
        .build()
        .unwrap();
    let mut admin = AdminSession::new(config);

    assert!(admin.connect().is_ok());
    admin.close();
    assert_eq!(server.received().len(), 1);
}

#[test]
fn test_auth_rejected() {
    let server = FakeServer::start((107, CHALLENGE), &[(107, CHALLENGE)]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.set_secret("wrong").unwrap();

    let err = admin.connect().unwrap_err();
    assert!(matches!(err, AdminError::AuthFailed));
    assert_eq!(admin.state(), SessionState::Disconnected);

    assert_eq!(server.received().len(), 1);
}

#[test]
fn test_bad_banner_status() {
    let server = FakeServer::start((503, "Service unavailable"), &[]);
    let mut admin = AdminSession::new(server.config("3"));

    let err = admin.connect().unwrap_err();
    assert!(matches!(err, AdminError::BadResponse { status: 503, .. }));
    assert!(err.to_string().contains(&format!("127.0.0.1:{}", server.port)));
    assert!(!admin.is_connected());

    server.received();
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = Config::builder().port(port).build().unwrap();
    let mut admin = AdminSession::new(config);

    let err = admin.connect().unwrap_err();
    assert!(matches!(err, AdminError::Connection { port: p, .. } if p == port));
    assert_eq!(admin.state(), SessionState::Disconnected);
}

// =============================================================================
// Command Tests
// =============================================================================

#[test]
fn test_purge_expression() {
    let server = FakeServer::start((200, BANNER), &[(200, "")]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();

    admin.purge("req.http.host == example.com").unwrap();
    admin.close();

    assert_eq!(server.received(), vec!["ban req.http.host == example.com"]);
}

#[test]
fn test_purge_url_for_each_version() {
    let cases = [
        ("3", "ban.url http://x"),
        ("3.04", "ban.url http://x"),
        ("4", "ban req.url ~ http://x"),
        ("4.0.2", "ban req.url ~ http://x"),
    ];
    for (version, expected) in cases {
        let server = FakeServer::start((200, BANNER), &[(200, "")]);
        let mut admin = AdminSession::new(server.config(version));
        admin.connect().unwrap();

        admin.purge_url("http://x").unwrap();
        admin.close();

        assert_eq!(server.received(), vec![expected], "version {}", version);
    }
}

#[test]
fn test_command_error_status() {
    let server = FakeServer::start(
        (200, BANNER),
        &[(106, "Unknown request in ban.\nType 'help' for more info.\n")],
    );
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();

    let err = admin.purge("bogus").unwrap_err();
    assert_eq!(err.status_code(), Some(106));
    assert_eq!(
        err.to_string(),
        "ban bogus command responded 106:\n > Unknown request in ban.\n > Type 'help' for more info."
    );

    admin.close();
    server.received();
}

#[test]
fn test_command_timeout() {
    // No reply scripted for the command
    let server = FakeServer::start((200, BANNER), &[]);
    let config = Config::builder()
        .port(server.port)
        .timeout(Duration::from_millis(300))
        .build()
        .unwrap();
    let mut admin = AdminSession::new(config);
    admin.connect().unwrap();

    let err = admin.backend_list().unwrap_err();
    assert!(err.is_timeout(), "Expected timeout, got {:?}", err);
    assert!(err.to_string().contains(&format!("127.0.0.1:{}", server.port)));

    // A timeout is fatal for the connection
    assert!(!admin.is_connected());
    assert_eq!(admin.state(), SessionState::Disconnected);
    assert_eq!(server.received(), vec!["backend.list"]);
}

#[test]
fn test_late_reply_is_not_paired_with_next_command() {
    // The 200 for "ban a" arrives after the client gave up; the 106 would
    // answer "ban bogus"
    let server = FakeServer::start_slow(
        (200, BANNER),
        &[(200, ""), (106, "Syntax error")],
        Duration::from_millis(500),
    );
    let config = Config::builder()
        .port(server.port)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let mut admin = AdminSession::new(config);
    admin.connect().unwrap();

    assert!(admin.purge("a").unwrap_err().is_timeout());

    let second = admin.purge("bogus");
    assert!(
        matches!(second, Err(AdminError::NotConnected)),
        "Expected NotConnected, got {:?}",
        second
    );

    assert_eq!(server.received(), vec!["ban a"]);
}

#[test]
fn test_status_timeout_does_not_leak_into_start() {
    let server = FakeServer::start_slow(
        (200, BANNER),
        &[(200, "Child in state running")],
        Duration::from_millis(500),
    );
    let config = Config::builder()
        .port(server.port)
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    let mut admin = AdminSession::new(config);
    admin.connect().unwrap();

    // status() reads the timeout as "not running"; start must then fail
    // instead of reading the stale status reply
    assert!(matches!(admin.start().unwrap_err(), AdminError::NotConnected));
    assert_eq!(server.received(), vec!["status"]);
}

#[test]
fn test_raw_command_with_expected_status() {
    let server = FakeServer::start((200, BANNER), &[(200, "PONG 1700000000 1.0")]);
    let mut admin = AdminSession::new(server.config("4"));
    admin.connect().unwrap();

    assert_eq!(admin.command("ping", 200).unwrap(), "PONG 1700000000 1.0");
    admin.close();
    assert_eq!(server.received(), vec!["ping"]);
}

// =============================================================================
// Status / Start / Stop Tests
// =============================================================================

#[test]
fn test_status_truth_table() {
    let cases = [
        ((200, "Child in state running"), true),
        ((200, "Child in state stopped"), false),
        ((200, "Child in state starting"), false),
        ((200, "unexpected body"), false),
        ((300, "Child in state running"), false),
    ];
    for ((code, body), expected) in cases {
        let server = FakeServer::start((200, BANNER), &[(code, body)]);
        let mut admin = AdminSession::new(server.config("3"));
        admin.connect().unwrap();

        assert_eq!(admin.status(), expected, "body {:?} code {}", body, code);
        admin.close();
        server.received();
    }
}

#[test]
fn test_start_when_running_is_noop() {
    let server = FakeServer::start((200, BANNER), &[(200, "Child in state running")]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();

    assert!(admin.start().unwrap());
    admin.close();
    assert_eq!(server.received(), vec!["status"]);
}

#[test]
fn test_stop_when_stopped_is_noop() {
    let server = FakeServer::start((200, BANNER), &[(200, "Child in state stopped")]);
    let mut admin = AdminSession::new(server.config("4"));
    admin.connect().unwrap();

    assert!(admin.stop().unwrap());
    admin.close();
    assert_eq!(server.received(), vec!["status"]);
}

#[test]
fn test_stop_when_running() {
    let server = FakeServer::start(
        (200, BANNER),
        &[(200, "Child in state running"), (200, "")],
    );
    let mut admin = AdminSession::new(server.config("4"));
    admin.connect().unwrap();

    assert!(admin.stop().unwrap());
    admin.close();
    assert_eq!(server.received(), vec!["status", "stop"]);
}

// =============================================================================
// Quit / Close Tests
// =============================================================================

#[test]
fn test_quit_releases_transport() {
    let server = FakeServer::start((200, BANNER), &[(500, "Closing CLI connection")]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();

    admin.quit();
    assert!(!admin.is_connected());
    assert_eq!(admin.state(), SessionState::Closed);

    // Second close is a no-op
    admin.close();
    assert_eq!(server.received(), vec!["quit"]);
}

#[test]
fn test_quit_with_unexpected_status_still_closes() {
    let server = FakeServer::start((200, BANNER), &[(200, "")]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();

    admin.quit();
    assert!(!admin.is_connected());
    assert_eq!(server.received(), vec!["quit"]);
}

#[test]
fn test_commands_after_close_fail_without_io() {
    let server = FakeServer::start((200, BANNER), &[]);
    let mut admin = AdminSession::new(server.config("3"));
    admin.connect().unwrap();
    admin.close();

    assert!(matches!(admin.purge("x").unwrap_err(), AdminError::NotConnected));
    assert!(server.received().is_empty());
}
