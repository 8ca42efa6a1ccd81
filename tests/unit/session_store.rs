//! Session file handling

use assert_matches::assert_matches;
use openarchive_console::models::{LoginOutcome, Role};
use openarchive_console::session::Session;
use tempfile::TempDir;
use test_log::test;

use crate::common::fixtures::user;

#[test]
fn test_session_from_flat_login_has_no_token() {
    let session = Session::from(LoginOutcome {
        access_token: None,
        user: user(Role::SuperAdmin),
    });
    assert!(session.access_token.is_none());
    assert_eq!(session.role(), Role::SuperAdmin);
    assert!(session.require_org().is_err());
}

#[test]
fn test_require_without_session_hints_login() {
    let dir = TempDir::new().unwrap();
    let err = Session::require(dir.path().join("none.json")).unwrap_err();
    assert!(err.to_string().contains("openarchive login"));
}

#[test]
fn test_corrupt_session_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{not json").unwrap();

    let err = Session::load(&path).unwrap_err();
    assert!(err.to_string().contains("corrupt"));
}

#[test]
fn test_saved_session_round_trips_token() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    let session = Session::from(LoginOutcome {
        access_token: Some("abc".into()),
        user: user(Role::Auditor),
    });
    session.save(&path).unwrap();

    let loaded = Session::load(&path).unwrap();
    assert_matches!(loaded, Some(Session { access_token: Some(ref token), .. }) if token == "abc");
}
