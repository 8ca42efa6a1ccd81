//! The command line driven end to end against a mock archive server

use clap::Parser;
use openarchive_console::cli::{run, Cli};
use openarchive_console::models::Role;
use openarchive_console::session::Session;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{config_for, search_body, session};
use crate::common::logging::{init_test_logging, log_test_step};
use crate::common::server::{audit_entries, mount_audit_sink};

async fn run_cli(server: &MockServer, session_path: &Path, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["openarchive", "--session", session_path.to_str().unwrap(), "--yes"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv)?;
    run(cli, config_for(&server.uri())).await
}

fn logged_in(dir: &TempDir, role: Role) -> std::path::PathBuf {
    let path = dir.path().join("session.json");
    session(role).save(&path).unwrap();
    path
}

#[tokio::test]
async fn test_login_stores_session_and_logout_clears_it() {
    init_test_logging();
    log_test_step("openarchive login / logout");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt",
            "user": {"id": 7, "username": "ann@corp.com", "role": "client_admin", "org_id": 3, "domains": []}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = dir.path().join("session.json");
    run_cli(&server, &session_path, &["login", "-u", "ann@corp.com", "-p", "pw"]).await.unwrap();

    let stored = Session::require(&session_path).unwrap();
    assert_eq!(stored.access_token.as_deref(), Some("jwt"));
    assert_eq!(stored.role(), Role::ClientAdmin);

    run_cli(&server, &session_path, &["logout"]).await.unwrap();
    assert!(!session_path.exists());
}

#[tokio::test]
async fn test_commands_require_login() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let err = run_cli(&server, &dir.path().join("none.json"), &["cases", "list"]).await.unwrap_err();
    assert!(err.to_string().contains("Not logged in"));
}

#[tokio::test]
async fn test_api_url_flag_overrides_config() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from(["openarchive", "--api-url", server.uri().as_str(), "health"]).unwrap();
    run(cli, config_for("http://127.0.0.1:9")).await.unwrap();
}

#[tokio::test]
async fn test_case_delete_with_yes_skips_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/cases/12"))
        .and(query_param("org_id", "3"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "deleted"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::ClientAdmin);
    run_cli(&server, &session_path, &["cases", "delete", "12"]).await.unwrap();
}

#[tokio::test]
async fn test_search_export_writes_csv_and_audits() {
    init_test_logging();
    log_test_step("openarchive search --export");

    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages"))
        .and(query_param("q", "invoice"))
        .and(query_param("user_domain", "corp.com"))
        .and(query_param("has_attachments", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["m1", "m2", "m3"])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::Auditor);
    let csv_path = dir.path().join("out.csv");
    run_cli(
        &server,
        &session_path,
        &["search", "invoice", "--has-attachments", "--export", csv_path.to_str().unwrap()],
    )
    .await
    .unwrap();

    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.contains("\"board@corp.com, audit@corp.com\""));

    let actions: Vec<String> = audit_entries(&server)
        .await
        .iter()
        .map(|e| e["action"].as_str().unwrap_or_default().to_string())
        .collect();
    assert_eq!(actions, vec!["SEARCH".to_string(), "EXPORT_CSV".to_string()]);
}

#[tokio::test]
async fn test_case_tag_appends_to_existing_tags() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cases/12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(crate::common::fixtures::case_detail_body()))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/cases/items/100/tags"))
        .and(wiremock::matchers::body_json(json!({"tags": ["hot", "privileged"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "updated"})))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::Auditor);
    run_cli(&server, &session_path, &["cases", "tag", "12", "100", "privileged"]).await.unwrap();

    let err = run_cli(&server, &session_path, &["cases", "tag", "12", "999", "privileged"]).await.unwrap_err();
    assert!(err.to_string().contains("Nothing to tag"));
}

#[tokio::test]
async fn test_retention_create_rejects_non_positive_days() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::ClientAdmin);

    let err = run_cli(&server, &session_path, &["retention", "create", "Never", "--days", "0"])
        .await
        .unwrap_err();
    assert!(err.to_string().contains("positive"));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_broken_audit_chain_fails_the_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/audit-logs/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"valid": false, "error": "hash mismatch at 41"})))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::ClientAdmin);
    let err = run_cli(&server, &session_path, &["audit", "verify"]).await.unwrap_err();
    assert!(err.to_string().contains("hash mismatch at 41"));
}

#[tokio::test]
async fn test_org_create_derives_slug() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/organizations"))
        .and(wiremock::matchers::body_json(json!({
            "name": "Acme Holdings, Inc.", "slug": "acme-holdings-inc", "domains": ["acme.com", "acme.io"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "name": "Acme Holdings, Inc.", "slug": "acme-holdings-inc", "domains": ["acme.com", "acme.io"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let session_path = logged_in(&dir, Role::SuperAdmin);
    run_cli(
        &server,
        &session_path,
        &["orgs", "create", "Acme Holdings, Inc.", "--domains", "acme.com, acme.io"],
    )
    .await
    .unwrap();
}
