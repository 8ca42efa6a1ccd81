//! Multi-call workflows against a mock archive server

use chrono::NaiveDate;
use openarchive_console::models::{IntegrityStatus, Role};
use openarchive_console::search::SearchRequest;
use openarchive_console::selection::Selection;
use openarchive_console::workflows::{Workflows, AUTO_HOLD_REASON, NO_CONTENT};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{search_body, session};
use crate::common::logging::{init_test_logging, log_test_data, log_test_step};
use crate::common::server::{audit_entries, client, mount_audit_sink, requests_to};

fn selection(ids: &[&str]) -> Selection<String> {
    let mut selection = Selection::new();
    for id in ids {
        selection.toggle(id.to_string());
    }
    selection
}

#[tokio::test]
async fn test_apply_hold_creates_one_when_org_has_none() {
    init_test_logging();
    log_test_step("Bulk hold with no existing holds");

    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/holds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "h-new", "status": "created", "auto_held_count": 0})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds/apply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "applied", "count": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let flows = Workflows::new(&api, &session);
    let mut picked = selection(&["m2", "m1"]);

    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let applied = flows.apply_hold(&mut picked, today).await.unwrap().unwrap();
    log_test_data("Applied", &applied);
    assert_eq!(applied.hold_id, "h-new");
    assert!(applied.created);
    assert_eq!(applied.count, 2);
    assert!(picked.is_empty());

    let create_request = requests_to(&server, "/api/v1/admin/holds")
        .await
        .into_iter()
        .find(|r| r.method.to_string() == "POST")
        .unwrap();
    let created: Value = serde_json::from_slice(&create_request.body).unwrap();
    assert_eq!(created["name"], "Auto-Case-2024-05-01");
    assert_eq!(created["reason"], AUTO_HOLD_REASON);

    let entries = audit_entries(&server).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "APPLY_LEGAL_HOLD");
    assert_eq!(entries[0]["username"], "7");
    assert_eq!(entries[0]["details"], json!({"hold_id": "h-new", "count": 2}));
}

#[tokio::test]
async fn test_apply_hold_reuses_first_hold() {
    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/holds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 5, "name": "Existing", "active": true},
            {"id": 6, "name": "Older", "active": true}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds/apply"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "applied"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::ClientAdmin);
    let flows = Workflows::new(&api, &session);
    let mut picked = selection(&["m1"]);

    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let applied = flows.apply_hold(&mut picked, today).await.unwrap().unwrap();
    assert_eq!(applied.hold_id, "5");
    assert!(!applied.created);
}

#[tokio::test]
async fn test_failed_apply_keeps_selection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/holds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 5, "name": "Existing"}])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds/apply"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "db locked"})))
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let mut picked = selection(&["m1", "m2"]);
    let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

    let err = Workflows::new(&api, &session).apply_hold(&mut picked, today).await.unwrap_err();
    assert!(err.to_string().contains("db locked"));
    assert_eq!(picked.len(), 2);
    assert!(audit_entries(&server).await.is_empty());
}

#[tokio::test]
async fn test_message_panels_degrade_independently() {
    init_test_logging();
    log_test_step("Message with failing side panels");

    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages/m1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "m1", "content": "", "content_b64": "SGVsbG8gYXVkaXRvcg==", "attachments": []
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages/m1/thread"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages/m1/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "TAMPERED", "verified": false})))
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let view = Workflows::new(&api, &session).load_message("m1").await.unwrap();

    assert_eq!(view.body, "Hello auditor");
    assert!(view.thread.is_empty());
    assert!(view.headers.is_empty());
    assert!(view.pii.is_none());
    assert_eq!(view.integrity.status, IntegrityStatus::Tampered);

    let entries = audit_entries(&server).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "VIEW_MESSAGE");
    assert_eq!(entries[0]["details"]["message_id"], "m1");
}

#[tokio::test]
async fn test_missing_message_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Message not found"})))
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let err = Workflows::new(&api, &session).load_message("gone").await.unwrap_err();
    assert!(err.to_string().contains("Message not found"));
}

#[tokio::test]
async fn test_empty_message_shows_placeholder() {
    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages/m9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "m9"})))
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let view = Workflows::new(&api, &session).load_message("m9").await.unwrap();
    assert_eq!(view.body, NO_CONTENT);
}

#[tokio::test]
async fn test_only_narrowing_searches_are_audited() {
    let server = MockServer::start().await;
    mount_audit_sink(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["m1"])))
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let flows = Workflows::new(&api, &session);

    flows.search(&SearchRequest::new(3, "")).await.unwrap();
    assert!(audit_entries(&server).await.is_empty());

    flows.search(&SearchRequest::new(3, "merger")).await.unwrap();
    let entries = audit_entries(&server).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "SEARCH");
    assert_eq!(entries[0]["details"]["query"], "merger");
}

#[tokio::test]
async fn test_audit_outage_does_not_block_case_adds() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/audit-logs"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cases/12/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "added", "count": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let session = session(Role::Auditor);
    let mut picked = selection(&["m1", "m2"]);
    let added = Workflows::new(&api, &session).add_to_case(Some(12), &mut picked).await.unwrap();
    assert_eq!(added, 2);
    assert!(picked.is_empty());
}
