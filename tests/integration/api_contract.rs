//! ArchiveClient against a mock archive server

use assert_matches::assert_matches;
use openarchive_console::api::{ApiError, ArchiveApi, ArchiveClient};
use openarchive_console::models::{ExportFormat, ExportRequest, NewRetentionPolicy, ReviewStatus, Role};
use openarchive_console::search::{Direction, Pager, SearchFilters, SearchRequest};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::fixtures::{case_detail_body, config_for, search_body, ORG_ID};
use crate::common::logging::{init_test_logging, log_test_data, log_test_step};
use crate::common::server::{client, requests_to};

#[tokio::test]
async fn test_login_with_token_and_flat_user() {
    init_test_logging();
    log_test_step("Login responses with and without a token");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"username": "ann@corp.com", "password": "pw"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "user": {"id": 7, "username": "ann@corp.com", "role": "auditor", "org_id": 3, "domains": ["corp.com"]}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .and(body_json(json!({"username": "admin", "password": "root"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "username": "admin", "role": "super_admin", "org_id": null, "domains": []
        })))
        .mount(&server)
        .await;

    let anonymous = ArchiveClient::new(&config_for(&server.uri())).unwrap();
    let auditor = anonymous.login("ann@corp.com", "pw").await.unwrap();
    assert_eq!(auditor.access_token.as_deref(), Some("jwt"));
    assert_eq!(auditor.user.role, Role::Auditor);

    let root = anonymous.login("admin", "root").await.unwrap();
    assert!(root.access_token.is_none());
    assert_eq!(root.user.role, Role::SuperAdmin);
}

#[tokio::test]
async fn test_bad_credentials_map_to_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid credentials"})))
        .mount(&server)
        .await;

    let err = client(&server).login("ann", "wrong").await.unwrap_err();
    assert_matches!(err, ApiError::Unauthorized);
}

#[tokio::test]
async fn test_requests_carry_bearer_token_and_org() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/cases/12"))
        .and(query_param("org_id", "3"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(case_detail_body()))
        .expect(1)
        .mount(&server)
        .await;

    let detail = client(&server).get_case(ORG_ID, 12).await.unwrap();
    log_test_data("Case detail", &detail);
    assert_eq!(detail.case.name, "Acme v. Corp");
    assert_eq!(detail.items.len(), 2);
}

#[tokio::test]
async fn test_search_sends_filters_as_query() {
    init_test_logging();
    log_test_step("Search query string");

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/messages"))
        .and(query_param("q", "invoice"))
        .and(query_param("org_id", "3"))
        .and(query_param("user_domain", "corp.com"))
        .and(query_param("from_addr", "cfo@corp.com"))
        .and(query_param("direction", "received"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(search_body(&["m1", "m2"])))
        .expect(1)
        .mount(&server)
        .await;

    let mut pager = Pager::new(20);
    pager.page = 2;
    let request = SearchRequest::new(ORG_ID, "invoice")
        .with_user_domain(Some("corp.com".into()))
        .with_filters(SearchFilters {
            from: "cfo@corp.com".into(),
            direction: Some(Direction::Received),
            ..SearchFilters::default()
        })
        .with_page(&pager);

    let results = client(&server).search_messages(&request).await.unwrap();
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.estimated_total_hits, 45);
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/admin/users/5"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Cannot delete yourself"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/holds"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad gateway"))
        .mount(&server)
        .await;

    let api = client(&server);
    let err = api.delete_user(5).await.unwrap_err();
    assert_matches!(err, ApiError::Forbidden { ref detail } if detail == "Cannot delete yourself");

    let err = api.list_holds(ORG_ID).await.unwrap_err();
    assert_matches!(err, ApiError::Server { status: 502, ref detail } if detail == "Bad gateway");
}

#[tokio::test]
async fn test_agents_fall_back_to_system_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/agents"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/admin/system/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "mx-sidecar", "hostname": "mx1", "status": "online", "last_seen": "2024-05-01T10:00:00"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let agents = client(&server).list_agents().await.unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0].hostname.as_deref(), Some("mx1"));
}

#[tokio::test]
async fn test_hold_ids_are_sent_as_strings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds/apply"))
        .and(query_param("org_id", "3"))
        .and(body_json(json!({"hold_id": "42", "message_ids": ["m1", "m2"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "applied", "count": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/holds/42/release"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "released"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let receipt = api.apply_hold(ORG_ID, "42", &["m1".into(), "m2".into()]).await.unwrap();
    assert_eq!(receipt.count, Some(2));
    api.release_hold(ORG_ID, "42").await.unwrap();
}

#[tokio::test]
async fn test_case_item_updates() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/cases/items/100/status"))
        .and(body_json(json!({"status": "IN_REVIEW"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "updated"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/cases/items/100/tags"))
        .and(body_json(json!({"tags": ["hot", "privileged"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "updated"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cases/items/batch-assign"))
        .and(body_json(json!({"item_ids": [100, 101], "assignee_id": 9})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "assigned", "count": 2})))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    api.update_item_status(100, ReviewStatus::InReview).await.unwrap();
    api.update_item_tags(100, &["hot".into(), "privileged".into()]).await.unwrap();
    api.batch_assign(ORG_ID, &[100, 101], 9).await.unwrap();
}

#[tokio::test]
async fn test_export_ticket_and_relative_download() {
    init_test_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/cases/12/export"))
        .and(body_json(json!({"format": "pdf", "redact": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "download_url": "/exports/case_12.pdf", "job_id": "j1", "status": "ready"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/exports/case_12.pdf"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let ticket = api
        .export_case(ORG_ID, 12, &ExportRequest { format: ExportFormat::Pdf, redact: true })
        .await
        .unwrap();
    let bytes = api.download(&ticket.download_url).await.unwrap();
    assert_eq!(bytes, b"%PDF-1.7".to_vec());
}

#[tokio::test]
async fn test_super_admin_scope_omits_org() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/admin/retention"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "created", "id": 4})))
        .mount(&server)
        .await;

    let policy = NewRetentionPolicy {
        name: "Seven years".into(),
        retention_days: 2555,
        ..NewRetentionPolicy::default()
    };
    let api = client(&server);
    api.create_retention(None, &policy).await.unwrap();
    api.create_retention(Some(ORG_ID), &policy).await.unwrap();

    let requests = requests_to(&server, "/api/v1/admin/retention").await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].url.query(), None);
    assert_eq!(requests[1].url.query(), Some("org_id=3"));

    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["action"], "PERMANENT_DELETE");
    assert_eq!(body["domains"], json!([]));
}

#[tokio::test]
async fn test_health_lives_outside_api_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let status = client(&server).health().await.unwrap();
    assert_eq!(status.status, "ok");
}
