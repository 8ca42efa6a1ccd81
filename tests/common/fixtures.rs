//! Sessions, configs and payloads shared by the test suites

use openarchive_console::models::{Config, MessageDate, MessageHit, Role, User};
use openarchive_console::session::Session;
use serde_json::{json, Value};

pub const TOKEN: &str = "test-token";
pub const ORG_ID: i64 = 3;

/// Configuration pointing at a mock server
pub fn config_for(api_url: &str) -> Config {
    Config {
        api_url: api_url.to_string(),
        session_path: "unused_session.json".to_string(),
        request_timeout_secs: 5,
        page_size: 20,
        audit_log_limit: 50,
        log_level: "debug".to_string(),
        log_file: None,
    }
}

pub fn user(role: Role) -> User {
    User {
        id: 7,
        username: "ann@corp.com".to_string(),
        role,
        org_id: match role {
            Role::SuperAdmin => None,
            _ => Some(ORG_ID),
        },
        domains: vec!["corp.com".to_string()],
    }
}

pub fn session(role: Role) -> Session {
    Session {
        access_token: Some(TOKEN.to_string()),
        user: user(role),
    }
}

pub fn hit(id: &str, subject: &str) -> MessageHit {
    MessageHit {
        id: id.to_string(),
        subject: subject.to_string(),
        from: "cfo@corp.com".to_string(),
        to: "board@corp.com".to_string(),
        date: Some(MessageDate::Epoch(1_700_000_000)),
        size: Some(4096),
        has_attachments: true,
        is_spam: false,
        is_on_hold: false,
        sender_email_clean: Some("cfo@corp.com".to_string()),
        recipient_emails_clean: vec!["board@corp.com".to_string()],
    }
}

/// Search response in the shape the search index returns
pub fn search_body(ids: &[&str]) -> Value {
    let hits: Vec<Value> = ids
        .iter()
        .map(|id| {
            json!({
                "id": id,
                "subject": format!("Subject {}", id),
                "from": "cfo@corp.com",
                "to": ["board@corp.com", "audit@corp.com"],
                "date": 1_700_000_000,
                "size": 1024,
                "has_attachments": false,
                "is_on_hold": false
            })
        })
        .collect();
    json!({ "hits": hits, "estimatedTotalHits": 45 })
}

pub fn case_detail_body() -> Value {
    json!({
        "case": {"id": 12, "name": "Acme v. Corp", "description": null, "status": "OPEN", "item_count": 2},
        "items": [
            {"id": 100, "message_id": "m1", "tags": "[\"hot\"]", "review_status": "PENDING"},
            {"id": 101, "message_id": "m2", "tags": null, "review_status": "IN_REVIEW"}
        ]
    })
}
