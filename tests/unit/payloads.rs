//! Decoding backend payloads with their historical quirks

use openarchive_console::models::{
    AdminStats, AuditLogEntry, Case, CaseDetail, LegalHold, MessageHit, ReviewStatus, RetentionPolicy, SearchResults,
    NO_SUBJECT, RETENTION_PERMANENT_DELETE,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use test_log::test;

use crate::common::fixtures::{case_detail_body, search_body};

#[test]
fn test_search_results_join_recipient_lists() {
    let results: SearchResults = serde_json::from_value(search_body(&["a1", "a2"])).unwrap();
    assert_eq!(results.estimated_total_hits, 45);
    assert_eq!(results.hits.len(), 2);
    assert_eq!(results.hits[0].to, "board@corp.com, audit@corp.com");
    assert_eq!(results.hits[1].subject, "Subject a2");
}

#[test]
fn test_search_hit_with_null_subject_and_recipients() {
    let results: SearchResults = serde_json::from_value(json!({
        "hits": [
            {"id": "m1", "subject": null, "from": "a@x.com", "to": null, "date": null, "size": null,
             "has_attachments": null, "is_spam": null, "is_on_hold": null, "recipient_emails_clean": null},
            {"id": "m2", "subject": "Quarterly numbers", "from": ["b@y.com", null], "to": []}
        ],
        "estimatedTotalHits": 2
    }))
    .unwrap();

    assert_eq!(results.hits.len(), 2);
    let bare = &results.hits[0];
    assert_eq!(bare.subject, "");
    assert_eq!(bare.subject_label(), NO_SUBJECT);
    assert_eq!(bare.from, "a@x.com");
    assert!(bare.to.is_empty());
    assert_eq!(bare.date, None);
    assert!(!bare.has_attachments);
    assert!(bare.recipient_emails_clean.is_empty());
    assert_eq!(results.hits[1].subject_label(), "Quarterly numbers");
    assert_eq!(results.hits[1].from, "b@y.com");
}

#[test]
fn test_search_hit_with_only_an_id() {
    let hit: MessageHit = serde_json::from_value(json!({"id": 77})).unwrap();
    assert_eq!(hit.id, "77");
    assert_eq!(hit.subject_label(), NO_SUBJECT);
    assert!(hit.from.is_empty());
    assert_eq!(hit.size, None);

    let results: SearchResults = serde_json::from_value(json!({"hits": null, "estimatedTotalHits": null})).unwrap();
    assert!(results.hits.is_empty());
    assert_eq!(results.estimated_total_hits, 0);
}

#[test]
fn test_case_with_null_and_missing_fields() {
    let case: Case = serde_json::from_value(json!({"id": 4, "name": "Draft", "status": null, "item_count": null})).unwrap();
    assert_eq!(case.status, "");
    assert!(!case.is_open());
    assert_eq!(case.item_count, 0);

    let case: Case = serde_json::from_value(json!({"id": 5, "name": "Bare"})).unwrap();
    assert_eq!(case.description, None);
    assert_eq!(case.created_at, None);

    let detail: CaseDetail = serde_json::from_value(json!({
        "case": {"id": 6, "name": "Review"},
        "items": [{"id": 1, "message_id": "m9", "review_status": null}]
    }))
    .unwrap();
    assert_eq!(detail.items[0].review_status, ReviewStatus::Pending);
    assert!(detail.items[0].tags.is_empty());
}

#[test]
fn test_audit_entry_with_null_and_missing_fields() {
    let entry: AuditLogEntry = serde_json::from_value(json!({
        "id": 8, "username": null, "action": "SEARCH", "details": null, "timestamp": null
    }))
    .unwrap();
    assert_eq!(entry.username, "");
    assert_eq!(entry.timestamp, "");
    assert!(entry.details.is_null());

    let entry: AuditLogEntry = serde_json::from_value(json!({"id": 9, "action": "LOGIN"})).unwrap();
    assert_eq!(entry.action, "LOGIN");
    assert!(entry.username.is_empty());
}

#[test]
fn test_case_detail_tags_from_text_and_null() {
    let detail: CaseDetail = serde_json::from_value(case_detail_body()).unwrap();
    assert!(detail.case.is_open());
    assert_eq!(detail.items[0].tags, vec!["hot".to_string()]);
    assert!(detail.items[1].tags.is_empty());
    assert_eq!(detail.items[1].review_status, ReviewStatus::InReview);
}

#[test]
fn test_hold_with_numeric_id_and_no_criteria() {
    let hold: LegalHold = serde_json::from_value(json!({"id": 9, "name": "Manual"})).unwrap();
    assert_eq!(hold.id, "9");
    assert!(hold.active);
    assert_eq!(hold.criteria_summary(), "manual");
}

#[test]
fn test_retention_policy_defaults() {
    let policy: RetentionPolicy = serde_json::from_value(json!({
        "id": 1, "name": "Seven years", "domains": "[\"corp.com\"]", "retention_days": 2555
    }))
    .unwrap();
    assert_eq!(policy.domains, vec!["corp.com".to_string()]);
    assert_eq!(policy.action, RETENTION_PERMANENT_DELETE);
}

#[test]
fn test_admin_stats_partial_payload() {
    let stats: AdminStats = serde_json::from_value(json!({"total_organizations": 4, "online_agents": 2})).unwrap();
    assert_eq!(stats.total_organizations, Some(4));
    assert_eq!(stats.open_cases, None);
}
