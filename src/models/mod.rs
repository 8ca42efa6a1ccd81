use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub mod de;

pub const NO_SUBJECT: &str = "(No Subject)";

/// Account role as issued by the backend
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    ClientAdmin,
    Auditor,
    #[serde(other)]
    Unknown,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super_admin",
            Role::ClientAdmin => "client_admin",
            Role::Auditor => "auditor",
            Role::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "super_admin" => Ok(Role::SuperAdmin),
            "client_admin" => Ok(Role::ClientAdmin),
            "auditor" => Ok(Role::Auditor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// Authenticated user as returned by login and the users endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub org_id: Option<i64>,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Result of `POST /auth/login`
#[derive(Debug, Clone, PartialEq)]
pub struct LoginOutcome {
    pub access_token: Option<String>,
    pub user: User,
}

impl<'de> Deserialize<'de> for LoginOutcome {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Database users come back wrapped with a token, the bootstrap admin as a flat user.
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum LoginBody {
            Token { access_token: String, user: User },
            Flat(User),
        }

        Ok(match LoginBody::deserialize(deserializer)? {
            LoginBody::Token { access_token, user } => LoginOutcome {
                access_token: Some(access_token),
                user,
            },
            LoginBody::Flat(user) => LoginOutcome {
                access_token: None,
                user,
            },
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Tenant account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewOrganization {
    pub name: String,
    pub slug: String,
    pub domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
    pub org_id: i64,
    pub domains: Vec<String>,
}

/// Sidecar ingestion agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agent {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub org_id: Option<i64>,
    pub status: String,
    #[serde(default)]
    pub last_seen: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OrgAnalytics {
    #[serde(default)]
    pub total_messages: u64,
    #[serde(default)]
    pub active_holds: u64,
    #[serde(default)]
    pub held_items: u64,
    #[serde(default)]
    pub storage_volume_bytes: u64,
    #[serde(default)]
    pub hold_ratio: f64,
}

/// Dashboard counters. Client admins get the org fields, super admins the global ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdminStats {
    #[serde(default)]
    pub total_emails: Option<u64>,
    #[serde(default)]
    pub active_auditors: Option<u64>,
    #[serde(default)]
    pub active_holds: Option<u64>,
    #[serde(default)]
    pub open_cases: Option<u64>,
    #[serde(default)]
    pub storage_used: Option<String>,
    #[serde(default)]
    pub total_organizations: Option<u64>,
    #[serde(default)]
    pub online_agents: Option<u64>,
    #[serde(default)]
    pub total_users: Option<u64>,
}

// --- Cases ---

pub const CASE_STATUS_OPEN: &str = "OPEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Case {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub item_count: u64,
}

impl Case {
    pub fn is_open(&self) -> bool {
        self.status == CASE_STATUS_OPEN
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    Pending,
    InReview,
    Completed,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "PENDING",
            ReviewStatus::InReview => "IN_REVIEW",
            ReviewStatus::Completed => "COMPLETED",
        }
    }

    /// Next status in the review cycle
    pub fn cycle(&self) -> Self {
        match self {
            ReviewStatus::Pending => ReviewStatus::InReview,
            ReviewStatus::InReview => ReviewStatus::Completed,
            ReviewStatus::Completed => ReviewStatus::Pending,
        }
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "PENDING" => Ok(ReviewStatus::Pending),
            "IN_REVIEW" => Ok(ReviewStatus::InReview),
            "COMPLETED" => Ok(ReviewStatus::Completed),
            other => Err(format!("unknown review status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseItem {
    pub id: i64,
    pub message_id: String,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub added_by: Option<String>,
    #[serde(default, deserialize_with = "de::tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub assignee_name: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub review_status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDetail {
    pub case: Case,
    #[serde(default)]
    pub items: Vec<CaseItem>,
}

impl CaseDetail {
    /// Reflect a successful batch assignment locally
    pub fn apply_assignment(&mut self, item_ids: &[i64], assignee_id: i64, assignee_name: Option<&str>) {
        for item in self.items.iter_mut().filter(|i| item_ids.contains(&i.id)) {
            item.assignee_id = Some(assignee_id);
            item.assignee_name = assignee_name.map(str::to_string);
        }
    }

    /// Tags an item would carry after appending `tag`, or `None` when there is nothing to add
    pub fn tags_with(&self, item_id: i64, tag: &str) -> Option<Vec<String>> {
        let tag = tag.trim();
        if tag.is_empty() {
            return None;
        }
        let item = self.items.iter().find(|i| i.id == item_id)?;
        let mut tags = item.tags.clone();
        tags.push(tag.to_string());
        Some(tags)
    }

    pub fn set_tags(&mut self, item_id: i64, tags: Vec<String>) {
        if let Some(item) = self.items.iter_mut().find(|i| i.id == item_id) {
            item.tags = tags;
        }
    }

    pub fn remove_item(&mut self, item_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != before
    }
}

/// Item in an auditor's review queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Assignment {
    pub id: i64,
    pub message_id: String,
    #[serde(default)]
    pub case_id: Option<i64>,
    #[serde(default)]
    pub case_name: String,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub review_status: ReviewStatus,
    #[serde(default, deserialize_with = "de::tags")]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewStats {
    pub total: usize,
    pub completed: usize,
    pub pending: usize,
    pub in_review: usize,
}

impl ReviewStats {
    pub fn from_assignments(assignments: &[Assignment]) -> Self {
        let count = |status: ReviewStatus| assignments.iter().filter(|a| a.review_status == status).count();
        Self {
            total: assignments.len(),
            completed: count(ReviewStatus::Completed),
            pending: count(ReviewStatus::Pending),
            in_review: count(ReviewStatus::InReview),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewCase {
    pub name: String,
    pub description: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddItemsRequest<'a> {
    pub case_id: i64,
    pub message_ids: &'a [String],
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchAssignRequest<'a> {
    pub item_ids: &'a [i64],
    pub assignee_id: i64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Native,
    Pdf,
    Mbox,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Native, ExportFormat::Pdf, ExportFormat::Mbox];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Native => "native",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Mbox => "mbox",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown export format '{}' (native, pdf, mbox)", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Default)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub redact: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportTicket {
    pub download_url: String,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// --- Legal holds ---

/// Free-form hold criteria, e.g. `{"from": "x@corp.com"}`
pub type HoldCriteria = BTreeMap<String, Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LegalHold {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default, deserialize_with = "de::criteria")]
    pub filter_criteria: HoldCriteria,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "de::default_true")]
    pub active: bool,
    #[serde(default)]
    pub item_count: u64,
}

impl LegalHold {
    pub fn criteria_summary(&self) -> String {
        if self.filter_criteria.is_empty() {
            return "manual".to_string();
        }
        self.filter_criteria
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldItem {
    pub message_id: String,
    #[serde(default)]
    pub added_at: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub date: Option<MessageDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HoldDetail {
    pub hold: LegalHold,
    #[serde(default)]
    pub items: Vec<HoldItem>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewHold {
    pub name: String,
    pub reason: String,
    pub filter_criteria: HoldCriteria,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplyHoldRequest<'a> {
    pub hold_id: &'a str,
    pub message_ids: &'a [String],
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HoldCreated {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub auto_held_count: u64,
}

// --- Audit log ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogEntry {
    pub id: i64,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub username: String,
    pub action: String,
    #[serde(default)]
    pub details: Value,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditLogCreate {
    pub username: String,
    pub action: String,
    pub details: Value,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuditReceipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// Hash-chain verdict from `/audit-logs/verify`
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ChainVerification {
    pub valid: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub log_count: Option<u64>,
    #[serde(default)]
    pub head_hash: Option<String>,
}

// --- Retention ---

pub const RETENTION_PERMANENT_DELETE: &str = "PERMANENT_DELETE";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetentionPolicy {
    pub id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "de::tags")]
    pub domains: Vec<String>,
    pub retention_days: i64,
    #[serde(default = "de::default_retention_action")]
    pub action: String,
    #[serde(default = "de::default_true")]
    pub active: bool,
    #[serde(default)]
    pub org_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewRetentionPolicy {
    pub name: String,
    pub domains: Vec<String>,
    pub retention_days: i64,
    pub action: String,
}

impl Default for NewRetentionPolicy {
    fn default() -> Self {
        Self {
            name: String::new(),
            domains: Vec::new(),
            retention_days: 365,
            action: RETENTION_PERMANENT_DELETE.to_string(),
        }
    }
}

/// Generic `{status, id?, count?}` acknowledgement
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Receipt {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub count: Option<u64>,
}

// --- Messages ---

/// Message dates are indexed as epoch seconds but older documents carry text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MessageDate {
    Epoch(i64),
    Text(String),
}

impl MessageDate {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            MessageDate::Epoch(secs) => DateTime::from_timestamp(*secs, 0),
            MessageDate::Text(text) => DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|d| d.with_timezone(&Utc)),
        }
    }
}

impl fmt::Display for MessageDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.to_datetime(), self) {
            (Some(dt), _) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            (None, MessageDate::Text(text)) => f.write_str(text),
            (None, MessageDate::Epoch(secs)) => write!(f, "{}", secs),
        }
    }
}

/// Search hit, also used for thread entries
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageHit {
    #[serde(deserialize_with = "de::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "de::text_or_list")]
    pub subject: String,
    #[serde(default, deserialize_with = "de::text_or_list")]
    pub from: String,
    #[serde(default, deserialize_with = "de::text_or_list")]
    pub to: String,
    #[serde(default)]
    pub date: Option<MessageDate>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub has_attachments: bool,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub is_spam: bool,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub is_on_hold: bool,
    #[serde(default)]
    pub sender_email_clean: Option<String>,
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub recipient_emails_clean: Vec<String>,
}

impl MessageHit {
    /// Subject for display, with a placeholder for mail that has none
    pub fn subject_label(&self) -> &str {
        if self.subject.trim().is_empty() {
            NO_SUBJECT
        } else {
            &self.subject
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchResults {
    #[serde(default, deserialize_with = "de::null_as_default")]
    pub hits: Vec<MessageHit>,
    #[serde(rename = "estimatedTotalHits", default, deserialize_with = "de::null_as_default")]
    pub estimated_total_hits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Attachment {
    pub filename: String,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub content_b64: Option<String>,
}

/// Full message as returned by `GET /messages/{id}`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageContent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_html: Option<String>,
    #[serde(default)]
    pub content_b64: Option<String>,
    #[serde(default)]
    pub raw_eml: Option<String>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PiiEntity {
    pub label: String,
    #[serde(default)]
    pub start: Option<usize>,
    #[serde(default)]
    pub end: Option<usize>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RedactedPreview {
    #[serde(default)]
    pub redacted: Option<String>,
    #[serde(default)]
    pub entities: Vec<PiiEntity>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PiiScan {
    #[serde(default)]
    pub pii_detected: bool,
    #[serde(default)]
    pub entities: Vec<PiiEntity>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityStatus {
    Valid,
    Tampered,
    Error,
    #[default]
    #[serde(other)]
    Unavailable,
}

impl fmt::Display for IntegrityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IntegrityStatus::Valid => "VALID",
            IntegrityStatus::Tampered => "TAMPERED",
            IntegrityStatus::Error => "ERROR",
            IntegrityStatus::Unavailable => "UNAVAILABLE",
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct IntegrityReport {
    #[serde(default)]
    pub status: IntegrityStatus,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub stored_signature: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
}

/// Configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_path: String,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub audit_log_limit: u32,
    pub log_level: String,
    pub log_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        let api_url = std::env::var("OPENARCHIVE_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000".to_string());
        url::Url::parse(&api_url)
            .map_err(|e| anyhow::anyhow!("OPENARCHIVE_API_URL is not a valid URL ({}): {}", api_url, e))?;

        Ok(Config {
            api_url,
            session_path: std::env::var("OPENARCHIVE_SESSION_PATH")
                .unwrap_or_else(|_| "openarchive_session.json".to_string()),
            request_timeout_secs: std::env::var("OPENARCHIVE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),
            page_size: std::env::var("OPENARCHIVE_PAGE_SIZE")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .ok()
                .filter(|n| *n > 0)
                .unwrap_or(20),
            audit_log_limit: std::env::var("OPENARCHIVE_AUDIT_LOG_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse()
                .unwrap_or(50),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_file: std::env::var("OPENARCHIVE_LOG_FILE").ok().filter(|p| !p.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_login_outcome_with_token() {
        let body = json!({
            "access_token": "abc",
            "token_type": "bearer",
            "user": {"id": 7, "username": "ann", "role": "auditor", "org_id": 3, "domains": ["corp.com"]}
        });
        let outcome: LoginOutcome = serde_json::from_value(body).unwrap();
        assert_eq!(outcome.access_token.as_deref(), Some("abc"));
        assert_eq!(outcome.user.role, Role::Auditor);
        assert_eq!(outcome.user.domains, vec!["corp.com".to_string()]);
    }

    #[test]
    fn test_login_outcome_flat_user() {
        let body = json!({"id": 1, "username": "admin", "role": "super_admin", "org_id": 1, "domains": []});
        let outcome: LoginOutcome = serde_json::from_value(body).unwrap();
        assert!(outcome.access_token.is_none());
        assert_eq!(outcome.user.role, Role::SuperAdmin);
    }

    #[test]
    fn test_legal_hold_accepts_string_criteria() {
        let body = json!({
            "id": "5b1c", "name": "Acme", "reason": "litigation",
            "filter_criteria": "{\"from\": \"cfo@acme.com\"}",
            "active": true, "item_count": 4
        });
        let hold: LegalHold = serde_json::from_value(body).unwrap();
        assert_eq!(hold.criteria_summary(), "from=cfo@acme.com");
        assert_eq!(hold.item_count, 4);
    }

    #[test]
    fn test_integrity_status_unknown_maps_to_unavailable() {
        let report: IntegrityReport = serde_json::from_value(json!({"status": "SOMETHING"})).unwrap();
        assert_eq!(report.status, IntegrityStatus::Unavailable);
        let report: IntegrityReport = serde_json::from_value(json!({"status": "TAMPERED"})).unwrap();
        assert_eq!(report.status, IntegrityStatus::Tampered);
    }

    #[test]
    fn test_message_date_display() {
        assert_eq!(MessageDate::Epoch(0).to_string(), "1970-01-01 00:00");
        assert_eq!(MessageDate::Text("yesterday".into()).to_string(), "yesterday");
    }

    #[test]
    fn test_case_detail_optimistic_updates() {
        let item = |id: i64| CaseItem {
            id,
            message_id: format!("m{}", id),
            added_at: None,
            added_by: None,
            tags: vec!["hot".into()],
            assignee_id: None,
            assignee_name: None,
            review_status: ReviewStatus::Pending,
        };
        let mut detail = CaseDetail {
            case: Case {
                id: 1,
                name: "c".into(),
                description: None,
                status: "OPEN".into(),
                created_at: None,
                item_count: 2,
            },
            items: vec![item(1), item(2)],
        };

        detail.apply_assignment(&[2], 9, Some("bob"));
        assert_eq!(detail.items[0].assignee_id, None);
        assert_eq!(detail.items[1].assignee_name.as_deref(), Some("bob"));

        assert_eq!(detail.tags_with(1, "  "), None);
        assert_eq!(detail.tags_with(1, "privileged"), Some(vec!["hot".into(), "privileged".into()]));

        assert!(detail.remove_item(1));
        assert!(!detail.remove_item(1));
        assert_eq!(detail.items.len(), 1);
    }

    #[test]
    fn test_review_status_parse_and_cycle() {
        assert_eq!("in-review".parse::<ReviewStatus>().unwrap(), ReviewStatus::InReview);
        assert_eq!(ReviewStatus::Completed.cycle(), ReviewStatus::Pending);
        assert!("done".parse::<ReviewStatus>().is_err());
    }
}
