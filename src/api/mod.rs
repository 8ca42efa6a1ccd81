use async_trait::async_trait;

use crate::models::{
    AdminStats, Agent, Assignment, AuditLogCreate, AuditLogEntry, AuditReceipt, Case, CaseDetail,
    ChainVerification, ExportRequest, ExportTicket, HeaderField, HealthStatus, HoldCreated,
    HoldDetail, IntegrityReport, LegalHold, LoginOutcome, MessageContent, MessageHit, NewCase,
    NewHold, NewOrganization, NewRetentionPolicy, NewUser, OrgAnalytics, Organization, PiiScan,
    Receipt, RedactedPreview, RetentionPolicy, ReviewStatus, SearchResults, User,
};
use crate::search::SearchRequest;

pub mod archive_client;
pub use archive_client::ArchiveClient;

/// Typed failure of a call against the archive API
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("forbidden: {detail}")]
    Forbidden { detail: String },
    #[error("not found: {detail}")]
    NotFound { detail: String },
    #[error("request rejected ({status}): {detail}")]
    Rejected { status: u16, detail: String },
    #[error("server error ({status}): {detail}")]
    Server { status: u16, detail: String },
    #[error("unable to build request: {details}")]
    RequestBuild { details: String },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Map a non-success status and its body to an error
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = extract_detail(body);
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden { detail },
            404 => ApiError::NotFound { detail },
            400..=499 => ApiError::Rejected { status, detail },
            _ => ApiError::Server { status, detail },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

/// FastAPI reports failures as `{"detail": "..."}`; fall back to the raw body
fn extract_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| match v.get("detail") {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
            None => None,
        })
        .unwrap_or_else(|| body.trim().to_string())
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Every endpoint the dashboard consumes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ArchiveApi: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> ApiResult<LoginOutcome>;
    async fn health(&self) -> ApiResult<HealthStatus>;

    // Cases
    async fn list_cases(&self, org_id: i64) -> ApiResult<Vec<Case>>;
    async fn create_case(&self, org_id: i64, case: &NewCase) -> ApiResult<Case>;
    async fn get_case(&self, org_id: i64, case_id: i64) -> ApiResult<CaseDetail>;
    async fn delete_case(&self, org_id: i64, case_id: i64) -> ApiResult<Receipt>;
    async fn export_case(&self, org_id: i64, case_id: i64, request: &ExportRequest) -> ApiResult<ExportTicket>;
    async fn add_case_items(&self, org_id: i64, case_id: i64, message_ids: &[String]) -> ApiResult<Receipt>;
    async fn update_item_tags(&self, item_id: i64, tags: &[String]) -> ApiResult<Receipt>;
    async fn update_item_status(&self, item_id: i64, status: ReviewStatus) -> ApiResult<Receipt>;
    async fn remove_case_item(&self, item_id: i64) -> ApiResult<Receipt>;
    async fn batch_assign(&self, org_id: i64, item_ids: &[i64], assignee_id: i64) -> ApiResult<Receipt>;
    async fn list_assignments(&self, user_id: i64) -> ApiResult<Vec<Assignment>>;

    // Legal holds
    async fn list_holds(&self, org_id: i64) -> ApiResult<Vec<LegalHold>>;
    async fn create_hold(&self, org_id: i64, hold: &NewHold) -> ApiResult<HoldCreated>;
    async fn get_hold(&self, org_id: i64, hold_id: &str) -> ApiResult<HoldDetail>;
    async fn release_hold(&self, org_id: i64, hold_id: &str) -> ApiResult<Receipt>;
    async fn apply_hold(&self, org_id: i64, hold_id: &str, message_ids: &[String]) -> ApiResult<Receipt>;

    // Audit log
    async fn list_audit_logs(&self, org_id: i64, limit: u32) -> ApiResult<Vec<AuditLogEntry>>;
    async fn append_audit_log(&self, org_id: i64, entry: &AuditLogCreate) -> ApiResult<AuditReceipt>;
    async fn verify_audit_chain(&self, org_id: i64) -> ApiResult<ChainVerification>;

    // Administration
    async fn list_users(&self, org_id: Option<i64>) -> ApiResult<Vec<User>>;
    async fn create_user(&self, user: &NewUser) -> ApiResult<User>;
    async fn delete_user(&self, user_id: i64) -> ApiResult<Receipt>;
    async fn list_organizations(&self) -> ApiResult<Vec<Organization>>;
    async fn create_organization(&self, org: &NewOrganization) -> ApiResult<Organization>;
    async fn delete_organization(&self, org_id: i64) -> ApiResult<Receipt>;
    async fn list_agents(&self) -> ApiResult<Vec<Agent>>;
    async fn org_analytics(&self, org_id: i64) -> ApiResult<OrgAnalytics>;
    async fn admin_stats(&self, org_id: Option<i64>) -> ApiResult<AdminStats>;

    // Retention
    async fn list_retention(&self, org_id: Option<i64>) -> ApiResult<Vec<RetentionPolicy>>;
    async fn create_retention(&self, org_id: Option<i64>, policy: &NewRetentionPolicy) -> ApiResult<Receipt>;
    async fn delete_retention(&self, org_id: Option<i64>, policy_id: i64) -> ApiResult<Receipt>;
    async fn run_retention(&self) -> ApiResult<Receipt>;

    // Messages
    async fn search_messages(&self, request: &SearchRequest) -> ApiResult<SearchResults>;
    async fn get_message(&self, org_id: i64, message_id: &str) -> ApiResult<MessageContent>;
    async fn message_thread(&self, org_id: i64, message_id: &str) -> ApiResult<Vec<MessageHit>>;
    async fn message_headers(&self, org_id: i64, message_id: &str) -> ApiResult<Vec<HeaderField>>;
    async fn preview_redacted(&self, org_id: i64, message_id: &str) -> ApiResult<RedactedPreview>;
    async fn pii_scan(&self, org_id: i64, message_id: &str) -> ApiResult<PiiScan>;
    async fn verify_message(&self, org_id: i64, message_id: &str) -> ApiResult<IntegrityReport>;

    /// Fetch an export archive by the `download_url` the export call handed out
    async fn download(&self, download_url: &str) -> ApiResult<Vec<u8>>;
}
