//! Dashboard operations that span several API calls.

use anyhow::{anyhow, bail, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::NaiveDate;
use serde_json::json;
use tracing::{info, warn};

use crate::api::ArchiveApi;
use crate::audit::{AuditAction, AuditTrail};
use crate::export;
use crate::models::{
    Assignment, Case, CaseDetail, HeaderField, HoldCriteria, IntegrityReport, MessageContent,
    MessageHit, NewHold, NewUser, PiiScan, ReviewStatus, Role, SearchResults, User,
};
use crate::search::{split_list, SearchRequest};
use crate::selection::Selection;
use crate::session::Session;

pub const AUTO_HOLD_REASON: &str = "Bulk hold from search results";
pub const NO_CONTENT: &str = "No content.";

pub fn auto_hold_name(today: NaiveDate) -> String {
    format!("Auto-Case-{}", today.format("%Y-%m-%d"))
}

/// Result of putting the selected messages on hold
#[derive(Debug, Clone, PartialEq)]
pub struct HoldApplied {
    pub hold_id: String,
    pub created: bool,
    pub count: usize,
}

/// Everything the message page shows
#[derive(Debug, Clone, PartialEq)]
pub struct MessageView {
    pub message: MessageContent,
    pub body: String,
    pub thread: Vec<MessageHit>,
    pub headers: Vec<HeaderField>,
    pub redacted: Option<String>,
    pub pii: Option<PiiScan>,
    pub integrity: IntegrityReport,
}

/// Plain text body: `content`, else the decoded `content_b64`
pub fn message_body(message: &MessageContent) -> String {
    if let Some(content) = message.content.as_deref().filter(|c| !c.trim().is_empty()) {
        return content.to_string();
    }
    message
        .content_b64
        .as_deref()
        .and_then(|b64| STANDARD.decode(b64.trim()).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .filter(|body| !body.is_empty())
        .unwrap_or_else(|| NO_CONTENT.to_string())
}

/// Form input for creating an account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserDraft {
    pub username: String,
    pub password: String,
    /// Comma separated
    pub domains: String,
    /// Only consulted when a super admin creates a client admin
    pub target_org: Option<i64>,
}

impl UserDraft {
    /// Super admins create client admins in the chosen org; everyone else creates auditors in their own
    pub fn into_new_user(self, session: &Session) -> Result<NewUser> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            bail!("Username and password are required");
        }

        let (role, org_id) = match session.role() {
            Role::SuperAdmin => (Role::ClientAdmin, self.target_org),
            _ => (Role::Auditor, session.org_id()),
        };
        let org_id = org_id.ok_or_else(|| anyhow!("Organization is required"))?;

        Ok(NewUser {
            username: self.username.trim().to_string(),
            password: self.password,
            role,
            org_id,
            domains: split_list(&self.domains),
        })
    }
}

/// Local follow-up of a successful status update in the review queue
pub fn set_review_status(assignments: &mut [Assignment], item_id: i64, status: ReviewStatus) -> bool {
    match assignments.iter_mut().find(|a| a.id == item_id) {
        Some(assignment) => {
            assignment.review_status = status;
            true
        }
        None => false,
    }
}

/// Operations bound to the logged-in user
pub struct Workflows<'a> {
    api: &'a dyn ArchiveApi,
    session: &'a Session,
}

impl<'a> Workflows<'a> {
    pub fn new(api: &'a dyn ArchiveApi, session: &'a Session) -> Self {
        Self { api, session }
    }

    fn trail(&self) -> Option<AuditTrail<'a>> {
        AuditTrail::for_session(self.api, self.session)
    }

    async fn audit(&self, action: AuditAction, details: serde_json::Value) {
        if let Some(trail) = self.trail() {
            trail.record(action, details).await;
        }
    }

    /// Run a search, auditing it when it narrows anything
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults> {
        let results = self.api.search_messages(request).await?;
        if request.is_auditable() {
            let page = request.offset / request.limit.max(1) + 1;
            self.audit(AuditAction::Search, request.audit_details(results.hits.len(), page))
                .await;
        }
        Ok(results)
    }

    /// Cases that can still take messages
    pub async fn open_cases(&self) -> Result<Vec<Case>> {
        let org_id = self.session.require_org()?;
        let cases = self.api.list_cases(org_id).await?;
        Ok(cases.into_iter().filter(Case::is_open).collect())
    }

    /// Put the selection on the first available hold, creating one when the org has none
    pub async fn apply_hold(&self, selection: &mut Selection<String>, today: NaiveDate) -> Result<Option<HoldApplied>> {
        if selection.is_empty() {
            return Ok(None);
        }
        let org_id = self.session.require_org()?;

        let existing = self.api.list_holds(org_id).await?.into_iter().next();
        let (hold_id, created) = match existing {
            Some(hold) => (hold.id, false),
            None => {
                let hold = NewHold {
                    name: auto_hold_name(today),
                    reason: AUTO_HOLD_REASON.to_string(),
                    filter_criteria: HoldCriteria::new(),
                };
                let created = self.api.create_hold(org_id, &hold).await?;
                info!("Created hold {} ({})", hold.name, created.id);
                (created.id, true)
            }
        };

        let message_ids = selection.to_vec();
        self.api.apply_hold(org_id, &hold_id, &message_ids).await?;
        selection.clear();

        let count = message_ids.len();
        self.audit(AuditAction::ApplyLegalHold, json!({ "hold_id": hold_id, "count": count }))
            .await;
        Ok(Some(HoldApplied { hold_id, created, count }))
    }

    /// Add the selection to a case; returns how many messages were sent
    pub async fn add_to_case(&self, case_id: Option<i64>, selection: &mut Selection<String>) -> Result<usize> {
        if selection.is_empty() {
            return Ok(0);
        }
        let case_id = case_id.ok_or_else(|| anyhow!("Select a case first"))?;
        let org_id = self.session.require_org()?;

        let message_ids = selection.to_vec();
        self.api.add_case_items(org_id, case_id, &message_ids).await?;
        selection.clear();

        self.audit(AuditAction::AddToCase, json!({ "case_id": case_id, "count": message_ids.len() }))
            .await;
        Ok(message_ids.len())
    }

    /// Audit a finished CSV export
    pub async fn record_export(&self, count: usize, selected: bool) {
        self.audit(AuditAction::ExportCsv, export::export_details(count, selected)).await;
    }

    /// Fetch the message and its side panels concurrently. Only the message itself is required.
    pub async fn load_message(&self, message_id: &str) -> Result<MessageView> {
        let org_id = self.session.require_org()?;
        let api = self.api;

        let (message, thread, headers, redacted, pii, integrity) = tokio::join!(
            api.get_message(org_id, message_id),
            api.message_thread(org_id, message_id),
            api.message_headers(org_id, message_id),
            api.preview_redacted(org_id, message_id),
            api.pii_scan(org_id, message_id),
            api.verify_message(org_id, message_id),
        );

        let message = message?;
        if let Some(error) = &message.error {
            warn!("Message {} loaded with error: {}", message_id, error);
        }

        let view = MessageView {
            body: message_body(&message),
            message,
            thread: thread.unwrap_or_else(|e| {
                warn!("Thread for {} unavailable: {}", message_id, e);
                Vec::new()
            }),
            headers: headers.unwrap_or_default(),
            redacted: redacted.ok().and_then(|p| p.redacted),
            pii: pii.ok(),
            integrity: integrity.unwrap_or_default(),
        };

        self.audit(AuditAction::ViewMessage, json!({ "message_id": message_id }))
            .await;
        Ok(view)
    }

    pub async fn create_user(&self, draft: UserDraft) -> Result<User> {
        let request = draft.into_new_user(self.session)?;
        let user = self.api.create_user(&request).await?;
        info!("Created {} {}", user.role, user.username);
        Ok(user)
    }

    /// Assign items and mirror the assignment locally
    pub async fn assign_items(&self, detail: &mut CaseDetail, item_ids: &[i64], assignee: &User) -> Result<()> {
        if item_ids.is_empty() {
            return Ok(());
        }
        let org_id = self.session.require_org()?;
        self.api.batch_assign(org_id, item_ids, assignee.id).await?;
        detail.apply_assignment(item_ids, assignee.id, Some(&assignee.username));
        Ok(())
    }

    /// Append a tag to an item; blank tags are ignored
    pub async fn add_tag(&self, detail: &mut CaseDetail, item_id: i64, tag: &str) -> Result<bool> {
        let Some(tags) = detail.tags_with(item_id, tag) else {
            return Ok(false);
        };
        self.api.update_item_tags(item_id, &tags).await?;
        detail.set_tags(item_id, tags);
        Ok(true)
    }

    pub async fn remove_item(&self, detail: &mut CaseDetail, item_id: i64) -> Result<bool> {
        self.api.remove_case_item(item_id).await?;
        Ok(detail.remove_item(item_id))
    }

    pub async fn update_review_status(
        &self,
        assignments: &mut [Assignment],
        item_id: i64,
        status: ReviewStatus,
    ) -> Result<bool> {
        self.api.update_item_status(item_id, status).await?;
        Ok(set_review_status(assignments, item_id, status))
    }
}
