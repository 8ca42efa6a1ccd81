use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use crate::api::ArchiveApi;
use crate::models::{AuditLogCreate, AuditReceipt};
use crate::session::Session;

/// Actions the dashboard writes to the tamper-evident audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Search,
    ExportCsv,
    ApplyLegalHold,
    AddToCase,
    ViewMessage,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Search => "SEARCH",
            AuditAction::ExportCsv => "EXPORT_CSV",
            AuditAction::ApplyLegalHold => "APPLY_LEGAL_HOLD",
            AuditAction::AddToCase => "ADD_TO_CASE",
            AuditAction::ViewMessage => "VIEW_MESSAGE",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appends entries on behalf of one user. Failures are logged and swallowed.
pub struct AuditTrail<'a> {
    api: &'a dyn ArchiveApi,
    org_id: i64,
    username: String,
}

impl<'a> AuditTrail<'a> {
    pub fn new(api: &'a dyn ArchiveApi, org_id: i64, username: impl Into<String>) -> Self {
        Self {
            api,
            org_id,
            username: username.into(),
        }
    }

    /// Trail for the logged-in user; `None` without an organization
    pub fn for_session(api: &'a dyn ArchiveApi, session: &Session) -> Option<Self> {
        session
            .org_id()
            .map(|org_id| Self::new(api, org_id, session.audit_username()))
    }

    pub async fn record(&self, action: AuditAction, details: Value) -> Option<AuditReceipt> {
        let entry = AuditLogCreate {
            username: self.username.clone(),
            action: action.to_string(),
            details,
        };

        match self.api.append_audit_log(self.org_id, &entry).await {
            Ok(receipt) => {
                debug!("Audit {} recorded (hash {:?})", action, receipt.hash);
                Some(receipt)
            }
            Err(e) => {
                warn!("Audit log append for {} failed: {}", action, e);
                None
            }
        }
    }
}
