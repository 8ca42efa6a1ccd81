use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{LoginOutcome, Role, User};

/// Dashboard pages reachable from the navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Admin,
    Users,
    Search,
    Review,
    Cases,
    Holds,
    Retention,
    AuditLogs,
}

/// One entry of the role-specific navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavEntry {
    pub page: Page,
    pub label: &'static str,
}

impl NavEntry {
    const fn new(page: Page, label: &'static str) -> Self {
        Self { page, label }
    }
}

const SUPER_ADMIN_NAV: &[NavEntry] = &[
    NavEntry::new(Page::Admin, "Overview"),
    NavEntry::new(Page::Users, "Client Admins"),
    NavEntry::new(Page::Retention, "Global Retention"),
];

const CLIENT_ADMIN_NAV: &[NavEntry] = &[
    NavEntry::new(Page::Admin, "Admin"),
    NavEntry::new(Page::Users, "Members"),
    NavEntry::new(Page::Search, "Search"),
    NavEntry::new(Page::Cases, "Cases"),
    NavEntry::new(Page::Holds, "Legal Holds"),
    NavEntry::new(Page::Retention, "Retention"),
    NavEntry::new(Page::AuditLogs, "Audit Logs"),
];

const AUDITOR_NAV: &[NavEntry] = &[
    NavEntry::new(Page::Search, "Search"),
    NavEntry::new(Page::Review, "My Assignments"),
    NavEntry::new(Page::Cases, "Cases"),
    NavEntry::new(Page::Holds, "Legal Holds"),
];

/// Persisted login: the bearer token (if the backend issued one) and the user object
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    #[serde(default)]
    pub access_token: Option<String>,
    pub user: User,
}

impl From<LoginOutcome> for Session {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            access_token: outcome.access_token,
            user: outcome.user,
        }
    }
}

impl Session {
    /// Load the session file; `Ok(None)` when nobody is logged in
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No session file at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(path)?;
        let session = serde_json::from_str(&content)
            .map_err(|e| anyhow!("Session file {} is corrupt: {}", path.display(), e))?;
        Ok(Some(session))
    }

    /// Like [`Session::load`] but failing with a login hint
    pub fn require(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path)?.ok_or_else(|| anyhow!("Not logged in. Run `openarchive login` first."))
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!("Saved session for {} to {}", self.user.username, path.display());
        Ok(())
    }

    /// Remove the session file; returns false when there was none
    pub fn clear(path: impl AsRef<Path>) -> Result<bool> {
        let path: PathBuf = path.as_ref().to_path_buf();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        info!("Removed session {}", path.display());
        Ok(true)
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn org_id(&self) -> Option<i64> {
        self.user.org_id
    }

    /// Org id or an error naming the operation that needed it
    pub fn require_org(&self) -> Result<i64> {
        self.org_id()
            .ok_or_else(|| anyhow!("User {} is not attached to an organization", self.user.username))
    }

    /// Identity written into audit entries
    pub fn audit_username(&self) -> String {
        self.user.id.to_string()
    }

    /// Domain scope applied to searches for auditors and client admins
    pub fn user_domain(&self) -> Option<String> {
        match self.user.role {
            Role::Auditor | Role::ClientAdmin if !self.user.domains.is_empty() => {
                Some(self.user.domains.join(","))
            }
            _ => None,
        }
    }

    pub fn landing_page(&self) -> Page {
        match self.user.role {
            Role::Auditor => Page::Search,
            _ => Page::Admin,
        }
    }

    pub fn navigation(&self) -> &'static [NavEntry] {
        match self.user.role {
            Role::SuperAdmin => SUPER_ADMIN_NAV,
            Role::ClientAdmin => CLIENT_ADMIN_NAV,
            Role::Auditor => AUDITOR_NAV,
            Role::Unknown => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session(role: Role, domains: &[&str]) -> Session {
        Session {
            access_token: Some("tok".to_string()),
            user: User {
                id: 42,
                username: "ann".to_string(),
                role,
                org_id: Some(3),
                domains: domains.iter().map(|d| d.to_string()).collect(),
            },
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        assert!(Session::load(&path).unwrap().is_none());
        assert!(Session::require(&path).is_err());

        let original = session(Role::Auditor, &["corp.com"]);
        original.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap(), Some(original));

        assert!(Session::clear(&path).unwrap());
        assert!(!Session::clear(&path).unwrap());
    }

    #[test]
    fn test_user_domain_scope() {
        assert_eq!(
            session(Role::Auditor, &["corp.com", "corp.io"]).user_domain().as_deref(),
            Some("corp.com,corp.io")
        );
        assert_eq!(session(Role::ClientAdmin, &[]).user_domain(), None);
        assert_eq!(session(Role::SuperAdmin, &["corp.com"]).user_domain(), None);
    }

    #[test]
    fn test_navigation_by_role() {
        let auditor = session(Role::Auditor, &[]);
        assert_eq!(auditor.landing_page(), Page::Search);
        assert_eq!(auditor.navigation()[1], NavEntry::new(Page::Review, "My Assignments"));

        let admin = session(Role::ClientAdmin, &[]);
        assert_eq!(admin.landing_page(), Page::Admin);
        assert_eq!(admin.navigation().len(), 7);
        assert_eq!(admin.audit_username(), "42");

        let root = session(Role::SuperAdmin, &[]);
        let pages: Vec<Page> = root.navigation().iter().map(|n| n.page).collect();
        assert_eq!(pages, vec![Page::Admin, Page::Users, Page::Retention]);
    }
}
