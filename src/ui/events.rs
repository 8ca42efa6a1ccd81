use anyhow::Result;
use chrono::Utc;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::api::ArchiveApi;
use crate::export;
use crate::models::{
    AdminStats, Agent, Assignment, AuditLogEntry, Case, CaseDetail, ChainVerification,
    ExportRequest, ExportTicket, HoldDetail, LegalHold, MessageHit, NewCase, NewHold,
    NewOrganization, NewRetentionPolicy, OrgAnalytics, Organization, RetentionPolicy,
    ReviewStatus, Role, SearchResults, User,
};
use crate::search::SearchRequest;
use crate::selection::Selection;
use crate::session::{Page, Session};
use crate::ui::state::LogLevel;
use crate::workflows::{HoldApplied, MessageView, UserDraft, Workflows};

/// Work a view asks the runner to do against the API
#[derive(Debug, Clone)]
pub enum Request {
    Stats,
    Analytics,
    Organizations,
    CreateOrganization(NewOrganization),
    DeleteOrganization(i64),
    Agents,
    Search(SearchRequest),
    OpenCases,
    ApplyHold(Vec<String>),
    AddToCase { case_id: Option<i64>, message_ids: Vec<String> },
    ExportCsv { rows: Vec<MessageHit>, selected: bool },
    Message(String),
    Cases,
    CaseDetail(i64),
    CreateCase(NewCase),
    DeleteCase(i64),
    ExportCase { case_id: i64, request: ExportRequest },
    SetTags { item_id: i64, tags: Vec<String> },
    RemoveItem(i64),
    Assign { item_ids: Vec<i64>, assignee: User },
    Holds,
    HoldDetail(String),
    CreateHold(NewHold),
    ReleaseHold(String),
    Assignments,
    SetReviewStatus { item_id: i64, status: ReviewStatus },
    AuditLogs,
    VerifyChain,
    Retention,
    CreateRetention(NewRetentionPolicy),
    DeleteRetention(i64),
    RunRetention,
    Users,
    CreateUser(UserDraft),
    DeleteUser(i64),
}

impl Request {
    /// Short label used in the activity log
    pub fn label(&self) -> &'static str {
        match self {
            Request::Stats => "Load stats",
            Request::Analytics => "Load analytics",
            Request::Organizations => "Load organizations",
            Request::CreateOrganization(_) => "Create organization",
            Request::DeleteOrganization(_) => "Delete organization",
            Request::Agents => "Load agents",
            Request::Search(_) => "Search",
            Request::OpenCases => "Load open cases",
            Request::ApplyHold(_) => "Apply legal hold",
            Request::AddToCase { .. } => "Add to case",
            Request::ExportCsv { .. } => "Export CSV",
            Request::Message(_) => "Load message",
            Request::Cases => "Load cases",
            Request::CaseDetail(_) => "Load case",
            Request::CreateCase(_) => "Create case",
            Request::DeleteCase(_) => "Delete case",
            Request::ExportCase { .. } => "Export case",
            Request::SetTags { .. } => "Update tags",
            Request::RemoveItem(_) => "Remove item",
            Request::Assign { .. } => "Assign items",
            Request::Holds => "Load holds",
            Request::HoldDetail(_) => "Load hold",
            Request::CreateHold(_) => "Create hold",
            Request::ReleaseHold(_) => "Release hold",
            Request::Assignments => "Load assignments",
            Request::SetReviewStatus { .. } => "Update review status",
            Request::AuditLogs => "Load audit logs",
            Request::VerifyChain => "Verify audit chain",
            Request::Retention => "Load retention policies",
            Request::CreateRetention(_) => "Create retention policy",
            Request::DeleteRetention(_) => "Delete retention policy",
            Request::RunRetention => "Run retention",
            Request::Users => "Load users",
            Request::CreateUser(_) => "Create user",
            Request::DeleteUser(_) => "Delete user",
        }
    }
}

/// Result of a [`Request`], delivered back to the view that asked
#[derive(Debug, Clone)]
pub enum Response {
    Stats(AdminStats),
    Analytics(OrgAnalytics),
    Organizations(Vec<Organization>),
    Agents(Vec<Agent>),
    SearchResults(SearchResults),
    OpenCases(Vec<Case>),
    HoldApplied(Option<HoldApplied>),
    AddedToCase(usize),
    CsvExported { path: PathBuf, count: usize },
    Message(Box<MessageView>),
    Cases(Vec<Case>),
    CaseDetail(CaseDetail),
    CaseExported(ExportTicket),
    TagsSet { item_id: i64, tags: Vec<String> },
    ItemRemoved(i64),
    Assigned { item_ids: Vec<i64>, assignee: User },
    Holds(Vec<LegalHold>),
    HoldDetail(HoldDetail),
    Assignments(Vec<Assignment>),
    ReviewStatusSet { item_id: i64, status: ReviewStatus },
    AuditLogs(Vec<AuditLogEntry>),
    ChainVerified(ChainVerification),
    Retention(Vec<RetentionPolicy>),
    Users(Vec<User>),
    /// A mutation succeeded; the view should reload
    Done(String),
    Failed(String),
}

/// What views hand back to the app
#[derive(Debug, Clone)]
pub enum Action {
    Dispatch(Request),
    OpenMessage(String),
    Notify(LogLevel, String),
}

/// Which view a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Tab(Page),
    Overlay,
}

/// Response tagged with the generation of the view that dispatched it
#[derive(Debug)]
pub struct Envelope {
    pub target: Target,
    pub generation: u64,
    pub label: &'static str,
    pub response: Response,
}

/// Unified TUI events
#[derive(Debug)]
pub enum TuiEvent {
    Key(KeyCode),
    Resize(u16, u16),
    Response(Envelope),
}

/// Executes requests on the tokio runtime and posts results on an mpsc channel
#[derive(Clone)]
pub struct RequestRunner {
    api: Arc<dyn ArchiveApi>,
    session: Arc<Session>,
    audit_log_limit: u32,
    sender: mpsc::UnboundedSender<TuiEvent>,
}

impl RequestRunner {
    pub fn new(
        api: Arc<dyn ArchiveApi>,
        session: Arc<Session>,
        audit_log_limit: u32,
        sender: mpsc::UnboundedSender<TuiEvent>,
    ) -> Self {
        Self {
            api,
            session,
            audit_log_limit,
            sender,
        }
    }

    pub fn dispatch(&self, target: Target, generation: u64, request: Request) {
        let runner = self.clone();
        tokio::spawn(async move {
            let label = request.label();
            debug!("{} ({:?}, generation {})", label, target, generation);
            let response = match runner.execute(request).await {
                Ok(response) => response,
                Err(e) => {
                    error!("{} failed: {:#}", label, e);
                    Response::Failed(format!("{} failed: {}", label, e))
                }
            };
            let envelope = Envelope {
                target,
                generation,
                label,
                response,
            };
            // The receiver is gone once the app quits
            let _ = runner.sender.send(TuiEvent::Response(envelope));
        });
    }

    fn org(&self) -> Result<i64> {
        self.session.require_org()
    }

    /// Global scope for super admins, the user's org otherwise
    fn scope(&self) -> Option<i64> {
        match self.session.role() {
            Role::SuperAdmin => None,
            _ => self.session.org_id(),
        }
    }

    pub async fn execute(&self, request: Request) -> Result<Response> {
        let api = self.api.as_ref();
        let flows = Workflows::new(api, &self.session);

        Ok(match request {
            Request::Stats => Response::Stats(api.admin_stats(self.scope()).await?),
            Request::Analytics => Response::Analytics(api.org_analytics(self.org()?).await?),
            Request::Organizations => Response::Organizations(api.list_organizations().await?),
            Request::CreateOrganization(org) => {
                let created = api.create_organization(&org).await?;
                Response::Done(format!("Organization {} created", created.name))
            }
            Request::DeleteOrganization(id) => {
                api.delete_organization(id).await?;
                Response::Done(format!("Organization {} deleted", id))
            }
            Request::Agents => Response::Agents(api.list_agents().await?),
            Request::Search(search) => Response::SearchResults(flows.search(&search).await?),
            Request::OpenCases => Response::OpenCases(flows.open_cases().await?),
            Request::ApplyHold(ids) => {
                let mut selection = Selection::new();
                for id in ids {
                    selection.toggle(id);
                }
                Response::HoldApplied(flows.apply_hold(&mut selection, Utc::now().date_naive()).await?)
            }
            Request::AddToCase { case_id, message_ids } => {
                let mut selection = Selection::new();
                for id in message_ids {
                    selection.toggle(id);
                }
                Response::AddedToCase(flows.add_to_case(case_id, &mut selection).await?)
            }
            Request::ExportCsv { rows, selected } => {
                let path = PathBuf::from(export::default_file_name(Utc::now().date_naive()));
                let refs: Vec<&MessageHit> = rows.iter().collect();
                let count = export::export_to_file(&path, &refs)?;
                flows.record_export(count, selected).await;
                Response::CsvExported { path, count }
            }
            Request::Message(id) => Response::Message(Box::new(flows.load_message(&id).await?)),
            Request::Cases => Response::Cases(api.list_cases(self.org()?).await?),
            Request::CaseDetail(id) => Response::CaseDetail(api.get_case(self.org()?, id).await?),
            Request::CreateCase(case) => {
                let created = api.create_case(self.org()?, &case).await?;
                Response::Done(format!("Case {} created", created.name))
            }
            Request::DeleteCase(id) => {
                api.delete_case(self.org()?, id).await?;
                Response::Done(format!("Case {} deleted", id))
            }
            Request::ExportCase { case_id, request } => {
                Response::CaseExported(api.export_case(self.org()?, case_id, &request).await?)
            }
            Request::SetTags { item_id, tags } => {
                api.update_item_tags(item_id, &tags).await?;
                Response::TagsSet { item_id, tags }
            }
            Request::RemoveItem(item_id) => {
                api.remove_case_item(item_id).await?;
                Response::ItemRemoved(item_id)
            }
            Request::Assign { item_ids, assignee } => {
                api.batch_assign(self.org()?, &item_ids, assignee.id).await?;
                Response::Assigned { item_ids, assignee }
            }
            Request::Holds => Response::Holds(api.list_holds(self.org()?).await?),
            Request::HoldDetail(id) => Response::HoldDetail(api.get_hold(self.org()?, &id).await?),
            Request::CreateHold(hold) => {
                let created = api.create_hold(self.org()?, &hold).await?;
                Response::Done(format!(
                    "Hold {} created, {} messages held automatically",
                    hold.name, created.auto_held_count
                ))
            }
            Request::ReleaseHold(id) => {
                api.release_hold(self.org()?, &id).await?;
                Response::Done(format!("Hold {} released", id))
            }
            Request::Assignments => Response::Assignments(api.list_assignments(self.session.user.id).await?),
            Request::SetReviewStatus { item_id, status } => {
                api.update_item_status(item_id, status).await?;
                Response::ReviewStatusSet { item_id, status }
            }
            Request::AuditLogs => {
                Response::AuditLogs(api.list_audit_logs(self.org()?, self.audit_log_limit).await?)
            }
            Request::VerifyChain => Response::ChainVerified(api.verify_audit_chain(self.org()?).await?),
            Request::Retention => Response::Retention(api.list_retention(self.scope()).await?),
            Request::CreateRetention(policy) => {
                api.create_retention(self.scope(), &policy).await?;
                Response::Done(format!("Retention policy {} created", policy.name))
            }
            Request::DeleteRetention(id) => {
                api.delete_retention(self.scope(), id).await?;
                Response::Done(format!("Retention policy {} deleted", id))
            }
            Request::RunRetention => {
                let receipt = api.run_retention().await?;
                Response::Done(format!(
                    "Retention run {}",
                    receipt.status.unwrap_or_else(|| "started".to_string())
                ))
            }
            Request::Users => Response::Users(api.list_users(self.scope()).await?),
            Request::CreateUser(draft) => {
                let user = flows.create_user(draft).await?;
                Response::Done(format!("User {} created", user.username))
            }
            Request::DeleteUser(id) => {
                api.delete_user(id).await?;
                Response::Done(format!("User {} deleted", id))
            }
        })
    }
}

/// Event manager for terminal input and runner results
pub struct EventManager {
    pub event_sender: mpsc::UnboundedSender<TuiEvent>,
    pub event_receiver: mpsc::UnboundedReceiver<TuiEvent>,
}

impl Default for EventManager {
    fn default() -> Self {
        Self::new()
    }
}

impl EventManager {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel::<TuiEvent>();
        Self {
            event_sender,
            event_receiver,
        }
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<TuiEvent> {
        self.event_sender.clone()
    }

    /// Poll the terminal briefly and queue what arrived
    pub fn poll_terminal(&self, timeout: Duration) -> Result<()> {
        if crossterm::event::poll(timeout)? {
            match crossterm::event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    let _ = self.event_sender.send(TuiEvent::Key(key.code));
                }
                Event::Resize(w, h) => {
                    let _ = self.event_sender.send(TuiEvent::Resize(w, h));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Try to receive an event (non-blocking)
    pub fn try_receive(&mut self) -> Option<TuiEvent> {
        self.event_receiver.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_free_channel_roundtrip() {
        let mut events = EventManager::new();
        events.sender().send(TuiEvent::Key(KeyCode::Char('q'))).unwrap();
        assert!(matches!(events.try_receive(), Some(TuiEvent::Key(KeyCode::Char('q')))));
        assert!(events.try_receive().is_none());
    }
}
