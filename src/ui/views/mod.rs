pub mod admin;
pub mod cases;
pub mod holds;
pub mod logs;
pub mod message;
pub mod retention;
pub mod review;
pub mod search;
pub mod users;

use anyhow::Result;

use crate::session::{NavEntry, Page, Session};
use crate::ui::view::View;

pub use admin::AdminView;
pub use cases::CasesView;
pub use holds::HoldsView;
pub use logs::AuditLogsView;
pub use message::MessageView;
pub use retention::RetentionView;
pub use review::ReviewView;
pub use search::SearchView;
pub use users::UsersView;

/// Build the view behind one navigation entry
pub fn build_view(entry: &NavEntry, session: &Session, page_size: usize) -> Result<Box<dyn View>> {
    let role = session.role();
    Ok(match entry.page {
        Page::Admin => Box::new(AdminView::new(entry.label, role)),
        Page::Users => Box::new(UsersView::new(entry.label, role)),
        Page::Search => Box::new(SearchView::new(session.require_org()?, session.user_domain(), page_size)),
        Page::Review => Box::new(ReviewView::new()),
        Page::Cases => Box::new(CasesView::new(session.user.username.clone(), role)),
        Page::Holds => Box::new(HoldsView::new()),
        Page::Retention => Box::new(RetentionView::new(entry.label)),
        Page::AuditLogs => Box::new(AuditLogsView::new()),
    })
}
