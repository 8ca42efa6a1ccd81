use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};
use serde_json::Value;

use crate::models::{AuditLogEntry, ChainVerification};
use crate::ui::components;
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

fn details_text(details: &Value) -> String {
    match details {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Organization audit trail with hash-chain verification
pub struct AuditLogsView {
    entries: Vec<AuditLogEntry>,
    selected: usize,
    verification: Option<ChainVerification>,
    loading: bool,
    error: Option<String>,
}

impl Default for AuditLogsView {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditLogsView {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            selected: 0,
            verification: None,
            loading: false,
            error: None,
        }
    }

    fn verification_line(&self) -> Line<'static> {
        match &self.verification {
            None => Line::from(Span::styled(
                "Chain not verified yet. Press v to verify.",
                Style::default().fg(Color::DarkGray),
            )),
            Some(v) if v.valid => Line::from(Span::styled(
                format!(
                    "Chain VALID: {} entries, head {}",
                    v.log_count.unwrap_or(self.entries.len() as u64),
                    v.head_hash.as_deref().map(|h| components::truncate(h, 16)).unwrap_or_default()
                ),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )),
            Some(v) => Line::from(Span::styled(
                format!("Chain BROKEN: {}", v.error.as_deref().unwrap_or("verification failed")),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
        }
    }
}

impl View for AuditLogsView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
            return;
        }
        if self.loading && self.entries.is_empty() {
            components::render_loading_indicator(f, area, "Loading audit logs...");
            return;
        }

        let layout = ViewLayout::new(area, 3);
        let header = Paragraph::new(self.verification_line())
            .block(Block::default().borders(Borders::ALL).title("Integrity"));
        f.render_widget(header, layout.header);

        if self.entries.is_empty() {
            components::render_empty(f, layout.main_content, "Audit Logs", "No audit entries");
            return;
        }
        let header = Row::new(vec!["Time", "User", "Action", "Details"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.entries.iter().map(|e| {
            Row::new(vec![
                e.timestamp.clone(),
                components::truncate(&e.username, 20),
                e.action.clone(),
                components::truncate(&details_text(&e.details), 80),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(26),
                Constraint::Length(20),
                Constraint::Length(18),
                Constraint::Min(20),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Audit Logs"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, layout.main_content, &mut state);
    }

    fn get_title(&self) -> String {
        "Audit Logs".to_string()
    }

    fn get_status(&self) -> String {
        "v verify hash chain".to_string()
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        dispatch(Request::AuditLogs)
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.entries.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.entries.len(), false);
                Vec::new()
            }
            KeyCode::Char('v') => {
                self.verification = None;
                dispatch(Request::VerifyChain)
            }
            _ => Vec::new(),
        }
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::AuditLogs(entries) => {
                self.entries = entries;
                self.selected = self.selected.min(self.entries.len().saturating_sub(1));
            }
            Response::ChainVerified(verification) => {
                let notice = if verification.valid {
                    (LogLevel::Success, "Audit chain verified".to_string())
                } else {
                    (
                        LogLevel::Error,
                        format!(
                            "Audit chain broken: {}",
                            verification.error.as_deref().unwrap_or("verification failed")
                        ),
                    )
                };
                self.verification = Some(verification);
                return vec![Action::Notify(notice.0, notice.1)];
            }
            Response::Failed(message) if self.entries.is_empty() => self.error = Some(message),
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_details_text_flattens_json() {
        assert_eq!(details_text(&Value::Null), "");
        assert_eq!(details_text(&json!("Exported 3 rows")), "Exported 3 rows");
        assert_eq!(details_text(&json!({"count": 3})), "{\"count\":3}");
    }

    #[test]
    fn test_broken_chain_raises_error_notice() {
        let mut view = AuditLogsView::new();
        assert!(matches!(&view.handle_key(KeyCode::Char('v'))[..], [Action::Dispatch(Request::VerifyChain)]));

        let actions = view.handle_response(Response::ChainVerified(ChainVerification {
            valid: false,
            error: Some("hash mismatch at entry 12".into()),
            log_count: None,
            head_hash: None,
        }));
        assert!(matches!(&actions[..], [Action::Notify(LogLevel::Error, msg)] if msg.contains("entry 12")));
        assert!(view.verification.as_ref().is_some_and(|v| !v.valid));
    }
}
