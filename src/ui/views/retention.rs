use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table, TableState},
    Frame,
};

use crate::models::{NewRetentionPolicy, RetentionPolicy};
use crate::search::split_list;
use crate::ui::components::{self, ConfirmDialog, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    Delete(i64),
    Run,
}

enum Modal {
    Create(Form),
    Confirm(ConfirmDialog<Pending>),
}

/// Parse the policy form; days must be a positive whole number
fn policy_from_form(values: &[String]) -> Result<NewRetentionPolicy, String> {
    let name = values.first().map(|v| v.trim()).unwrap_or("");
    if name.is_empty() {
        return Err("Policy name is required".to_string());
    }
    let days = values.get(2).map(|v| v.trim()).unwrap_or("");
    let retention_days = match days.parse::<i64>() {
        Ok(days) if days > 0 => days,
        _ => return Err(format!("Retention days must be a positive number, got '{}'", days)),
    };
    Ok(NewRetentionPolicy {
        name: name.to_string(),
        domains: split_list(values.get(1).map(String::as_str).unwrap_or("")),
        retention_days,
        ..NewRetentionPolicy::default()
    })
}

/// Retention policies for the organization, or global ones for a super admin
pub struct RetentionView {
    title: String,
    policies: Vec<RetentionPolicy>,
    selected: usize,
    modal: Option<Modal>,
    loading: bool,
    error: Option<String>,
}

impl RetentionView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            policies: Vec::new(),
            selected: 0,
            modal: None,
            loading: false,
            error: None,
        }
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Action> {
        let actions = match self.modal.as_mut() {
            None => return Vec::new(),
            Some(Modal::Create(form)) => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(values) => match policy_from_form(&values) {
                    Ok(policy) => dispatch(Request::CreateRetention(policy)),
                    Err(message) => return vec![Action::Notify(LogLevel::Warning, message)],
                },
            },
            Some(Modal::Confirm(dialog)) => match dialog.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(Pending::Delete(id)) => dispatch(Request::DeleteRetention(id)),
                DialogOutcome::Confirmed(Pending::Run) => dispatch(Request::RunRetention),
            },
        };
        self.modal = None;
        actions
    }
}

impl View for RetentionView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
        } else if self.loading && self.policies.is_empty() {
            components::render_loading_indicator(f, area, "Loading retention policies...");
        } else if self.policies.is_empty() {
            components::render_empty(f, area, &self.title, "No retention policies. Press n to create one.");
        } else {
            let header = Row::new(vec!["Name", "Domains", "Days", "Action", "Active"])
                .style(Style::default().add_modifier(Modifier::BOLD));
            let rows = self.policies.iter().map(|p| {
                let domains = if p.domains.is_empty() {
                    "all".to_string()
                } else {
                    p.domains.join(", ")
                };
                Row::new(vec![
                    components::truncate(&p.name, 30),
                    components::truncate(&domains, 40),
                    p.retention_days.to_string(),
                    p.action.clone(),
                    if p.active { "yes" } else { "no" }.to_string(),
                ])
            });
            let table = Table::new(
                rows,
                [
                    Constraint::Length(30),
                    Constraint::Min(20),
                    Constraint::Length(6),
                    Constraint::Length(18),
                    Constraint::Length(7),
                ],
            )
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(self.title.clone()))
            .highlight_style(Style::default().bg(Color::DarkGray));
            let mut state = TableState::default().with_selected(Some(self.selected));
            f.render_stateful_widget(table, area, &mut state);
        }

        match &self.modal {
            Some(Modal::Create(form)) => form.render(f, area),
            Some(Modal::Confirm(dialog)) => dialog.render(f, area),
            None => {}
        }
    }

    fn get_title(&self) -> String {
        self.title.clone()
    }

    fn get_status(&self) -> String {
        "n new policy • d delete • x run retention now".to_string()
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        dispatch(Request::Retention)
    }

    fn is_capturing_input(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.policies.len(), true);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.policies.len(), false);
            }
            KeyCode::Char('n') => {
                self.modal = Some(Modal::Create(Form::new(
                    "New retention policy",
                    vec![
                        FormField::text("Name"),
                        FormField::text("Domains (comma separated, empty for all)"),
                        FormField::text("Retention days").with_value("365"),
                    ],
                )));
            }
            KeyCode::Char('d') => {
                if let Some(policy) = self.policies.get(self.selected) {
                    self.modal = Some(Modal::Confirm(ConfirmDialog::new(
                        format!("Delete retention policy '{}'?", policy.name),
                        Pending::Delete(policy.id),
                    )));
                }
            }
            KeyCode::Char('x') => {
                self.modal = Some(Modal::Confirm(ConfirmDialog::new(
                    "Run retention now? Expired messages not on hold are permanently deleted.",
                    Pending::Run,
                )));
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::Retention(policies) => {
                self.policies = policies;
                self.selected = self.selected.min(self.policies.len().saturating_sub(1));
            }
            Response::Done(_) => return self.refresh(),
            Response::Failed(message) if self.policies.is_empty() => self.error = Some(message),
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_policy_form_validation() {
        let policy = policy_from_form(&values(&["Mail", "a.com, b.com", " 90 "])).unwrap();
        assert_eq!(policy.domains, vec!["a.com", "b.com"]);
        assert_eq!(policy.retention_days, 90);
        assert_eq!(policy.action, "PERMANENT_DELETE");

        assert!(policy_from_form(&values(&["", "", "90"])).is_err());
        assert!(policy_from_form(&values(&["Mail", "", "0"])).is_err());
        assert!(policy_from_form(&values(&["Mail", "", "soon"])).is_err());
    }

    #[test]
    fn test_run_requires_confirmation() {
        let mut view = RetentionView::new("Retention");
        assert!(view.handle_key(KeyCode::Char('x')).is_empty());
        assert!(view.is_capturing_input());
        assert!(view.handle_key(KeyCode::Char('n')).is_empty());
        assert!(!view.is_capturing_input());

        view.handle_key(KeyCode::Char('x'));
        assert!(matches!(&view.handle_key(KeyCode::Char('y'))[..], [Action::Dispatch(Request::RunRetention)]));
    }
}
