use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table, TableState},
    Frame,
};

use crate::models::{Role, User};
use crate::ui::components::{self, ConfirmDialog, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};
use crate::workflows::UserDraft;

enum Modal {
    Create(Form),
    Delete(ConfirmDialog<i64>),
}

enum Submitted {
    Create(Vec<String>),
    Delete(i64),
}

/// Account management: client admins for a super admin, auditors for a client admin
pub struct UsersView {
    title: String,
    picks_org: bool,
    users: Vec<User>,
    selected: usize,
    modal: Option<Modal>,
    loading: bool,
    error: Option<String>,
}

impl UsersView {
    pub fn new(title: impl Into<String>, role: Role) -> Self {
        Self {
            title: title.into(),
            picks_org: role == Role::SuperAdmin,
            users: Vec::new(),
            selected: 0,
            modal: None,
            loading: false,
            error: None,
        }
    }

    fn create_form(&self) -> Form {
        let mut fields = vec![
            FormField::text("Username"),
            FormField::secret("Password"),
            FormField::text("Domains (comma separated)"),
        ];
        if self.picks_org {
            fields.push(FormField::text("Organization id"));
        }
        let title = if self.picks_org { "New client admin" } else { "New auditor" };
        Form::new(title, fields)
    }

    fn draft_from_form(&self, values: Vec<String>) -> Result<UserDraft, String> {
        let mut values = values.into_iter();
        let mut next = || values.next().unwrap_or_default();
        let (username, password, domains) = (next(), next(), next());
        let target_org = if self.picks_org {
            let raw = next();
            match raw.trim() {
                "" => None,
                id => Some(
                    id.parse::<i64>()
                        .map_err(|_| format!("Organization id must be a number, got '{}'", id))?,
                ),
            }
        } else {
            None
        };
        Ok(UserDraft {
            username,
            password,
            domains,
            target_org,
        })
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Action> {
        let outcome = match self.modal.as_mut() {
            None => return Vec::new(),
            Some(Modal::Create(form)) => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => None,
                DialogOutcome::Confirmed(values) => Some(Submitted::Create(values)),
            },
            Some(Modal::Delete(dialog)) => match dialog.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => None,
                DialogOutcome::Confirmed(id) => Some(Submitted::Delete(id)),
            },
        };

        let actions = match outcome {
            None => Vec::new(),
            Some(Submitted::Delete(id)) => dispatch(Request::DeleteUser(id)),
            Some(Submitted::Create(values)) => match self.draft_from_form(values) {
                Ok(draft) => dispatch(Request::CreateUser(draft)),
                Err(message) => return vec![Action::Notify(LogLevel::Warning, message)],
            },
        };
        self.modal = None;
        actions
    }
}

impl View for UsersView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
        } else if self.loading && self.users.is_empty() {
            components::render_loading_indicator(f, area, "Loading users...");
        } else if self.users.is_empty() {
            components::render_empty(f, area, &self.title, "No users yet. Press n to create one.");
        } else {
            let header = Row::new(vec!["ID", "Username", "Role", "Org", "Domains"])
                .style(Style::default().add_modifier(Modifier::BOLD));
            let rows = self.users.iter().map(|u| {
                Row::new(vec![
                    u.id.to_string(),
                    components::truncate(&u.username, 30),
                    u.role.to_string(),
                    u.org_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                    u.domains.join(", "),
                ])
            });
            let table = Table::new(
                rows,
                [
                    Constraint::Length(6),
                    Constraint::Length(30),
                    Constraint::Length(14),
                    Constraint::Length(6),
                    Constraint::Min(20),
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
            Some(Modal::Delete(dialog)) => dialog.render(f, area),
            None => {}
        }
    }

    fn get_title(&self) -> String {
        self.title.clone()
    }

    fn get_status(&self) -> String {
        "n new user • d delete".to_string()
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        dispatch(Request::Users)
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
                self.selected = components::step(self.selected, self.users.len(), true);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.users.len(), false);
            }
            KeyCode::Char('n') => self.modal = Some(Modal::Create(self.create_form())),
            KeyCode::Char('d') => {
                if let Some(user) = self.users.get(self.selected) {
                    self.modal = Some(Modal::Delete(ConfirmDialog::new(
                        format!("Delete user '{}'?", user.username),
                        user.id,
                    )));
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::Users(users) => {
                self.users = users;
                self.selected = self.selected.min(self.users.len().saturating_sub(1));
            }
            Response::Done(_) => return self.refresh(),
            Response::Failed(message) if self.users.is_empty() => self.error = Some(message),
            _ => {}
        }
        Vec::new()
    }
}
