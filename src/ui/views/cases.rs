use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Case, CaseDetail, ExportFormat, ExportRequest, NewCase, Role, User};
use crate::selection::Selection;
use crate::ui::components::{self, checkbox, ConfirmDialog, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pending {
    DeleteCase(i64),
    RemoveItem(i64),
}

enum Modal {
    NewCase(Form),
    Tag { item_id: i64, form: Form },
    Confirm(ConfirmDialog<Pending>),
}

/// Case list with a review detail: tags, assignment, removal and export
pub struct CasesView {
    username: String,
    can_assign: bool,
    cases: Vec<Case>,
    selected: usize,
    detail: Option<CaseDetail>,
    item_row: usize,
    item_selection: Selection<i64>,
    auditors: Vec<User>,
    assignee: usize,
    export: ExportRequest,
    modal: Option<Modal>,
    loading: bool,
    error: Option<String>,
}

impl CasesView {
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            can_assign: role == Role::ClientAdmin,
            cases: Vec::new(),
            selected: 0,
            detail: None,
            item_row: 0,
            item_selection: Selection::new(),
            auditors: Vec::new(),
            assignee: 0,
            export: ExportRequest::default(),
            modal: None,
            loading: false,
            error: None,
        }
    }

    fn open_detail(&mut self, case_id: i64) -> Vec<Action> {
        self.loading = true;
        self.item_row = 0;
        self.item_selection.clear();
        dispatch(Request::CaseDetail(case_id))
    }

    fn cycle_format(&mut self) {
        let all = ExportFormat::ALL;
        let index = all.iter().position(|f| *f == self.export.format).unwrap_or(0);
        self.export.format = all[(index + 1) % all.len()];
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Action> {
        let Some(modal) = self.modal.as_mut() else {
            return Vec::new();
        };
        let actions = match modal {
            Modal::NewCase(form) => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(values) => {
                    let name = values[0].trim().to_string();
                    if name.is_empty() {
                        return vec![Action::Notify(LogLevel::Warning, "Case name is required".into())];
                    }
                    let description = values.get(1).map(|d| d.trim().to_string()).filter(|d| !d.is_empty());
                    dispatch(Request::CreateCase(NewCase {
                        name,
                        description,
                        created_by: self.username.clone(),
                    }))
                }
            },
            Modal::Tag { item_id, form } => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(values) => {
                    let item_id = *item_id;
                    match self.detail.as_ref().and_then(|d| d.tags_with(item_id, &values[0])) {
                        Some(tags) => dispatch(Request::SetTags { item_id, tags }),
                        None => Vec::new(),
                    }
                }
            },
            Modal::Confirm(dialog) => match dialog.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(Pending::DeleteCase(id)) => dispatch(Request::DeleteCase(id)),
                DialogOutcome::Confirmed(Pending::RemoveItem(id)) => dispatch(Request::RemoveItem(id)),
            },
        };
        self.modal = None;
        actions
    }

    fn handle_list_key(&mut self, key: KeyCode) -> Vec<Action> {
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.cases.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.cases.len(), false);
                Vec::new()
            }
            KeyCode::Enter => match self.cases.get(self.selected) {
                Some(case) => {
                    let id = case.id;
                    self.open_detail(id)
                }
                None => Vec::new(),
            },
            KeyCode::Char('n') => {
                self.modal = Some(Modal::NewCase(Form::new(
                    "New case",
                    vec![FormField::text("Name"), FormField::text("Description")],
                )));
                Vec::new()
            }
            KeyCode::Char('d') => {
                if let Some(case) = self.cases.get(self.selected) {
                    self.modal = Some(Modal::Confirm(ConfirmDialog::new(
                        format!("Delete case '{}' and all its items?", case.name),
                        Pending::DeleteCase(case.id),
                    )));
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_detail_key(&mut self, key: KeyCode) -> Vec<Action> {
        let Some(detail) = self.detail.as_ref() else {
            return Vec::new();
        };
        let current = detail.items.get(self.item_row).cloned();
        let item_ids: Vec<i64> = detail.items.iter().map(|i| i.id).collect();
        let case_id = detail.case.id;

        match key {
            KeyCode::Esc | KeyCode::Backspace => {
                self.detail = None;
                dispatch(Request::Cases)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.item_row = components::step(self.item_row, item_ids.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.item_row = components::step(self.item_row, item_ids.len(), false);
                Vec::new()
            }
            KeyCode::Char(' ') if self.can_assign => {
                if let Some(item) = current {
                    self.item_selection.toggle(item.id);
                }
                Vec::new()
            }
            KeyCode::Char('a') if self.can_assign => {
                self.item_selection.toggle_all(&item_ids);
                Vec::new()
            }
            KeyCode::Enter => current
                .map(|item| vec![Action::OpenMessage(item.message_id)])
                .unwrap_or_default(),
            KeyCode::Char('t') => {
                if let Some(item) = current {
                    self.modal = Some(Modal::Tag {
                        item_id: item.id,
                        form: Form::new(format!("Add tag to {}", item.message_id), vec![FormField::text("Tag")]),
                    });
                }
                Vec::new()
            }
            KeyCode::Char('x') => {
                if let Some(item) = current {
                    self.modal = Some(Modal::Confirm(ConfirmDialog::new(
                        format!("Remove message {} from this case?", item.message_id),
                        Pending::RemoveItem(item.id),
                    )));
                }
                Vec::new()
            }
            KeyCode::Char('u') if self.can_assign => {
                if !self.auditors.is_empty() {
                    self.assignee = (self.assignee + 1) % self.auditors.len();
                }
                Vec::new()
            }
            KeyCode::Char('s') if self.can_assign => {
                let Some(assignee) = self.auditors.get(self.assignee).cloned() else {
                    return vec![Action::Notify(LogLevel::Warning, "No auditors to assign".into())];
                };
                if self.item_selection.is_empty() {
                    return vec![Action::Notify(LogLevel::Warning, "Select items to assign first".into())];
                }
                dispatch(Request::Assign {
                    item_ids: self.item_selection.to_vec(),
                    assignee,
                })
            }
            KeyCode::Char('f') => {
                self.cycle_format();
                Vec::new()
            }
            KeyCode::Char('o') => {
                self.export.redact = !self.export.redact;
                Vec::new()
            }
            KeyCode::Char('e') => dispatch(Request::ExportCase {
                case_id,
                request: self.export,
            }),
            _ => Vec::new(),
        }
    }

    fn render_list(&self, f: &mut Frame, area: Rect) {
        if self.cases.is_empty() {
            components::render_empty(f, area, "Cases", "No cases yet. Press n to create one.");
            return;
        }
        let header = Row::new(vec!["ID", "Name", "Status", "Items", "Created"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.cases.iter().map(|c| {
            Row::new(vec![
                c.id.to_string(),
                components::truncate(&c.name, 40),
                c.status.clone(),
                c.item_count.to_string(),
                c.created_at.clone().unwrap_or_default(),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Min(20),
                Constraint::Length(10),
                Constraint::Length(7),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Cases"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, f: &mut Frame, area: Rect, detail: &CaseDetail) {
        let layout = ViewLayout::new(area, 4);
        let assignee = self
            .auditors
            .get(self.assignee)
            .map(|u| u.username.clone())
            .unwrap_or_else(|| "-".to_string());
        let mut meta = vec![
            Span::styled("Export: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}{}", self.export.format, if self.export.redact { " (redacted)" } else { "" })),
        ];
        if self.can_assign {
            meta.push(Span::styled("   Selected: ", Style::default().fg(Color::Gray)));
            meta.push(Span::raw(self.item_selection.len().to_string()));
            meta.push(Span::styled("   Assignee: ", Style::default().fg(Color::Gray)));
            meta.push(Span::raw(assignee));
        }
        let header = Paragraph::new(vec![
            Line::from(detail.case.description.clone().unwrap_or_default()),
            Line::from(meta),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Case #{} {} [{}]", detail.case.id, detail.case.name, detail.case.status)),
        );
        f.render_widget(header, layout.header);

        if detail.items.is_empty() {
            components::render_empty(f, layout.main_content, "Items", "No messages in this case");
            return;
        }
        let ids: Vec<i64> = detail.items.iter().map(|i| i.id).collect();
        let head = Row::new(vec![
            checkbox(self.item_selection.is_all_selected(&ids)),
            "Message",
            "Status",
            "Assignee",
            "Tags",
            "Added",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = detail.items.iter().map(|item| {
            Row::new(vec![
                checkbox(self.item_selection.contains(&item.id)).to_string(),
                components::truncate(&item.message_id, 36),
                item.review_status.to_string(),
                item.assignee_name.clone().unwrap_or_else(|| "-".to_string()),
                item.tags.join(", "),
                item.added_at.clone().unwrap_or_default(),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(36),
                Constraint::Length(10),
                Constraint::Length(14),
                Constraint::Min(10),
                Constraint::Length(20),
            ],
        )
        .header(head)
        .block(Block::default().borders(Borders::ALL).title("Items"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.item_row));
        f.render_stateful_widget(table, layout.main_content, &mut state);
    }
}

impl View for CasesView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
        } else if self.loading && self.cases.is_empty() && self.detail.is_none() {
            components::render_loading_indicator(f, area, "Loading cases...");
        } else if let Some(detail) = &self.detail {
            self.render_detail(f, area, detail);
        } else {
            self.render_list(f, area);
        }

        match &self.modal {
            Some(Modal::NewCase(form)) | Some(Modal::Tag { form, .. }) => form.render(f, area),
            Some(Modal::Confirm(dialog)) => dialog.render(f, area),
            None => {}
        }
    }

    fn get_title(&self) -> String {
        "Cases".to_string()
    }

    fn get_status(&self) -> String {
        match (&self.detail, self.can_assign) {
            (None, _) => "Enter open • n new • d delete".to_string(),
            (Some(_), true) => {
                "Esc back • Space select • a all • t tag • x remove • u assignee • s assign • f format • o redact • e export • Enter message".to_string()
            }
            (Some(_), false) => {
                "Esc back • t tag • x remove • f format • o redact • e export • Enter message".to_string()
            }
        }
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        let mut actions = match &self.detail {
            Some(detail) => dispatch(Request::CaseDetail(detail.case.id)),
            None => dispatch(Request::Cases),
        };
        if self.can_assign {
            actions.extend(dispatch(Request::Users));
        }
        actions
    }

    fn is_capturing_input(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }
        if self.detail.is_some() {
            return self.handle_detail_key(key);
        }
        self.handle_list_key(key)
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::Cases(cases) => {
                self.cases = cases;
                self.selected = self.selected.min(self.cases.len().saturating_sub(1));
            }
            Response::CaseDetail(detail) => {
                self.item_row = self.item_row.min(detail.items.len().saturating_sub(1));
                self.detail = Some(detail);
            }
            Response::Users(users) => {
                self.auditors = users.into_iter().filter(|u| u.role == Role::Auditor).collect();
                self.assignee = 0;
            }
            Response::TagsSet { item_id, tags } => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.set_tags(item_id, tags);
                }
            }
            Response::ItemRemoved(item_id) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.remove_item(item_id);
                    self.item_selection.clear();
                    self.item_row = self.item_row.min(detail.items.len().saturating_sub(1));
                }
            }
            Response::Assigned { item_ids, assignee } => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.apply_assignment(&item_ids, assignee.id, Some(&assignee.username));
                }
                self.item_selection.clear();
                return vec![Action::Notify(
                    LogLevel::Success,
                    format!("Assigned {} items to {}", item_ids.len(), assignee.username),
                )];
            }
            Response::CaseExported(ticket) => {
                let status = ticket.status.unwrap_or_else(|| "ready".to_string());
                return vec![Action::Notify(
                    LogLevel::Success,
                    format!("Export {}: {}", status, ticket.download_url),
                )];
            }
            Response::Done(_) => return self.refresh(),
            Response::Failed(message) => {
                if self.cases.is_empty() && self.detail.is_none() {
                    self.error = Some(message);
                }
            }
            _ => {}
        }
        Vec::new()
    }
}
