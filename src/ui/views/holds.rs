use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{HoldDetail, LegalHold, NewHold};
use crate::search::hold_criteria;
use crate::ui::components::{self, ConfirmDialog, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

enum Modal {
    Create(Form),
    Release(ConfirmDialog<String>),
}

/// Legal holds: list, criteria-based creation, release and held items
pub struct HoldsView {
    holds: Vec<LegalHold>,
    selected: usize,
    detail: Option<HoldDetail>,
    item_row: usize,
    modal: Option<Modal>,
    loading: bool,
    error: Option<String>,
}

impl Default for HoldsView {
    fn default() -> Self {
        Self::new()
    }
}

impl HoldsView {
    pub fn new() -> Self {
        Self {
            holds: Vec::new(),
            selected: 0,
            detail: None,
            item_row: 0,
            modal: None,
            loading: false,
            error: None,
        }
    }

    fn create_form() -> Form {
        Form::new(
            "New legal hold",
            vec![
                FormField::text("Name"),
                FormField::text("Reason"),
                FormField::text("Criteria: from"),
                FormField::text("Criteria: to"),
                FormField::text("Criteria: subject"),
            ],
        )
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Action> {
        let actions = match self.modal.as_mut() {
            None => return Vec::new(),
            Some(Modal::Create(form)) => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(values) => {
                    let name = values[0].trim().to_string();
                    if name.is_empty() {
                        return vec![Action::Notify(LogLevel::Warning, "Hold name is required".into())];
                    }
                    dispatch(Request::CreateHold(NewHold {
                        name,
                        reason: values[1].trim().to_string(),
                        filter_criteria: hold_criteria(&values[2], &values[3], &values[4]),
                    }))
                }
            },
            Some(Modal::Release(dialog)) => match dialog.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(id) => dispatch(Request::ReleaseHold(id)),
            },
        };
        self.modal = None;
        actions
    }

    fn render_list(&self, f: &mut Frame, area: Rect) {
        if self.holds.is_empty() {
            components::render_empty(f, area, "Legal Holds", "No legal holds. Press n to create one.");
            return;
        }
        let header = Row::new(vec!["Name", "Reason", "Criteria", "Items", "Status", "Created"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.holds.iter().map(|h| {
            let status = if h.active { "ACTIVE" } else { "RELEASED" };
            Row::new(vec![
                components::truncate(&h.name, 30),
                components::truncate(h.reason.as_deref().unwrap_or(""), 30),
                components::truncate(&h.criteria_summary(), 40),
                h.item_count.to_string(),
                status.to_string(),
                h.created_at.clone().unwrap_or_default(),
            ])
            .style(if h.active {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            })
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(30),
                Constraint::Length(30),
                Constraint::Min(20),
                Constraint::Length(6),
                Constraint::Length(9),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Legal Holds"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn render_detail(&self, f: &mut Frame, area: Rect, detail: &HoldDetail) {
        let layout = ViewLayout::new(area, 4);
        let hold = &detail.hold;
        let header = Paragraph::new(vec![
            Line::from(format!("Reason: {}", hold.reason.as_deref().unwrap_or("-"))),
            Line::from(format!("Criteria: {}", hold.criteria_summary())),
        ])
        .block(Block::default().borders(Borders::ALL).title(format!("Hold {}", hold.name)));
        f.render_widget(header, layout.header);

        if detail.items.is_empty() {
            components::render_empty(f, layout.main_content, "Held messages", "No messages held");
            return;
        }
        let header = Row::new(vec!["Message", "From", "Subject", "Date", "Held since"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = detail.items.iter().map(|item| {
            Row::new(vec![
                components::truncate(&item.message_id, 36),
                components::truncate(item.from.as_deref().unwrap_or(""), 28),
                components::truncate(item.subject.as_deref().unwrap_or(""), 50),
                item.date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                item.added_at.clone().unwrap_or_default(),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(36),
                Constraint::Length(28),
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(20),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Held messages"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.item_row));
        f.render_stateful_widget(table, layout.main_content, &mut state);
    }
}

impl View for HoldsView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
        } else if self.loading && self.holds.is_empty() && self.detail.is_none() {
            components::render_loading_indicator(f, area, "Loading legal holds...");
        } else if let Some(detail) = &self.detail {
            self.render_detail(f, area, detail);
        } else {
            self.render_list(f, area);
        }

        match &self.modal {
            Some(Modal::Create(form)) => form.render(f, area),
            Some(Modal::Release(dialog)) => dialog.render(f, area),
            None => {}
        }
    }

    fn get_title(&self) -> String {
        "Legal Holds".to_string()
    }

    fn get_status(&self) -> String {
        if self.detail.is_some() {
            "Esc back • Enter open message".to_string()
        } else {
            "Enter held items • n new hold • x release".to_string()
        }
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        match &self.detail {
            Some(detail) => dispatch(Request::HoldDetail(detail.hold.id.clone())),
            None => dispatch(Request::Holds),
        }
    }

    fn is_capturing_input(&self) -> bool {
        self.modal.is_some()
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        if let Some(detail) = &self.detail {
            return match key {
                KeyCode::Esc | KeyCode::Backspace => {
                    self.detail = None;
                    dispatch(Request::Holds)
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    self.item_row = components::step(self.item_row, detail.items.len(), true);
                    Vec::new()
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.item_row = components::step(self.item_row, detail.items.len(), false);
                    Vec::new()
                }
                KeyCode::Enter => detail
                    .items
                    .get(self.item_row)
                    .map(|item| vec![Action::OpenMessage(item.message_id.clone())])
                    .unwrap_or_default(),
                _ => Vec::new(),
            };
        }

        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.holds.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.holds.len(), false);
                Vec::new()
            }
            KeyCode::Enter => match self.holds.get(self.selected) {
                Some(hold) => {
                    let id = hold.id.clone();
                    self.loading = true;
                    self.item_row = 0;
                    dispatch(Request::HoldDetail(id))
                }
                None => Vec::new(),
            },
            KeyCode::Char('n') => {
                self.modal = Some(Modal::Create(Self::create_form()));
                Vec::new()
            }
            KeyCode::Char('x') => {
                match self.holds.get(self.selected) {
                    Some(hold) if hold.active => {
                        self.modal = Some(Modal::Release(ConfirmDialog::new(
                            format!("Release hold '{}'? Held messages become deletable again.", hold.name),
                            hold.id.clone(),
                        )));
                    }
                    Some(_) => {
                        return vec![Action::Notify(LogLevel::Warning, "Hold is already released".into())];
                    }
                    None => {}
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::Holds(holds) => {
                self.holds = holds;
                self.selected = self.selected.min(self.holds.len().saturating_sub(1));
            }
            Response::HoldDetail(detail) => self.detail = Some(detail),
            Response::Done(_) => return self.refresh(),
            Response::Failed(message) => {
                if self.holds.is_empty() && self.detail.is_none() {
                    self.error = Some(message);
                }
            }
            _ => {}
        }
        Vec::new()
    }
}
