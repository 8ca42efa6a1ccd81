use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::export;
use crate::models::{Case, MessageHit};
use crate::search::{parse_address, Pager, SearchFilters, SearchRequest};
use crate::selection::Selection;
use crate::ui::components::{self, checkbox, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

const FILTER_FIELDS: [&str; 8] = [
    "From",
    "To",
    "Date start (YYYY-MM-DD)",
    "Date end (YYYY-MM-DD)",
    "Direction (sent/received/internal)",
    "Attachment keyword",
    "Has attachments (y/n)",
    "Spam (y/n)",
];

fn yes(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "y" | "yes" | "true" | "1")
}

fn flag(value: bool) -> &'static str {
    if value {
        "y"
    } else {
        ""
    }
}

/// Full-text search over the archive with bulk hold, case and CSV actions
pub struct SearchView {
    org_id: i64,
    user_domain: Option<String>,
    query: String,
    editing_query: bool,
    filters: SearchFilters,
    filter_form: Option<Form>,
    pager: Pager,
    hits: Vec<MessageHit>,
    selected_row: usize,
    selection: Selection<String>,
    open_cases: Vec<Case>,
    target_case: usize,
    loading: bool,
    error: Option<String>,
}

impl SearchView {
    pub fn new(org_id: i64, user_domain: Option<String>, page_size: usize) -> Self {
        Self {
            org_id,
            user_domain,
            query: String::new(),
            editing_query: false,
            filters: SearchFilters::default(),
            filter_form: None,
            pager: Pager::new(page_size),
            hits: Vec::new(),
            selected_row: 0,
            selection: Selection::new(),
            open_cases: Vec::new(),
            target_case: 0,
            loading: false,
            error: None,
        }
    }

    fn request(&self) -> SearchRequest {
        SearchRequest::new(self.org_id, self.query.clone())
            .with_user_domain(self.user_domain.clone())
            .with_filters(self.filters.clone())
            .with_page(&self.pager)
    }

    fn search(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        dispatch(Request::Search(self.request()))
    }

    /// New query or filters start again from page one
    fn new_search(&mut self) -> Vec<Action> {
        self.pager.reset();
        self.selected_row = 0;
        self.search()
    }

    fn visible_ids(&self) -> Vec<String> {
        self.hits.iter().map(|h| h.id.clone()).collect()
    }

    fn target_case(&self) -> Option<&Case> {
        self.open_cases.get(self.target_case)
    }

    fn filter_form(&self) -> Form {
        let f = &self.filters;
        let values = [
            f.from.clone(),
            f.to.clone(),
            f.date_start.clone(),
            f.date_end.clone(),
            f.direction.map(|d| d.to_string()).unwrap_or_default(),
            f.attachment_keyword.clone(),
            flag(f.has_attachments).to_string(),
            flag(f.is_spam).to_string(),
        ];
        let fields = FILTER_FIELDS
            .into_iter()
            .zip(values)
            .map(|(label, value)| FormField::text(label).with_value(value))
            .collect();
        Form::new("Advanced filters", fields)
    }

    fn apply_filter_values(&mut self, values: Vec<String>) -> Vec<Action> {
        let value = |i: usize| values.get(i).map(|v| v.trim().to_string()).unwrap_or_default();
        let direction = value(4);
        let direction = if direction.is_empty() {
            None
        } else {
            match direction.parse() {
                Ok(d) => Some(d),
                Err(e) => return vec![Action::Notify(LogLevel::Warning, e)],
            }
        };

        self.filters = SearchFilters {
            from: value(0),
            to: value(1),
            date_start: value(2),
            date_end: value(3),
            direction,
            attachment_keyword: value(5),
            has_attachments: yes(&value(6)),
            is_spam: yes(&value(7)),
        };
        self.new_search()
    }

    fn handle_query_key(&mut self, key: KeyCode) -> Vec<Action> {
        match key {
            KeyCode::Enter => {
                self.editing_query = false;
                self.new_search()
            }
            KeyCode::Esc => {
                self.editing_query = false;
                Vec::new()
            }
            KeyCode::Backspace => {
                self.query.pop();
                Vec::new()
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render_header(&self, f: &mut Frame, area: Rect) {
        let query_style = if self.editing_query {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if self.editing_query { "_" } else { "" };
        let mut filter_bits = Vec::new();
        let fl = &self.filters;
        for (label, value) in [("from", &fl.from), ("to", &fl.to), ("after", &fl.date_start), ("before", &fl.date_end)] {
            if !value.is_empty() {
                filter_bits.push(format!("{}:{}", label, value));
            }
        }
        if let Some(direction) = fl.direction {
            filter_bits.push(direction.to_string());
        }
        if fl.has_attachments {
            filter_bits.push("attachments".to_string());
        }
        if fl.is_spam {
            filter_bits.push("spam".to_string());
        }
        if !fl.attachment_keyword.is_empty() {
            filter_bits.push(format!("attachment:{}", fl.attachment_keyword));
        }

        let case_label = self
            .target_case()
            .map(|c| format!("#{} {}", c.id, c.name))
            .unwrap_or_else(|| "none open".to_string());

        let lines = vec![
            Line::from(vec![
                Span::styled("Query: ", Style::default().fg(Color::Gray)),
                Span::styled(format!("{}{}", self.query, cursor), query_style),
            ]),
            Line::from(vec![
                Span::styled("Filters: ", Style::default().fg(Color::Gray)),
                Span::raw(if filter_bits.is_empty() { "none".to_string() } else { filter_bits.join(", ") }),
                Span::styled("   Target case: ", Style::default().fg(Color::Gray)),
                Span::raw(case_label),
                Span::styled("   Selected: ", Style::default().fg(Color::Gray)),
                Span::raw(self.selection.len().to_string()),
            ]),
        ];
        let block = Block::default().borders(Borders::ALL).title("Archive Search");
        f.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn render_results(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
            return;
        }
        if self.loading && self.hits.is_empty() {
            components::render_loading_indicator(f, area, "Searching archive...");
            return;
        }
        if self.hits.is_empty() {
            components::render_empty(f, area, "Results", "No messages found");
            return;
        }

        let header = Row::new(vec![
            checkbox(self.selection.is_all_selected(&self.visible_ids())),
            "From",
            "Subject",
            "Date",
            "Size",
            "",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = self.hits.iter().map(|hit| {
            let (name, email) = parse_address(&hit.from);
            let from = if name.is_empty() { email } else { name };
            let mut flags = String::new();
            if hit.has_attachments {
                flags.push('@');
            }
            if hit.is_on_hold {
                flags.push('H');
            }
            if hit.is_spam {
                flags.push('S');
            }
            Row::new(vec![
                checkbox(self.selection.contains(&hit.id)).to_string(),
                components::truncate(&from, 28),
                components::truncate(hit.subject_label(), 60),
                hit.date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                hit.size.map(components::format_bytes).unwrap_or_default(),
                flags,
            ])
        });

        let title = format!(
            "Results {} (page {}/{})",
            self.pager.range_label(self.hits.len()),
            self.pager.page,
            self.pager.total_pages()
        );
        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Length(28),
                Constraint::Min(20),
                Constraint::Length(16),
                Constraint::Length(9),
                Constraint::Length(3),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray));

        let mut state = TableState::default().with_selected(Some(self.selected_row));
        f.render_stateful_widget(table, area, &mut state);
    }
}

impl View for SearchView {
    fn render(&self, f: &mut Frame, area: Rect) {
        let layout = ViewLayout::new(area, 4);
        self.render_header(f, layout.header);
        self.render_results(f, layout.main_content);
        if let Some(form) = &self.filter_form {
            form.render(f, area);
        }
    }

    fn get_title(&self) -> String {
        "Search".to_string()
    }

    fn get_status(&self) -> String {
        if self.editing_query {
            "Type query • Enter search • Esc done".to_string()
        } else {
            "/ query • f filters • x clear • Space select • a all • n/p page • Enter open • h hold • c add to case • [ ] case • e CSV".to_string()
        }
    }

    fn on_enter(&mut self) -> Vec<Action> {
        let mut actions = dispatch(Request::OpenCases);
        actions.extend(self.search());
        actions
    }

    fn is_capturing_input(&self) -> bool {
        self.editing_query || self.filter_form.is_some()
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        if let Some(form) = self.filter_form.as_mut() {
            return match form.handle_key(key) {
                DialogOutcome::Pending => Vec::new(),
                DialogOutcome::Cancelled => {
                    self.filter_form = None;
                    Vec::new()
                }
                DialogOutcome::Confirmed(values) => {
                    self.filter_form = None;
                    self.apply_filter_values(values)
                }
            };
        }
        if self.editing_query {
            return self.handle_query_key(key);
        }

        match key {
            KeyCode::Char('/') => {
                self.editing_query = true;
                Vec::new()
            }
            KeyCode::Char('f') => {
                self.filter_form = Some(self.filter_form());
                Vec::new()
            }
            KeyCode::Char('x') => {
                self.filters = SearchFilters::default();
                self.query.clear();
                self.new_search()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_row = components::step(self.selected_row, self.hits.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_row = components::step(self.selected_row, self.hits.len(), false);
                Vec::new()
            }
            KeyCode::Char(' ') => {
                if let Some(hit) = self.hits.get(self.selected_row) {
                    self.selection.toggle(hit.id.clone());
                }
                Vec::new()
            }
            KeyCode::Char('a') => {
                let visible = self.visible_ids();
                self.selection.toggle_all(&visible);
                Vec::new()
            }
            KeyCode::Char('n') | KeyCode::Right => {
                if self.pager.next() {
                    self.selected_row = 0;
                    self.search()
                } else {
                    Vec::new()
                }
            }
            KeyCode::Char('p') | KeyCode::Left => {
                if self.pager.previous() {
                    self.selected_row = 0;
                    self.search()
                } else {
                    Vec::new()
                }
            }
            KeyCode::Enter => self
                .hits
                .get(self.selected_row)
                .map(|hit| vec![Action::OpenMessage(hit.id.clone())])
                .unwrap_or_default(),
            KeyCode::Char('h') => {
                if self.selection.is_empty() {
                    return vec![Action::Notify(LogLevel::Warning, "Select messages to hold first".into())];
                }
                dispatch(Request::ApplyHold(self.selection.to_vec()))
            }
            KeyCode::Char('c') => {
                if self.selection.is_empty() {
                    return vec![Action::Notify(LogLevel::Warning, "Select messages to add first".into())];
                }
                dispatch(Request::AddToCase {
                    case_id: self.target_case().map(|c| c.id),
                    message_ids: self.selection.to_vec(),
                })
            }
            KeyCode::Char(']') => {
                if !self.open_cases.is_empty() {
                    self.target_case = (self.target_case + 1) % self.open_cases.len();
                }
                Vec::new()
            }
            KeyCode::Char('[') => {
                if !self.open_cases.is_empty() {
                    self.target_case = self.target_case.checked_sub(1).unwrap_or(self.open_cases.len() - 1);
                }
                Vec::new()
            }
            KeyCode::Char('e') => {
                let rows: Vec<MessageHit> = export::rows_to_export(&self.hits, &self.selection)
                    .into_iter()
                    .cloned()
                    .collect();
                if rows.is_empty() {
                    return vec![Action::Notify(LogLevel::Warning, "Nothing to export".into())];
                }
                dispatch(Request::ExportCsv {
                    rows,
                    selected: !self.selection.is_empty(),
                })
            }
            _ => Vec::new(),
        }
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        match response {
            Response::SearchResults(results) => {
                self.loading = false;
                self.pager.total = results.estimated_total_hits;
                self.hits = results.hits;
                self.selected_row = self.selected_row.min(self.hits.len().saturating_sub(1));
            }
            Response::OpenCases(cases) => {
                self.open_cases = cases;
                self.target_case = 0;
            }
            Response::HoldApplied(Some(applied)) => {
                self.selection.clear();
                let how = if applied.created { "new hold" } else { "hold" };
                return vec![Action::Notify(
                    LogLevel::Success,
                    format!("Placed {} messages on {} {}", applied.count, how, applied.hold_id),
                )];
            }
            Response::AddedToCase(count) => {
                self.selection.clear();
                let case = self.target_case().map(|c| c.name.clone()).unwrap_or_default();
                return vec![Action::Notify(LogLevel::Success, format!("Added {} messages to {}", count, case))];
            }
            Response::CsvExported { path, count } => {
                return vec![Action::Notify(
                    LogLevel::Success,
                    format!("Exported {} messages to {}", count, path.display()),
                )];
            }
            Response::Failed(message) => {
                self.loading = false;
                if self.hits.is_empty() {
                    self.error = Some(message);
                }
            }
            _ => {}
        }
        Vec::new()
    }
}
