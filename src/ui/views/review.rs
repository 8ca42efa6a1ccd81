use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{Assignment, ReviewStats, ReviewStatus};
use crate::ui::components;
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::view::{dispatch, View};
use crate::workflows::set_review_status;

fn status_style(status: ReviewStatus) -> Style {
    match status {
        ReviewStatus::Pending => Style::default().fg(Color::Yellow),
        ReviewStatus::InReview => Style::default().fg(Color::Cyan),
        ReviewStatus::Completed => Style::default().fg(Color::Green),
    }
}

/// Auditor review queue
pub struct ReviewView {
    assignments: Vec<Assignment>,
    selected: usize,
    loading: bool,
    error: Option<String>,
}

impl Default for ReviewView {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewView {
    pub fn new() -> Self {
        Self {
            assignments: Vec::new(),
            selected: 0,
            loading: false,
            error: None,
        }
    }

    fn render_stats(&self, f: &mut Frame, area: Rect) {
        let stats = ReviewStats::from_assignments(&self.assignments);
        let line = Line::from(vec![
            Span::raw(format!("Total {}   ", stats.total)),
            Span::styled(format!("Pending {}   ", stats.pending), status_style(ReviewStatus::Pending)),
            Span::styled(format!("In review {}   ", stats.in_review), status_style(ReviewStatus::InReview)),
            Span::styled(format!("Completed {}", stats.completed), status_style(ReviewStatus::Completed)),
        ]);
        let paragraph = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("My Assignments"));
        f.render_widget(paragraph, area);
    }
}

impl View for ReviewView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if let Some(error) = &self.error {
            components::render_error(f, area, error);
            return;
        }
        if self.loading && self.assignments.is_empty() {
            components::render_loading_indicator(f, area, "Loading assignments...");
            return;
        }

        let layout = ViewLayout::new(area, 3);
        self.render_stats(f, layout.header);

        if self.assignments.is_empty() {
            components::render_empty(f, layout.main_content, "Queue", "Nothing assigned to you");
            return;
        }
        let header = Row::new(vec!["Message", "Case", "Tags", "Assigned", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let rows = self.assignments.iter().map(|a| {
            Row::new(vec![
                Span::raw(components::truncate(&a.message_id, 36)),
                Span::raw(components::truncate(&a.case_name, 30)),
                Span::raw(a.tags.join(", ")),
                Span::raw(a.added_at.clone().unwrap_or_default()),
                Span::styled(a.review_status.to_string(), status_style(a.review_status)),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(36),
                Constraint::Length(30),
                Constraint::Min(15),
                Constraint::Length(20),
                Constraint::Length(10),
            ],
        )
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Queue"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, layout.main_content, &mut state);
    }

    fn get_title(&self) -> String {
        "My Assignments".to_string()
    }

    fn get_status(&self) -> String {
        "Enter open message • s advance status".to_string()
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        self.error = None;
        dispatch(Request::Assignments)
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.assignments.len(), true);
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.assignments.len(), false);
                Vec::new()
            }
            KeyCode::Enter => self
                .assignments
                .get(self.selected)
                .map(|a| vec![Action::OpenMessage(a.message_id.clone())])
                .unwrap_or_default(),
            KeyCode::Char('s') => self
                .assignments
                .get(self.selected)
                .map(|a| {
                    dispatch(Request::SetReviewStatus {
                        item_id: a.id,
                        status: a.review_status.cycle(),
                    })
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        self.loading = false;
        match response {
            Response::Assignments(assignments) => {
                self.assignments = assignments;
                self.selected = self.selected.min(self.assignments.len().saturating_sub(1));
            }
            Response::ReviewStatusSet { item_id, status } => {
                set_review_status(&mut self.assignments, item_id, status);
            }
            Response::Failed(message) if self.assignments.is_empty() => self.error = Some(message),
            _ => {}
        }
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assignment(id: i64, status: ReviewStatus) -> Assignment {
        Assignment {
            id,
            message_id: format!("m{}", id),
            case_id: Some(1),
            case_name: "Acme".into(),
            added_at: None,
            review_status: status,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_status_cycles_and_applies_locally() {
        let mut view = ReviewView::new();
        view.handle_response(Response::Assignments(vec![
            assignment(1, ReviewStatus::Pending),
            assignment(2, ReviewStatus::InReview),
        ]));
        view.handle_key(KeyCode::Down);

        let actions = view.handle_key(KeyCode::Char('s'));
        assert!(matches!(
            &actions[..],
            [Action::Dispatch(Request::SetReviewStatus { item_id: 2, status: ReviewStatus::Completed })]
        ));

        view.handle_response(Response::ReviewStatusSet {
            item_id: 2,
            status: ReviewStatus::Completed,
        });
        let stats = ReviewStats::from_assignments(&view.assignments);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_enter_opens_message() {
        let mut view = ReviewView::new();
        assert!(view.handle_key(KeyCode::Enter).is_empty());
        view.handle_response(Response::Assignments(vec![assignment(4, ReviewStatus::Pending)]));
        assert!(matches!(&view.handle_key(KeyCode::Enter)[..], [Action::OpenMessage(id)] if id == "m4"));
    }
}
