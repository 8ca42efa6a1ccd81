/// UI components and utilities for the archive dashboard
use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::models::IntegrityStatus;
use crate::ui::state::LogLevel;

/// Render a loading indicator
pub fn render_loading_indicator(f: &mut Frame, area: Rect, message: &str) {
    let loading = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title("Loading"))
        .style(Style::default().fg(Color::Yellow));

    f.render_widget(loading, area);
}

/// Render error message
pub fn render_error(f: &mut Frame, area: Rect, error: &str) {
    let error_paragraph = Paragraph::new(error)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true });

    f.render_widget(error_paragraph, area);
}

/// Render a placeholder for empty tables
pub fn render_empty(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let paragraph = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(paragraph, area);
}

/// Format byte counts the way the dashboard shows storage
pub fn format_bytes(bytes: u64) -> String {
    let value = bytes as f64;
    if value >= 1_099_511_627_776.0 {
        format!("{:.1} TB", value / 1_099_511_627_776.0)
    } else if value >= 1_073_741_824.0 {
        format!("{:.1} GB", value / 1_073_741_824.0)
    } else if value >= 1_048_576.0 {
        format!("{:.1} MB", value / 1_048_576.0)
    } else if value >= 1_024.0 {
        format!("{:.1} KB", value / 1_024.0)
    } else {
        format!("{} B", bytes)
    }
}

/// Format large counts with K/M/B suffixes
pub fn format_count(value: u64) -> String {
    let value = value as f64;
    if value >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{:.0}", value)
    }
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", kept)
}

pub fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

pub fn level_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Info => Style::default().fg(Color::White),
        LogLevel::Success => Style::default().fg(Color::Green),
        LogLevel::Warning => Style::default().fg(Color::Yellow),
        LogLevel::Error => Style::default().fg(Color::Red),
    }
}

/// Integrity verdict badge
pub fn integrity_span(status: IntegrityStatus) -> Span<'static> {
    let (label, color) = match status {
        IntegrityStatus::Valid => ("VERIFIED", Color::Green),
        IntegrityStatus::Tampered => ("TAMPERED", Color::Red),
        IntegrityStatus::Error => ("CHECK FAILED", Color::Red),
        IntegrityStatus::Unavailable => ("UNVERIFIED", Color::DarkGray),
    };
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

/// Rect of the given percentage size centered in `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Yes/no dialog guarding a destructive action
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmDialog<T> {
    pub prompt: String,
    pub selected_option: bool, // true = yes
    pub payload: T,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DialogOutcome<T> {
    Pending,
    Cancelled,
    Confirmed(T),
}

impl<T: Clone> ConfirmDialog<T> {
    pub fn new(prompt: impl Into<String>, payload: T) -> Self {
        Self {
            prompt: prompt.into(),
            selected_option: false,
            payload,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DialogOutcome<T> {
        match key {
            KeyCode::Left | KeyCode::Right | KeyCode::Tab => {
                self.selected_option = !self.selected_option;
                DialogOutcome::Pending
            }
            KeyCode::Char('y') | KeyCode::Char('Y') => DialogOutcome::Confirmed(self.payload.clone()),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => DialogOutcome::Cancelled,
            KeyCode::Enter if self.selected_option => DialogOutcome::Confirmed(self.payload.clone()),
            KeyCode::Enter => DialogOutcome::Cancelled,
            _ => DialogOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let popup = centered_rect(50, 25, area);
        let option = |label: &'static str, active: bool| {
            let style = if active {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(label, style)
        };
        let lines = vec![
            Line::from(self.prompt.clone()),
            Line::from(""),
            Line::from(vec![
                option(" Yes ", self.selected_option),
                Span::raw("   "),
                option(" No ", !self.selected_option),
            ]),
        ];
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Confirm"))
            .wrap(Wrap { trim: true });
        f.render_widget(Clear, popup);
        f.render_widget(paragraph, popup);
    }
}

/// One labelled text input
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub label: &'static str,
    pub value: String,
    pub secret: bool,
}

impl FormField {
    pub fn text(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            secret: false,
        }
    }

    pub fn secret(label: &'static str) -> Self {
        Self {
            secret: true,
            ..Self::text(label)
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }
}

/// Modal form; Enter on the last field submits, Esc cancels
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    pub title: String,
    pub fields: Vec<FormField>,
    pub focused: usize,
}

impl Form {
    pub fn new(title: impl Into<String>, fields: Vec<FormField>) -> Self {
        Self {
            title: title.into(),
            fields,
            focused: 0,
        }
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn handle_key(&mut self, key: KeyCode) -> DialogOutcome<Vec<String>> {
        match key {
            KeyCode::Esc => DialogOutcome::Cancelled,
            KeyCode::Down | KeyCode::Tab => {
                self.focused = (self.focused + 1) % self.fields.len().max(1);
                DialogOutcome::Pending
            }
            KeyCode::Up | KeyCode::BackTab => {
                self.focused = self.focused.checked_sub(1).unwrap_or(self.fields.len().saturating_sub(1));
                DialogOutcome::Pending
            }
            KeyCode::Enter if self.focused + 1 >= self.fields.len() => {
                DialogOutcome::Confirmed(self.fields.iter().map(|f| f.value.clone()).collect())
            }
            KeyCode::Enter => {
                self.focused += 1;
                DialogOutcome::Pending
            }
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    field.value.pop();
                }
                DialogOutcome::Pending
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focused) {
                    field.value.push(c);
                }
                DialogOutcome::Pending
            }
            _ => DialogOutcome::Pending,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let height = (self.fields.len() as u16 * 2 + 4).min(area.height);
        let popup = centered_rect(60, 100, area);
        let popup = Rect {
            y: area.y + area.height.saturating_sub(height) / 2,
            height,
            ..popup
        };

        let mut lines = Vec::with_capacity(self.fields.len() * 2 + 1);
        for (i, field) in self.fields.iter().enumerate() {
            let focused = i == self.focused;
            let shown = if field.secret {
                "*".repeat(field.value.chars().count())
            } else {
                field.value.clone()
            };
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            lines.push(Line::from(Span::styled(format!("{}:", field.label), label_style)));
            let cursor = if focused { "_" } else { "" };
            lines.push(Line::from(format!("  {}{}", shown, cursor)));
        }
        lines.push(Line::from(Span::styled(
            "Enter next/submit • Tab move • Esc cancel",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.title.clone()),
        );
        f.render_widget(Clear, popup);
        f.render_widget(paragraph, popup);
    }
}

/// Move a list cursor within `len` rows
pub fn step(selected: usize, len: usize, forward: bool) -> usize {
    if len == 0 {
        0
    } else if forward {
        (selected + 1).min(len - 1)
    } else {
        selected.saturating_sub(1)
    }
}
