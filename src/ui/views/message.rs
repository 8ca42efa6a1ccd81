use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::ui::components::{self, integrity_span};
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::view::{dispatch, View};
use crate::workflows::MessageView as LoadedMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pane {
    Body,
    Redacted,
    Headers,
    Thread,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Body => Pane::Redacted,
            Pane::Redacted => Pane::Headers,
            Pane::Headers => Pane::Thread,
            Pane::Thread => Pane::Body,
        }
    }

    fn title(self) -> &'static str {
        match self {
            Pane::Body => "Body",
            Pane::Redacted => "Redacted preview",
            Pane::Headers => "Headers",
            Pane::Thread => "Thread",
        }
    }
}

/// Message overlay: body, redacted preview, PII findings, integrity and thread
pub struct MessageView {
    message_id: String,
    loaded: Option<Box<LoadedMessage>>,
    error: Option<String>,
    pane: Pane,
    scroll: u16,
}

impl MessageView {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            loaded: None,
            error: None,
            pane: Pane::Body,
            scroll: 0,
        }
    }

    fn summary_lines(&self, loaded: &LoadedMessage) -> Vec<Line<'static>> {
        let pii = match &loaded.pii {
            Some(scan) if scan.pii_detected => {
                let labels: Vec<String> = scan.entities.iter().map(|e| e.label.clone()).collect();
                Span::styled(
                    format!("PII detected: {}", labels.join(", ")),
                    Style::default().fg(Color::Red),
                )
            }
            Some(_) => Span::styled("No PII detected", Style::default().fg(Color::Green)),
            None => Span::styled("PII scan unavailable", Style::default().fg(Color::DarkGray)),
        };
        let attachments = if loaded.message.attachments.is_empty() {
            "none".to_string()
        } else {
            loaded
                .message
                .attachments
                .iter()
                .map(|a| format!("{} ({})", a.filename, components::format_bytes(a.size)))
                .collect::<Vec<_>>()
                .join(", ")
        };

        vec![
            Line::from(vec![
                Span::styled("Integrity: ", Style::default().fg(Color::Gray)),
                integrity_span(loaded.integrity.status),
                Span::raw("   "),
                pii,
            ]),
            Line::from(vec![
                Span::styled("Attachments: ", Style::default().fg(Color::Gray)),
                Span::raw(attachments),
            ]),
        ]
    }

    fn pane_lines(&self, loaded: &LoadedMessage) -> Vec<Line<'static>> {
        match self.pane {
            Pane::Body => loaded.body.lines().map(|l| Line::from(l.to_string())).collect(),
            Pane::Redacted => match &loaded.redacted {
                Some(text) => text.lines().map(|l| Line::from(l.to_string())).collect(),
                None => vec![Line::from("Redacted preview unavailable")],
            },
            Pane::Headers if loaded.headers.is_empty() => vec![Line::from("No headers")],
            Pane::Headers => loaded
                .headers
                .iter()
                .map(|h| {
                    Line::from(vec![
                        Span::styled(format!("{}: ", h.name), Style::default().add_modifier(Modifier::BOLD)),
                        Span::raw(h.value.clone()),
                    ])
                })
                .collect(),
            Pane::Thread if loaded.thread.is_empty() => vec![Line::from("No other messages in this thread")],
            Pane::Thread => loaded
                .thread
                .iter()
                .map(|m| {
                    Line::from(format!(
                        "{}  {}  {}",
                        m.date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
                        components::truncate(&m.from, 30),
                        m.subject_label()
                    ))
                })
                .collect(),
        }
    }
}

impl View for MessageView {
    fn render(&self, f: &mut Frame, area: Rect) {
        let title = format!("Message {}", self.message_id);
        let Some(loaded) = &self.loaded else {
            match &self.error {
                Some(error) => components::render_error(f, area, error),
                None => components::render_loading_indicator(f, area, "Loading message..."),
            }
            return;
        };

        let layout = ViewLayout::new(area, 4);
        let summary = Paragraph::new(self.summary_lines(loaded))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(summary, layout.header);

        let sections = layout.split_main_content_vertical(&[Constraint::Min(0)]);
        let pane = Paragraph::new(self.pane_lines(loaded))
            .block(Block::default().borders(Borders::ALL).title(self.pane.title()))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0));
        f.render_widget(pane, sections[0]);
    }

    fn get_title(&self) -> String {
        "Message".to_string()
    }

    fn get_status(&self) -> String {
        "Esc close • v switch pane • ↑/↓ scroll".to_string()
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loaded = None;
        self.error = None;
        dispatch(Request::Message(self.message_id.clone()))
    }

    fn handle_key(&mut self, key: KeyCode) -> Vec<Action> {
        match key {
            KeyCode::Char('v') => {
                self.pane = self.pane.next();
                self.scroll = 0;
            }
            KeyCode::Down | KeyCode::Char('j') => self.scroll = self.scroll.saturating_add(1),
            KeyCode::Up | KeyCode::Char('k') => self.scroll = self.scroll.saturating_sub(1),
            KeyCode::PageDown => self.scroll = self.scroll.saturating_add(10),
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
        Vec::new()
    }

    fn handle_response(&mut self, response: Response) -> Vec<Action> {
        match response {
            Response::Message(loaded) => self.loaded = Some(loaded),
            Response::Failed(message) => self.error = Some(message),
            _ => {}
        }
        Vec::new()
    }
}
