use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Centralized layout management to prevent conflicts between views
pub struct TuiLayout {
    pub tab_bar: Rect,
    pub content: Rect,
    pub status_bar: Rect,
}

impl TuiLayout {
    /// Create a new layout from the given area
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Content
                Constraint::Length(4), // Status bar
            ])
            .split(area);

        Self {
            tab_bar: chunks[0],
            content: chunks[1],
            status_bar: chunks[2],
        }
    }

    /// Render the tab bar
    pub fn render_tab_bar(&self, f: &mut Frame, titles: Vec<String>, selected_tab: usize, heading: &str) {
        let titles: Vec<String> = titles
            .into_iter()
            .enumerate()
            .map(|(i, t)| format!("{} {}", i + 1, t))
            .collect();
        let tabs = Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title(heading.to_string()))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(selected_tab);

        f.render_widget(tabs, self.tab_bar);
    }

    /// Render the status bar: global keys, view keys, then the latest status
    pub fn render_status_bar(&self, f: &mut Frame, view_keys: &str, status_text: &str, status_color: Color) {
        let status_content = vec![
            Line::from(vec![
                Span::styled("Tab", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(" switch • ", Style::default().fg(Color::Gray)),
                Span::styled("R", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(" refresh • ", Style::default().fg(Color::Gray)),
                Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(" quit • ", Style::default().fg(Color::Gray)),
                Span::styled(view_keys.to_string(), Style::default().fg(Color::Gray)),
            ]),
            Line::from(vec![Span::styled(status_text.to_string(), Style::default().fg(status_color))]),
        ];

        let paragraph = Paragraph::new(status_content)
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, self.status_bar);
    }
}

/// Helper struct for view-specific layouts
pub struct ViewLayout {
    pub header: Rect,
    pub main_content: Rect,
}

impl ViewLayout {
    /// Header of `header_height` rows above the main content
    pub fn new(content_area: Rect, header_height: u16) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(header_height), Constraint::Min(0)])
            .split(content_area);

        Self {
            header: chunks[0],
            main_content: chunks[1],
        }
    }

    /// Split main content into sections
    pub fn split_main_content(&self, direction: Direction, constraints: &[Constraint]) -> Vec<Rect> {
        Layout::default()
            .direction(direction)
            .constraints(constraints)
            .split(self.main_content)
            .to_vec()
    }

    pub fn split_main_content_vertical(&self, constraints: &[Constraint]) -> Vec<Rect> {
        self.split_main_content(Direction::Vertical, constraints)
    }
}
