use anyhow::{bail, Result};
use crossterm::{
    event::KeyCode,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::Color,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::api::ArchiveApi;
use crate::models::Config;
use crate::session::{Page, Session};
use crate::ui::{
    components,
    events::{Action, Envelope, EventManager, RequestRunner, Response, Target, TuiEvent},
    layout::TuiLayout,
    state::{AppState, AsyncStateManager},
    view::{View, ViewManager},
    views::{build_view, MessageView},
};

const ACTIVITY_ROWS: u16 = 5;

/// Dashboard shell: role tabs, the message overlay and the activity log
pub struct OpenArchiveApp {
    pub should_quit: bool,
    heading: String,
    views: ViewManager,
    overlay: Option<MessageView>,
    overlay_generation: u64,
    state: AsyncStateManager,
    runner: RequestRunner,
}

impl OpenArchiveApp {
    pub fn new(session: Arc<Session>, runner: RequestRunner, page_size: usize) -> Result<Self> {
        let navigation = session.navigation();
        if navigation.is_empty() {
            bail!("Role '{}' has no dashboard pages", session.role());
        }

        let mut views = ViewManager::new();
        for entry in navigation {
            views.add_view(entry.page, build_view(entry, &session, page_size)?);
        }
        if let Some(index) = views.index_of(session.landing_page()) {
            views.current_view_index = index;
        }

        Ok(Self {
            should_quit: false,
            heading: format!("OpenArchive • {} ({})", session.user.username, session.role()),
            views,
            overlay: None,
            overlay_generation: 0,
            state: AsyncStateManager::new(),
            runner,
        })
    }

    /// Load the landing page
    pub fn start(&mut self) {
        let actions = match self.views.get_current_view_mut() {
            Some(view) => view.on_enter(),
            None => Vec::new(),
        };
        self.apply_current(actions);
    }

    pub fn state(&self) -> &AsyncStateManager {
        &self.state
    }

    pub fn current_page(&self) -> Option<Page> {
        self.views.current_page()
    }

    pub fn has_overlay(&self) -> bool {
        self.overlay.is_some()
    }

    pub fn handle_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key) => self.handle_key_event(key),
            TuiEvent::Resize(w, h) => debug!("Terminal resized to {}x{}", w, h),
            TuiEvent::Response(envelope) => self.handle_envelope(envelope),
        }
    }

    pub fn handle_key_event(&mut self, key: KeyCode) {
        if let Some(overlay) = self.overlay.as_mut() {
            match key {
                KeyCode::Esc | KeyCode::Char('q') => self.close_overlay(),
                _ => {
                    let actions = overlay.handle_key(key);
                    self.apply(Target::Overlay, actions);
                }
            }
            return;
        }

        let capturing = self
            .views
            .get_current_view()
            .map(|v| v.is_capturing_input())
            .unwrap_or(false);
        if !capturing {
            let actions = match key {
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    self.should_quit = true;
                    return;
                }
                KeyCode::Tab => Some(self.views.next_view()),
                KeyCode::BackTab => Some(self.views.previous_view()),
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    self.views.get_current_view_mut().map(|v| v.refresh())
                }
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    Some(self.views.switch_to_view(index))
                }
                _ => None,
            };
            if let Some(actions) = actions {
                self.apply_current(actions);
                return;
            }
        }

        let actions = match self.views.get_current_view_mut() {
            Some(view) => view.handle_key(key),
            None => Vec::new(),
        };
        self.apply_current(actions);
    }

    fn handle_envelope(&mut self, envelope: Envelope) {
        let Envelope {
            target,
            generation,
            label,
            response,
        } = envelope;

        let outcome = match &response {
            Response::Failed(message) => Err(message.clone()),
            Response::Done(message) => Ok(Some(message.clone())),
            _ => Ok(None),
        };
        self.state.complete_operation(label, outcome);

        let actions = match target {
            Target::Tab(page) => self.views.deliver(page, generation, response),
            Target::Overlay if generation == self.overlay_generation => {
                self.overlay.as_mut().map(|view| view.handle_response(response))
            }
            Target::Overlay => None,
        };
        match actions {
            Some(actions) => self.apply(target, actions),
            None => debug!("Dropped stale response for {} ({:?}, generation {})", label, target, generation),
        }
    }

    fn apply_current(&mut self, actions: Vec<Action>) {
        if let Some(page) = self.views.current_page() {
            self.apply(Target::Tab(page), actions);
        }
    }

    fn apply(&mut self, source: Target, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Dispatch(request) => {
                    let generation = match source {
                        Target::Tab(page) => self.views.generation(page),
                        Target::Overlay => self.overlay_generation,
                    };
                    self.state.start_operation(request.label());
                    self.runner.dispatch(source, generation, request);
                }
                Action::OpenMessage(id) => self.open_overlay(id),
                Action::Notify(level, message) => self.state.notify(level, &message),
            }
        }
    }

    fn open_overlay(&mut self, message_id: String) {
        info!("Opening message {}", message_id);
        self.overlay_generation += 1;
        let mut overlay = MessageView::new(message_id);
        let actions = overlay.on_enter();
        self.overlay = Some(overlay);
        self.apply(Target::Overlay, actions);
    }

    fn close_overlay(&mut self) {
        self.overlay = None;
        self.overlay_generation += 1;
    }

    pub fn draw(&self, f: &mut Frame) {
        let layout = TuiLayout::new(f.area());
        layout.render_tab_bar(
            f,
            self.views.get_view_titles(),
            self.views.current_view_index,
            &self.heading,
        );

        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(ACTIVITY_ROWS)])
            .split(layout.content);
        self.views.render_current_view(f, sections[0]);
        if let Some(overlay) = &self.overlay {
            f.render_widget(Clear, sections[0]);
            overlay.render(f, sections[0]);
        }
        self.render_activity(f, sections[1]);

        let view_keys = match &self.overlay {
            Some(overlay) => overlay.get_status(),
            None => self.views.get_current_status(),
        };
        let color = match self.state.current_state {
            AppState::Idle => Color::White,
            AppState::Loading { .. } => Color::Yellow,
            AppState::Error { .. } => Color::Red,
            AppState::Success { .. } => Color::Green,
        };
        layout.render_status_bar(f, &view_keys, &self.state.get_status_text(), color);
    }

    fn render_activity(&self, f: &mut Frame, area: ratatui::layout::Rect) {
        let rows = ACTIVITY_ROWS.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .state
            .get_recent_logs(rows)
            .into_iter()
            .map(|log| {
                Line::from(vec![
                    Span::styled(
                        format!("{} ", log.timestamp.format("%H:%M:%S")),
                        components::level_style(log.level),
                    ),
                    Span::raw(log.message.clone()),
                ])
            })
            .collect();
        let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Activity"));
        f.render_widget(paragraph, area);
    }
}

async fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut OpenArchiveApp,
    events: &mut EventManager,
) -> Result<()> {
    app.start();
    loop {
        terminal.draw(|f| app.draw(f))?;

        events.poll_terminal(Duration::from_millis(50))?;
        while let Some(event) = events.try_receive() {
            app.handle_event(event);
            if app.should_quit {
                return Ok(());
            }
        }
        tokio::task::yield_now().await;
    }
}

/// Run the terminal dashboard until the user quits
pub async fn run_app(config: &Config, session: Session, api: Arc<dyn ArchiveApi>) -> Result<()> {
    let session = Arc::new(session);
    let mut events = EventManager::new();
    let runner = RequestRunner::new(api, session.clone(), config.audit_log_limit, events.sender());
    let mut app = OpenArchiveApp::new(session, runner, config.page_size)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    // Restore the terminal even when the loop failed
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    terminal.show_cursor()?;

    info!("Dashboard closed");
    result
}
