use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::models::{AdminStats, Agent, NewOrganization, OrgAnalytics, Organization, Role};
use crate::search::split_list;
use crate::ui::components::{self, ConfirmDialog, DialogOutcome, Form, FormField};
use crate::ui::events::{Action, Request, Response};
use crate::ui::layout::ViewLayout;
use crate::ui::state::LogLevel;
use crate::ui::view::{dispatch, View};

/// URL-safe organization handle derived from its display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<18}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
    ])
}

fn count(value: Option<u64>) -> String {
    value.map(components::format_count).unwrap_or_else(|| "-".to_string())
}

enum Modal {
    CreateOrg(Form),
    DeleteOrg(ConfirmDialog<i64>),
}

/// Overview: counters and agents for everyone, usage analytics for client admins,
/// tenant management for super admins
pub struct AdminView {
    title: String,
    role: Role,
    stats: Option<AdminStats>,
    analytics: Option<OrgAnalytics>,
    organizations: Vec<Organization>,
    agents: Vec<Agent>,
    selected: usize,
    modal: Option<Modal>,
    loading: bool,
}

impl AdminView {
    pub fn new(title: impl Into<String>, role: Role) -> Self {
        Self {
            title: title.into(),
            role,
            stats: None,
            analytics: None,
            organizations: Vec::new(),
            agents: Vec::new(),
            selected: 0,
            modal: None,
            loading: false,
        }
    }

    fn manages_orgs(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    fn stats_lines(&self) -> Vec<Line<'static>> {
        let Some(stats) = &self.stats else {
            return vec![Line::from("Loading counters...")];
        };
        let storage = stats.storage_used.clone().unwrap_or_else(|| "-".to_string());
        if self.manages_orgs() {
            vec![
                stat_line("Organizations", count(stats.total_organizations)),
                stat_line("Users", count(stats.total_users)),
                stat_line("Online agents", count(stats.online_agents)),
                stat_line("Archived emails", count(stats.total_emails)),
                stat_line("Storage", storage),
            ]
        } else {
            vec![
                stat_line("Archived emails", count(stats.total_emails)),
                stat_line("Active auditors", count(stats.active_auditors)),
                stat_line("Active holds", count(stats.active_holds)),
                stat_line("Open cases", count(stats.open_cases)),
                stat_line("Storage", storage),
            ]
        }
    }

    fn analytics_lines(&self) -> Vec<Line<'static>> {
        match &self.analytics {
            None => vec![Line::from("Analytics unavailable")],
            Some(a) => vec![
                stat_line("Messages", components::format_count(a.total_messages)),
                stat_line("Active holds", components::format_count(a.active_holds)),
                stat_line("Held items", components::format_count(a.held_items)),
                stat_line("Volume", components::format_bytes(a.storage_volume_bytes)),
                stat_line("Hold ratio", format!("{:.1}%", a.hold_ratio * 100.0)),
            ],
        }
    }

    fn render_agents(&self, f: &mut Frame, area: Rect) {
        if self.agents.is_empty() {
            components::render_empty(f, area, "Agents", "No agents registered");
            return;
        }
        let rows = self.agents.iter().map(|a| {
            let online = a.status.eq_ignore_ascii_case("online");
            Row::new(vec![
                Span::raw(components::truncate(&a.name, 24)),
                Span::raw(a.hostname.clone().unwrap_or_default()),
                Span::styled(
                    a.status.clone(),
                    Style::default().fg(if online { Color::Green } else { Color::Red }),
                ),
                Span::raw(a.last_seen.clone().unwrap_or_default()),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(24),
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(20),
            ],
        )
        .header(
            Row::new(vec!["Agent", "Host", "Status", "Last seen"])
                .style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Agents"));
        f.render_widget(table, area);
    }

    fn render_organizations(&self, f: &mut Frame, area: Rect) {
        if self.organizations.is_empty() {
            components::render_empty(f, area, "Organizations", "No organizations. Press n to create one.");
            return;
        }
        let rows = self.organizations.iter().map(|o| {
            Row::new(vec![
                o.id.to_string(),
                components::truncate(&o.name, 30),
                o.slug.clone(),
                o.domains.join(", "),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(6),
                Constraint::Length(30),
                Constraint::Length(20),
                Constraint::Min(20),
            ],
        )
        .header(
            Row::new(vec!["ID", "Name", "Slug", "Domains"]).style(Style::default().add_modifier(Modifier::BOLD)),
        )
        .block(Block::default().borders(Borders::ALL).title("Organizations"))
        .highlight_style(Style::default().bg(Color::DarkGray));
        let mut state = TableState::default().with_selected(Some(self.selected));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn handle_modal_key(&mut self, key: KeyCode) -> Vec<Action> {
        let actions = match self.modal.as_mut() {
            None => return Vec::new(),
            Some(Modal::CreateOrg(form)) => match form.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(values) => {
                    let name = values[0].trim().to_string();
                    if name.is_empty() {
                        return vec![Action::Notify(LogLevel::Warning, "Organization name is required".into())];
                    }
                    let slug = match values[1].trim() {
                        "" => slugify(&name),
                        given => given.to_string(),
                    };
                    dispatch(Request::CreateOrganization(NewOrganization {
                        name,
                        slug,
                        domains: split_list(&values[2]),
                    }))
                }
            },
            Some(Modal::DeleteOrg(dialog)) => match dialog.handle_key(key) {
                DialogOutcome::Pending => return Vec::new(),
                DialogOutcome::Cancelled => Vec::new(),
                DialogOutcome::Confirmed(id) => dispatch(Request::DeleteOrganization(id)),
            },
        };
        self.modal = None;
        actions
    }
}

impl View for AdminView {
    fn render(&self, f: &mut Frame, area: Rect) {
        if self.loading && self.stats.is_none() {
            components::render_loading_indicator(f, area, "Loading overview...");
            return;
        }

        let layout = ViewLayout::new(area, 7);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(layout.header);
        f.render_widget(
            Paragraph::new(self.stats_lines()).block(Block::default().borders(Borders::ALL).title(self.title.clone())),
            top[0],
        );

        if self.manages_orgs() {
            f.render_widget(
                Paragraph::new(vec![
                    Line::from(format!("{} organizations", self.organizations.len())),
                    Line::from("n create • d delete"),
                ])
                .block(Block::default().borders(Borders::ALL).title("Tenants")),
                top[1],
            );
            let sections =
                layout.split_main_content_vertical(&[Constraint::Percentage(60), Constraint::Percentage(40)]);
            self.render_organizations(f, sections[0]);
            self.render_agents(f, sections[1]);
        } else {
            f.render_widget(
                Paragraph::new(self.analytics_lines())
                    .block(Block::default().borders(Borders::ALL).title("Usage")),
                top[1],
            );
            self.render_agents(f, layout.main_content);
        }

        match &self.modal {
            Some(Modal::CreateOrg(form)) => form.render(f, area),
            Some(Modal::DeleteOrg(dialog)) => dialog.render(f, area),
            None => {}
        }
    }

    fn get_title(&self) -> String {
        self.title.clone()
    }

    fn get_status(&self) -> String {
        if self.manages_orgs() {
            "n new organization • d delete organization".to_string()
        } else {
            "r refresh".to_string()
        }
    }

    fn on_enter(&mut self) -> Vec<Action> {
        self.loading = true;
        let mut actions = dispatch(Request::Stats);
        actions.extend(dispatch(Request::Agents));
        if self.manages_orgs() {
            actions.extend(dispatch(Request::Organizations));
        } else {
            actions.extend(dispatch(Request::Analytics));
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
        if !self.manages_orgs() {
            return Vec::new();
        }
        match key {
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected = components::step(self.selected, self.organizations.len(), true);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = components::step(self.selected, self.organizations.len(), false);
            }
            KeyCode::Char('n') => {
                self.modal = Some(Modal::CreateOrg(Form::new(
                    "New organization",
                    vec![
                        FormField::text("Name"),
                        FormField::text("Slug (empty to derive from name)"),
                        FormField::text("Domains (comma separated)"),
                    ],
                )));
            }
            KeyCode::Char('d') => {
                if let Some(org) = self.organizations.get(self.selected) {
                    self.modal = Some(Modal::DeleteOrg(ConfirmDialog::new(
                        format!("Delete organization '{}' and all of its data?", org.name),
                        org.id,
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
            Response::Stats(stats) => self.stats = Some(stats),
            Response::Analytics(analytics) => self.analytics = Some(analytics),
            Response::Organizations(organizations) => {
                self.organizations = organizations;
                self.selected = self.selected.min(self.organizations.len().saturating_sub(1));
            }
            Response::Agents(agents) => self.agents = agents,
            Response::Done(_) => return dispatch(Request::Organizations),
            Response::Failed(_) if self.stats.is_none() => self.stats = Some(AdminStats::default()),
            _ => {}
        }
        Vec::new()
    }
}
