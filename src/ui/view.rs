use crossterm::event::KeyCode;
use ratatui::{prelude::Rect, Frame};

use crate::session::Page;
use crate::ui::events::{Action, Request, Response};

/// View contract for all TUI views (non-async for trait object compatibility)
pub trait View {
    /// Render the view
    fn render(&self, f: &mut Frame, area: Rect);

    /// Get the view title
    fn get_title(&self) -> String;

    /// Key hints for the status bar
    fn get_status(&self) -> String;

    /// Requests issued when the view becomes visible
    fn on_enter(&mut self) -> Vec<Action>;

    /// Reload; by default the same as entering
    fn refresh(&mut self) -> Vec<Action> {
        self.on_enter()
    }

    /// Handle view-specific key events
    fn handle_key(&mut self, key: KeyCode) -> Vec<Action>;

    /// Apply an API result dispatched by this view
    fn handle_response(&mut self, response: Response) -> Vec<Action>;

    /// True while a form or text input owns the keyboard
    fn is_capturing_input(&self) -> bool {
        false
    }
}

pub(crate) fn dispatch(request: Request) -> Vec<Action> {
    vec![Action::Dispatch(request)]
}

struct Slot {
    page: Page,
    view: Box<dyn View>,
    generation: u64,
}

/// Tabbed views, each with a generation counter that invalidates in-flight responses
pub struct ViewManager {
    slots: Vec<Slot>,
    pub current_view_index: usize,
}

impl Default for ViewManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewManager {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            current_view_index: 0,
        }
    }

    pub fn add_view(&mut self, page: Page, view: Box<dyn View>) {
        self.slots.push(Slot {
            page,
            view,
            generation: 0,
        });
    }

    pub fn current_page(&self) -> Option<Page> {
        self.slots.get(self.current_view_index).map(|s| s.page)
    }

    pub fn index_of(&self, page: Page) -> Option<usize> {
        self.slots.iter().position(|s| s.page == page)
    }

    pub fn get_current_view(&self) -> Option<&dyn View> {
        self.slots.get(self.current_view_index).map(|s| s.view.as_ref())
    }

    pub fn get_current_view_mut(&mut self) -> Option<&mut (dyn View + '_)> {
        match self.slots.get_mut(self.current_view_index) {
            Some(slot) => Some(slot.view.as_mut()),
            None => None,
        }
    }

    pub fn generation(&self, page: Page) -> u64 {
        self.slots
            .iter()
            .find(|s| s.page == page)
            .map(|s| s.generation)
            .unwrap_or(0)
    }

    /// Whether a response tagged `(page, generation)` is still wanted
    pub fn is_current(&self, page: Page, generation: u64) -> bool {
        self.slots
            .iter()
            .any(|s| s.page == page && s.generation == generation)
    }

    /// Switch tabs. The view being left is invalidated; returns the entered view's actions.
    pub fn switch_to_view(&mut self, index: usize) -> Vec<Action> {
        if index >= self.slots.len() || index == self.current_view_index {
            return Vec::new();
        }
        if let Some(leaving) = self.slots.get_mut(self.current_view_index) {
            leaving.generation += 1;
        }
        self.current_view_index = index;
        self.slots[index].view.on_enter()
    }

    pub fn next_view(&mut self) -> Vec<Action> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        self.switch_to_view((self.current_view_index + 1) % self.slots.len())
    }

    pub fn previous_view(&mut self) -> Vec<Action> {
        if self.slots.is_empty() {
            return Vec::new();
        }
        let index = if self.current_view_index == 0 {
            self.slots.len() - 1
        } else {
            self.current_view_index - 1
        };
        self.switch_to_view(index)
    }

    /// Get view titles for tab bar
    pub fn get_view_titles(&self) -> Vec<String> {
        self.slots.iter().map(|s| s.view.get_title()).collect()
    }

    pub fn render_current_view(&self, f: &mut Frame, area: Rect) {
        if let Some(view) = self.get_current_view() {
            view.render(f, area);
        }
    }

    pub fn get_current_status(&self) -> String {
        self.get_current_view()
            .map(|v| v.get_status())
            .unwrap_or_else(|| "No view available".to_string())
    }

    /// Route a response to its page, dropping it when that page moved on
    pub fn deliver(&mut self, page: Page, generation: u64, response: Response) -> Option<Vec<Action>> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.page == page && s.generation == generation)?;
        Some(slot.view.handle_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::widgets::Paragraph;

    struct Probe {
        title: &'static str,
        responses: usize,
    }

    impl View for Probe {
        fn render(&self, f: &mut Frame, area: Rect) {
            f.render_widget(Paragraph::new(self.title), area);
        }
        fn get_title(&self) -> String {
            self.title.to_string()
        }
        fn get_status(&self) -> String {
            String::new()
        }
        fn on_enter(&mut self) -> Vec<Action> {
            dispatch(Request::Cases)
        }
        fn handle_key(&mut self, _key: KeyCode) -> Vec<Action> {
            Vec::new()
        }
        fn handle_response(&mut self, _response: Response) -> Vec<Action> {
            self.responses += 1;
            Vec::new()
        }
    }

    fn manager() -> ViewManager {
        let mut views = ViewManager::new();
        views.add_view(Page::Search, Box::new(Probe { title: "Search", responses: 0 }));
        views.add_view(Page::Cases, Box::new(Probe { title: "Cases", responses: 0 }));
        views
    }

    #[test]
    fn test_navigation_invalidates_left_view() {
        let mut views = manager();
        let before = views.generation(Page::Search);

        let actions = views.switch_to_view(1);
        assert_eq!(actions.len(), 1);
        assert_eq!(views.current_page(), Some(Page::Cases));
        assert!(!views.is_current(Page::Search, before));
        assert!(views.deliver(Page::Search, before, Response::Cases(Vec::new())).is_none());
        assert!(views
            .deliver(Page::Search, views.generation(Page::Search), Response::Cases(Vec::new()))
            .is_some());
    }

    #[test]
    fn test_wraparound_and_titles() {
        let mut views = manager();
        views.previous_view();
        assert_eq!(views.current_view_index, 1);
        views.next_view();
        assert_eq!(views.current_view_index, 0);
        assert_eq!(views.get_view_titles(), vec!["Search", "Cases"]);
        assert!(views.switch_to_view(0).is_empty());
    }
}
