//! Terminal dashboard built on ratatui and crossterm

pub mod app;
pub mod components;
pub mod events;
pub mod layout;
pub mod state;
pub mod view;
pub mod views;

pub use app::{run_app, OpenArchiveApp};
pub use view::{View, ViewManager};
