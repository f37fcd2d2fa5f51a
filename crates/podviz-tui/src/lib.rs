//! Terminal renderers for podviz
//!
//! This crate provides the one-shot text report printed by `podviz show`
//! and the live dashboard used by `podviz watch`, including its state,
//! keybindings, event handling and widgets.

pub mod app;
pub mod config;
pub mod report;
pub mod tui;
pub mod ui;

pub use app::{Action, DashboardState};
pub use config::KeyBindings;
pub use report::Report;
pub use tui::{Event, EventHandler, Tui};
pub use ui::components::{dashboard_hints, StatusBar};
pub use ui::screens::DashboardScreen;
pub use ui::{Layout, Theme};
