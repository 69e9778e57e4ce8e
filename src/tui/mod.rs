//! Text User Interface (TUI) module for the live vote dashboard

mod app;
mod dashboard;
pub mod event;
pub mod layout;
mod theme;
mod ui;

pub use app::App;
pub use dashboard::run;
pub use event::{Event, EventHandler};
pub use theme::Theme;
pub use ui::render;
