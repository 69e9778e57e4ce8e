//! Event handling for TUI

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Terminal events
#[derive(Debug, Clone, Copy)]
pub enum Event {
    /// Key press event
    Key(KeyEvent),
    /// Resize event
    Resize,
    /// Nothing happened within the poll timeout
    Tick,
}

/// Event handler for terminal events
pub struct EventHandler {
    /// How long a single read waits before reporting a tick
    poll_timeout: Duration,
}

impl EventHandler {
    /// Create a new event handler
    pub fn new(poll_timeout: Duration) -> Self {
        Self { poll_timeout }
    }

    /// Read next event (blocking with timeout)
    pub fn next(&self) -> Result<Event> {
        if event::poll(self.poll_timeout)? {
            match event::read()? {
                CrosstermEvent::Key(key) if key.kind != KeyEventKind::Release => Ok(Event::Key(key)),
                CrosstermEvent::Resize(_, _) => Ok(Event::Resize),
                _ => Ok(Event::Tick),
            }
        } else {
            Ok(Event::Tick)
        }
    }

    /// Forward key and resize events from a blocking reader thread. The
    /// reader stops once the receiving side is dropped.
    pub fn spawn(self) -> mpsc::UnboundedReceiver<Event> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::task::spawn_blocking(move || loop {
            if tx.is_closed() {
                break;
            }
            match self.next() {
                Ok(Event::Tick) => {}
                Ok(event) => {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Terminal event read failed: {}", e);
                    break;
                }
            }
        });
        rx
    }
}

/// Parse keyboard event and return whether to continue running
pub fn handle_key_event(key: KeyEvent, app: &mut crate::tui::App) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
            app.quit();
            false
        }
        // Ctrl+C
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.quit();
            false
        }
        // Toggle theme
        KeyCode::Char('t') | KeyCode::Char('T') => {
            app.toggle_theme();
            true
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tui::{App, Theme};

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_quit_keys() {
        for k in [
            key(KeyCode::Char('q'), KeyModifiers::NONE),
            key(KeyCode::Esc, KeyModifiers::NONE),
            key(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let mut app = App::new("n".to_string(), Theme::Dark);
            assert!(!handle_key_event(k, &mut app));
            assert!(app.should_quit);
        }
    }

    #[test]
    fn test_other_keys_keep_running() {
        let mut app = App::new("n".to_string(), Theme::Dark);
        assert!(handle_key_event(key(KeyCode::Char('c'), KeyModifiers::NONE), &mut app));
        assert!(handle_key_event(key(KeyCode::Char('t'), KeyModifiers::NONE), &mut app));
        assert_eq!(app.theme, Theme::Light);
        assert!(!app.should_quit);
    }
}
