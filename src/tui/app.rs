//! Application state management for TUI

use crate::poller::PollUpdate;
use crate::tui::layout::{split_for_display, VoteColumns};
use crate::tui::Theme;

/// Application state
pub struct App {
    /// Chain id shown as the summary title
    pub network: String,
    /// Summary of the last good poll
    pub summary: String,
    /// Set while the latest poll failed; cleared by the next good one
    pub error: Option<String>,
    pub columns: VoteColumns,
    pub vote_percent: f64,
    pub commit_percent: Option<f64>,
    /// Should quit the application
    pub should_quit: bool,
    /// Something changed since the last repaint
    pub dirty: bool,
    /// Color theme
    pub theme: Theme,
}

impl App {
    pub fn new(network: String, theme: Theme) -> Self {
        Self {
            network,
            summary: "waiting for first round state...".to_string(),
            error: None,
            columns: VoteColumns::default(),
            vote_percent: 0.0,
            commit_percent: None,
            should_quit: false,
            dirty: true,
            theme,
        }
    }

    /// Apply one poll update: summary first, then votes, then percentages.
    /// A failed poll only raises the banner, the last frame stays.
    pub fn apply(&mut self, update: PollUpdate) {
        match update {
            PollUpdate::Round(result) => {
                self.summary = result.summary();
                self.error = None;
                self.columns = split_for_display(result.votes);
                self.vote_percent = result.vote_percent;
                self.commit_percent = result.commit_percent;
            }
            PollUpdate::Failed { summary } => {
                self.error = Some(summary);
            }
        }
        self.dirty = true;
    }

    /// Returns whether a repaint is due and clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Toggle theme
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggle();
        self.dirty = true;
    }

    /// Quit the application
    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
