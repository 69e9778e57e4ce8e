//! UI rendering for TUI

use crate::cosmos::VoteState;
use crate::tui::layout::{columns_layout, dashboard_layout, header_layout};
use crate::tui::App;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph, Wrap},
    Frame,
};

/// Render the UI
pub fn render(f: &mut Frame, app: &App) {
    let (header, body) = dashboard_layout(f.area());
    let header = header_layout(header);

    render_summary(f, app, header[0]);
    render_gauge(f, app, header[1], "Prevotes", Some(app.vote_percent), app.theme.prevote());
    render_gauge(f, app, header[2], "Precommits", app.commit_percent, app.theme.precommit());

    let columns = columns_layout(body);
    for (bucket, area) in app.columns.buckets.iter().zip(columns) {
        render_votes(f, app, bucket, area);
    }
}

fn render_summary(f: &mut Frame, app: &App, area: Rect) {
    let theme = app.theme;
    let mut lines = Vec::new();
    if let Some(ref err) = app.error {
        lines.push(Line::from(vec![Span::styled(
            err.clone(),
            Style::default().fg(theme.error()).add_modifier(Modifier::BOLD),
        )]));
    }
    for line in app.summary.lines() {
        lines.push(Line::from(Span::styled(
            line.to_string(),
            Style::default().fg(theme.text()),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border()))
        .title(Span::styled(
            format!("{} - {} validators", app.network, app.columns.total()),
            Style::default().fg(theme.title()).add_modifier(Modifier::BOLD),
        ));
    let summary = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    f.render_widget(summary, area);
}

fn render_gauge(
    f: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    percent: Option<f64>,
    color: Color,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border()))
        .title(title.to_string());

    let gauge = match percent {
        Some(pct) => Gauge::default()
            .percent(to_percent(pct))
            .gauge_style(Style::default().fg(color)),
        None => Gauge::default()
            .percent(0)
            .label("n/a")
            .gauge_style(Style::default().fg(app.theme.muted())),
    };
    f.render_widget(gauge.block(block), area);
}

fn render_votes(f: &mut Frame, app: &App, votes: &[VoteState], area: Rect) {
    let style = Style::default().fg(app.theme.text());
    let items: Vec<ListItem> = votes
        .iter()
        .map(|vote| ListItem::new(Line::from(Span::styled(vote_row(vote), style))))
        .collect();
    f.render_widget(List::new(items), area);
}

/// `"<prevote> <precommit> <description>"` with emoji markers
pub fn vote_row(vote: &VoteState) -> String {
    format!(
        "{} {} {}",
        prevote_marker(vote),
        commit_marker(vote),
        vote.description
    )
}

fn prevote_marker(vote: &VoteState) -> &'static str {
    if vote.voted_zero_block {
        "🤷"
    } else if vote.voted {
        "✅"
    } else {
        "❌"
    }
}

fn commit_marker(vote: &VoteState) -> &'static str {
    if vote.committed {
        "✅"
    } else {
        "❌"
    }
}

fn to_percent(fraction: f64) -> u16 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cosmos::PollResult;
    use crate::poller::PollUpdate;
    use crate::tui::Theme;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn vote(voted: bool, zero: bool, committed: bool) -> VoteState {
        VoteState {
            description: "1   60.00%   Alice".to_string(),
            voted,
            voted_zero_block: zero,
            committed,
        }
    }

    #[test]
    fn test_vote_rows() {
        assert!(vote_row(&vote(true, false, true)).starts_with("✅ ✅ 1"));
        assert!(vote_row(&vote(false, false, false)).starts_with("❌ ❌ 1"));
        // Zero block id wins over the plain voted marker
        assert!(vote_row(&vote(true, true, false)).starts_with("🤷"));
        assert!(vote_row(&vote(true, false, false)).ends_with("Alice"));
    }

    #[test]
    fn test_to_percent_clamps() {
        assert_eq!(to_percent(0.666), 67);
        // Matches the rounded summary text
        assert_eq!(to_percent(0.29), 29);
        assert_eq!(to_percent(1.5), 100);
        assert_eq!(to_percent(-0.1), 0);
    }

    #[test]
    fn test_render_smoke() {
        let mut app = App::new("cosmoshub-4".to_string(), Theme::Dark);
        app.apply(PollUpdate::Round(PollResult {
            votes: vec![vote(true, false, true), vote(false, false, false)],
            vote_percent: 0.6,
            commit_percent: None,
            height_round_step: "100/0/3".to_string(),
            round_duration: Duration::from_secs(2),
            proposer: "1   60.00%   Alice".to_string(),
        }));
        app.apply(PollUpdate::Failed {
            summary: "error: boom".to_string(),
        });

        let mut terminal = Terminal::new(TestBackend::new(150, 60)).unwrap();
        terminal.draw(|f| render(f, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(text.contains("cosmoshub-4 - 2 validators"));
        assert!(text.contains("error: boom"));
        assert!(text.contains("Alice"));
    }
}
