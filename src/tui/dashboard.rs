//! Dashboard loop: owns the terminal and drains poll updates into the app

use crate::logging;
use crate::poller::PollUpdate;
use crate::tui::event::handle_key_event;
use crate::tui::{App, Event, EventHandler, Theme};
use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use signal_hook::consts::signal::*;
use signal_hook_tokio::Signals;
use std::io;
use std::time::Duration;
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_stream::StreamExt;
use tracing::{debug, error, info};

/// How long the input reader waits per read before checking for shutdown
const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Run the dashboard until the user quits, a signal arrives or the poller
/// goes away
pub async fn run(
    network: String,
    theme: Theme,
    frame_interval: Duration,
    updates: mpsc::Receiver<PollUpdate>,
) -> Result<()> {
    let signals = Signals::new([SIGTERM, SIGQUIT]).context("Failed to register signal handlers")?;
    let handle = signals.handle();

    // Initialize terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to enter alternate screen");
    }
    logging::set_screen_owned(true);

    let res = match Terminal::new(CrosstermBackend::new(stdout)) {
        Ok(mut terminal) => {
            let mut app = App::new(network, theme);
            let res = run_tui(&mut terminal, &mut app, frame_interval, updates, signals).await;
            let _ = terminal.show_cursor();
            res
        }
        Err(e) => Err(e).context("Failed to create terminal"),
    };

    // Restore terminal
    let restored = restore_terminal();
    logging::set_screen_owned(false);
    handle.close();

    if let Err(err) = res {
        error!("Error in TUI: {}", err);
        return Err(err);
    }
    restored
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    Ok(())
}

async fn run_tui(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    frame_interval: Duration,
    mut updates: mpsc::Receiver<PollUpdate>,
    signals: Signals,
) -> Result<()> {
    let mut signals = signals.fuse();
    let mut events = EventHandler::new(INPUT_POLL_TIMEOUT).spawn();
    let mut frames = time::interval(frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        select! {
            _ = frames.tick() => {
                if app.take_dirty() {
                    terminal.draw(|f| crate::tui::render(f, app))?;
                }
            }
            Some(event) = events.recv() => {
                match event {
                    Event::Key(key) => {
                        if !handle_key_event(key, app) {
                            break;
                        }
                    }
                    Event::Resize => {
                        app.take_dirty();
                        terminal.draw(|f| crate::tui::render(f, app))?;
                    }
                    Event::Tick => {}
                }
            }
            update = updates.recv() => {
                match update {
                    Some(update) => app.apply(update),
                    None => {
                        info!("Poller stopped, closing dashboard");
                        break;
                    }
                }
            }
            Some(signal) = signals.next() => {
                match signal {
                    SIGTERM | SIGQUIT => {
                        info!("Received signal {}, shutting down", signal);
                        app.quit();
                    }
                    _ => {
                        debug!("Received unexpected signal {}", signal);
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
