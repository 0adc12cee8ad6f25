//! Full-screen burst timer
//!
//! Runs the burst that is open on the controller until it is completed or
//! closed. The countdown is redrawn every 250 ms and the terminal bell rings
//! when it runs out.

pub mod events;
pub mod msg; // What happened
pub mod ui;
pub mod update; // Applies a message to the controller

use std::io::{self, Write};
use std::time::Duration;

use crossterm::{
    event::{poll, read, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;

use crate::burst::Clock;
use crate::error::{Error, Result};
use crate::model::PracticeLog;
use crate::store::PracticeStore;
use crate::PracticeApp;
use events::key_to_msg;
use msg::Msg;
use update::{update, Effect};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Run the burst screen. Returns the recorded log, or `None` when the burst
/// was closed without logging.
pub fn run_burst<S: PracticeStore, C: Clock>(app: &mut PracticeApp<S, C>) -> Result<Option<PracticeLog>> {
    if app.burst().is_none() {
        return Err(Error::Validation("No burst is open".to_string()));
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_event_loop(&mut terminal, app);

    // Restore terminal - this MUST run even if the loop fails
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    if result.is_err() {
        app.close_burst();
    }
    result
}

fn run_event_loop<B: Backend, S: PracticeStore, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut PracticeApp<S, C>,
) -> Result<Option<PracticeLog>> {
    let mut status: Option<String> = None;

    loop {
        let now = app.now();
        let phase = match app.burst() {
            Some(burst) => {
                terminal.draw(|f| ui::draw(f, burst, now, status.as_deref()))?;
                burst.phase()
            }
            None => return Ok(None),
        };

        if poll(TICK_RATE)? {
            if let Event::Key(key) = read()? {
                if let Some(msg) = key_to_msg(key, phase) {
                    match update(app, msg) {
                        Ok(Effect::Logged(log)) => return Ok(Some(log)),
                        Ok(Effect::Closed) => return Ok(None),
                        Ok(_) => status = None,
                        Err(e) if e.is_user_error() => status = Some(e.to_string()),
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        if update(app, Msg::Tick)? == Effect::Bell {
            ring_bell()?;
        }
    }
}

fn ring_bell() -> Result<()> {
    let mut stdout = io::stdout();
    stdout.write_all(b"\x07")?;
    stdout.flush()?;
    Ok(())
}
