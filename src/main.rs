//! loan-wizard - Stepwise Loan Application
//!
//! Terminal front end for the loan application wizard. Each step is
//! validated locally, saved to the record store and kept on disk so an
//! interrupted application can be resumed.

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use loan_wizard::application::{App, WizardController};
use loan_wizard::domain::StepSequence;
use loan_wizard::infrastructure::{init_logging, Config, FileSessionStore, HttpRecordStore, SessionStore};
use loan_wizard::presentation::{render_ui, InputHandler};

/// How often the loop wakes up to expire notices and collect sync results.
const TICK: Duration = Duration::from_millis(200);

/// Entry point for the loan application wizard.
///
/// Reads configuration, restores any saved session, then runs the terminal
/// interface until the user quits.
///
/// # Errors
///
/// Returns an error if the log file or HTTP client cannot be set up, or if
/// terminal setup fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();
    init_logging(&config.log_file())?;
    tracing::info!(api_url = %config.api_url, data_dir = %config.data_dir().display(), "starting");

    let steps = StepSequence::loan_application()?;
    let store: Box<dyn SessionStore> = Box::new(FileSessionStore::new(config.data_dir()));
    let remote = HttpRecordStore::new(&config.api_url, config.timeout())?;
    let mut app = App::new(WizardController::restore(steps, store), Arc::new(remote));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = %err, "terminal failure");
        println!("{err:?}");
    }
    tracing::info!("exiting");

    Ok(())
}

/// Main application event loop.
///
/// Redraws the wizard, forwards key and mouse events to the input handler
/// and, between events, applies finished step syncs and expires notices.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if event::poll(TICK)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    InputHandler::handle_key_event(app, key.code, key.modifiers);
                }
                Event::Mouse(mouse) => InputHandler::handle_mouse_event(app, mouse),
                _ => {}
            }
        }

        app.poll_sync();
        app.tick(Instant::now());

        if app.should_quit {
            return Ok(());
        }
    }
}
