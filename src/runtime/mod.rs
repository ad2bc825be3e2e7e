use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::mpris::ControlCmd;

mod event_loop;
mod logging;
mod session;
mod settings;

use session::Session;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, problem) = settings::load_settings();
    logging::init(&settings.logging);
    if let Some(problem) = problem {
        warn!("{problem}");
    }
    info!(backend = %settings.backend.base_url, "starting mirrortune");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("mirrortune-net")
        .build()?;

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx);

    let mut session = Session::new(&settings, runtime.handle().clone())?;
    session.mount();

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(
        &mut terminal,
        &settings,
        runtime.handle(),
        &mut session,
        &mpris,
        &control_rx,
    );

    session.unmount();
    drop(session);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    runtime.shutdown_background();
    info!("shutdown complete");
    run_result
}
