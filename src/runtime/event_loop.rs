use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::runtime::Handle;
use tracing::info;

use crate::audio::AudioPlayer;
use crate::config;
use crate::engine::Reconciler;
use crate::mpris::{ControlCmd, MprisHandle};
use crate::remote::{HttpBackend, SpotifyCatalog};
use crate::ui::{self, PlaylistPanel};
use crate::viz::Visualizer;

use super::session::Session;

pub type AppSession = Session<HttpBackend, SpotifyCatalog>;

const SEEK_STEP_SECS: f64 = 10.0;
const VOLUME_STEP: f32 = 0.05;

/// What a key press asks of the loop beyond the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Reload,
    Quit,
}

/// Main terminal event loop: drains session reports, draws a frame, applies
/// MPRIS commands and key presses. Returns `Ok(())` when shutdown is requested.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    runtime: &Handle,
    session: &mut AppSession,
    mpris: &MprisHandle,
    control_rx: &mpsc::Receiver<ControlCmd>,
) -> Result<(), Box<dyn std::error::Error>> {
    let frame_budget = Duration::from_secs_f64(1.0 / f64::from(settings.visualizer.fps.max(1)));
    let mut visualizer = Visualizer::new();
    let mut panel = PlaylistPanel::default();
    let mut tick: u64 = 0;

    loop {
        session.pump();
        mpris.publish(session.engine().player(), session.controllable());

        terminal.draw(|f| {
            let (view, element) = session.engine_mut().view_mut();
            ui::draw(
                f,
                view,
                &panel,
                &settings.ui,
                &mut visualizer,
                element.and_then(AudioPlayer::analyzer_mut),
                tick,
            );
        })?;
        tick = tick.wrapping_add(1);

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, session.engine_mut()) == LoopAction::Quit {
                return Ok(());
            }
        }

        if event::poll(frame_budget)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(key, session, &mut panel) {
                    LoopAction::Continue => {}
                    LoopAction::Quit => return Ok(()),
                    LoopAction::Reload => {
                        info!("reloading session");
                        session.unmount();
                        *session = Session::new(settings, runtime.clone())?;
                        session.mount();
                        panel.close();
                        visualizer = Visualizer::new();
                    }
                }
            }
        }
    }
}

fn handle_control_cmd(cmd: ControlCmd, engine: &mut Reconciler<AudioPlayer>) -> LoopAction {
    let playing = engine.player().is_playing;
    match cmd {
        ControlCmd::Quit => return LoopAction::Quit,
        ControlCmd::Play if !playing => engine.play_pause(),
        ControlCmd::Pause if playing => engine.play_pause(),
        ControlCmd::Play | ControlCmd::Pause => {}
        ControlCmd::PlayPause => engine.play_pause(),
        ControlCmd::Stop => {
            if playing {
                engine.play_pause();
            }
            engine.seek(0.0);
        }
        ControlCmd::Next => engine.next(),
        ControlCmd::Prev => engine.previous(),
    }
    LoopAction::Continue
}

/// Key bindings. Transport keys go straight to the engine, which ignores
/// them while a mirrored track is authoritative.
pub fn handle_key_event(
    key: KeyEvent,
    session: &mut AppSession,
    panel: &mut PlaylistPanel,
) -> LoopAction {
    let controllable = session.controllable();
    let engine = session.engine_mut();

    if !controllable {
        panel.close();
    }

    match key.code {
        KeyCode::Char('q') => return LoopAction::Quit,
        KeyCode::Char('r') => return LoopAction::Reload,
        KeyCode::Char(' ') => engine.play_pause(),
        KeyCode::Char('h') => engine.previous(),
        KeyCode::Char('l') => engine.next(),
        KeyCode::Char('H') => engine.seek_by(-SEEK_STEP_SECS),
        KeyCode::Char('L') => engine.seek_by(SEEK_STEP_SECS),
        KeyCode::Char('-') => {
            let volume = engine.player().volume - VOLUME_STEP;
            engine.set_volume(volume);
        }
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let volume = engine.player().volume + VOLUME_STEP;
            engine.set_volume(volume);
        }
        KeyCode::Char('p') if controllable => {
            let current = engine
                .player()
                .track
                .as_ref()
                .and_then(|t| engine.playlist().position(&t.id));
            panel.toggle(current);
        }
        KeyCode::Esc => panel.close(),
        KeyCode::Char('j') | KeyCode::Down if panel.is_open() => {
            panel.down(engine.playlist().len());
        }
        KeyCode::Char('k') | KeyCode::Up if panel.is_open() => panel.up(),
        KeyCode::Enter if panel.is_open() => {
            if let Some(id) = engine.playlist().get(panel.cursor()).map(|t| t.id.clone()) {
                engine.select_track(&id);
            }
        }
        _ => {}
    }
    LoopAction::Continue
}
