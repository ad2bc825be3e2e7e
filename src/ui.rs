//! UI rendering for the terminal user interface.
//!
//! Three pages: loading while the mirror status and the initial track are
//! resolved, a full-page error, and the player drawn over the visualizer.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Padding, Paragraph, Wrap},
};

use crate::audio::Analyzer;
use crate::config::UiSettings;
use crate::engine::{Authority, EngineView, PlayerState};
use crate::library::{format_mmss, now_playing_line};
use crate::viz::Visualizer;

const SPINNER: [&str; 4] = ["◐", "◓", "◑", "◒"];

const CONTROLS: &[(&str, &str)] = &[
    ("space", "play/pause"),
    ("h/l", "prev/next"),
    ("H/L", "seek -/+10s"),
    ("-/+", "volume"),
    ("p", "playlist"),
    ("r", "reload"),
    ("q", "quit"),
];

const PANEL: Style = Style::new().bg(Color::Black).fg(Color::White);

/// Selection state of the playlist side panel.
#[derive(Debug, Default, Clone)]
pub struct PlaylistPanel {
    open: bool,
    cursor: usize,
}

impl PlaylistPanel {
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Toggle the panel; opening it puts the cursor on `current` when known.
    pub fn toggle(&mut self, current: Option<usize>) {
        self.open = !self.open;
        if self.open {
            if let Some(index) = current {
                self.cursor = index;
            }
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn down(&mut self, len: usize) {
        if len > 0 {
            self.cursor = (self.cursor + 1).min(len - 1);
        }
    }

    pub fn up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }
}

fn controls_text() -> String {
    CONTROLS
        .iter()
        .map(|(key, action)| format!("[{key}] {action}"))
        .collect::<Vec<String>>()
        .join(" | ")
}

/// Compute a centered rectangle with given size constrained to `r`.
fn centered_rect_sized(mut width: u16, mut height: u16, r: Rect) -> Rect {
    width = width.min(r.width);
    height = height.min(r.height);

    let x = r.x + (r.width.saturating_sub(width) / 2);
    let y = r.y + (r.height.saturating_sub(height) / 2);
    Rect {
        x,
        y,
        width,
        height,
    }
}

/// Text shown while the engine is still loading.
pub fn loading_lines(view: &EngineView<'_>) -> Vec<String> {
    let mut lines = vec![if view.state.mirror_resolved() {
        "Loading Spotify Music...".to_string()
    } else {
        "Checking Spotify Mirror Status...".to_string()
    }];
    if view.state.mirror_enabled() {
        lines.push("✅ Mirror Mode Enabled".to_string());
    }
    lines
}

/// Connection flags rendered in the header, in display order.
pub fn status_flags(view: &EngineView<'_>) -> Vec<&'static str> {
    let mut flags = Vec::new();
    if view.state.spotify_connected() {
        flags.push("Spotify Connected");
    }
    if view.state.mirror_enabled() {
        flags.push("Mirror Active");
    }
    if view.state.pi_connected() {
        flags.push("Pi Connected");
    }
    flags
}

fn mirror_banner(view: &EngineView<'_>) -> Option<&'static str> {
    (view.state.authoritative() == Some(Authority::Mirrored) && view.state.mirror_enabled())
        .then_some("🎵 Mirror Mode Active - Live Spotify data via Pi integration")
}

/// Render one frame.
///
/// The visualizer fills the background of the player page; `analyzer` is the
/// local element's analyzer while local audio is authoritative.
pub fn draw(
    frame: &mut Frame,
    view: EngineView<'_>,
    panel: &PlaylistPanel,
    settings: &UiSettings,
    visualizer: &mut Visualizer,
    analyzer: Option<&mut Analyzer>,
    tick: u64,
) {
    if let Some(error) = view.state.error() {
        draw_error(frame, &error.to_string());
        return;
    }
    if view.state.is_loading() {
        draw_loading(frame, &view, tick);
        return;
    }

    let area = frame.area();
    visualizer.paint(area, frame.buffer_mut(), analyzer, view.player.is_playing);

    let banner = mirror_banner(&view);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(u16::from(banner.is_some())),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(area);

    draw_header(frame, chunks[0], &view, settings);
    if let Some(text) = banner {
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(PANEL.fg(Color::LightMagenta)),
            chunks[1],
        );
    }

    let mirrored = view.state.authoritative() == Some(Authority::Mirrored);
    let body = if panel.is_open() && !mirrored {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(1), Constraint::Length(40)])
            .split(chunks[2]);
        draw_playlist(frame, split[1], &view, panel);
        split[0]
    } else {
        chunks[2]
    };
    draw_player(frame, centered_rect_sized(64, 10, body), view.player, settings);

    let footer = Paragraph::new(controls_text())
        .style(PANEL)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(if mirrored {
                    " controls (mirrored: read-only) "
                } else {
                    " controls "
                })
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(Clear, chunks[3]);
    frame.render_widget(footer, chunks[3]);
}

fn draw_loading(frame: &mut Frame, view: &EngineView<'_>, tick: u64) {
    let spinner = SPINNER[(tick / 4 % SPINNER.len() as u64) as usize];
    let mut lines = vec![Line::from(spinner.bold()), Line::default()];
    lines.extend(loading_lines(view).into_iter().map(Line::from));

    let area = centered_rect_sized(48, 7, frame.area());
    let card = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::bordered().padding(Padding::top(1)));
    frame.render_widget(card, area);
}

fn draw_error(frame: &mut Frame, message: &str) {
    let lines = vec![
        Line::from("⚠ Error".bold().fg(Color::Red)),
        Line::default(),
        Line::from(message.to_string()),
        Line::default(),
        Line::from("press r to retry, q to quit".italic()),
    ];
    let area = centered_rect_sized(60, 9, frame.area());
    let card = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::bordered().title(" error ").padding(Padding::top(1)));
    frame.render_widget(card, area);
}

fn draw_header(frame: &mut Frame, area: Rect, view: &EngineView<'_>, settings: &UiSettings) {
    let flags = status_flags(view)
        .into_iter()
        .map(|f| Span::styled(format!(" ● {f} "), Style::new().fg(Color::Green)));
    let line = Line::from_iter(
        std::iter::once(Span::from(format!("{}  ", settings.header_text)).bold()).chain(flags),
    );
    let header = Paragraph::new(line).style(PANEL).block(
        Block::default()
            .borders(Borders::ALL)
            .padding(Padding {
                left: 1,
                right: 0,
                top: 0,
                bottom: 0,
            }),
    );
    frame.render_widget(Clear, area);
    frame.render_widget(header, area);
}

fn draw_player(frame: &mut Frame, area: Rect, player: &PlayerState, settings: &UiSettings) {
    frame.render_widget(Clear, area);
    let block = Block::bordered()
        .title(" now playing ")
        .style(PANEL)
        .padding(Padding::horizontal(1));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(track) = &player.track else {
        frame.render_widget(
            Paragraph::new("No track").alignment(Alignment::Center),
            inner,
        );
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    frame.render_widget(Paragraph::new(track.title.as_str().bold()), rows[0]);
    frame.render_widget(
        Paragraph::new(now_playing_line(
            track,
            &settings.now_playing_fields,
            &settings.now_playing_separator,
        )),
        rows[1],
    );
    let badge = if track.is_mirrored() {
        "● Spotify (mirrored)".fg(Color::Green)
    } else {
        "♪ Local".fg(Color::Cyan)
    };
    frame.render_widget(Paragraph::new(badge), rows[2]);

    let progress = Gauge::default()
        .gauge_style(Style::new().fg(Color::Magenta).bg(Color::DarkGray))
        .ratio(player.progress())
        .label(format!(
            "{} / {}",
            format_mmss(player.position_secs),
            format_mmss(player.duration_secs)
        ));
    frame.render_widget(progress, rows[4]);

    let state = if player.is_playing {
        "▶ Playing"
    } else {
        "⏸ Paused"
    };
    let volume = format!("Vol {:>3}%", (player.volume * 100.0).round() as u32);
    frame.render_widget(Paragraph::new(state), rows[5]);
    frame.render_widget(
        Paragraph::new(volume).alignment(Alignment::Right),
        rows[5],
    );
}

fn draw_playlist(frame: &mut Frame, area: Rect, view: &EngineView<'_>, panel: &PlaylistPanel) {
    let current = view.player.track.as_ref().map(|t| t.id.as_str());
    let items: Vec<ListItem> = view
        .playlist
        .tracks()
        .iter()
        .map(|t| {
            let marker = if Some(t.id.as_str()) == current { "♪ " } else { "  " };
            ListItem::new(format!("{marker}{} - {}", t.title, t.artist))
        })
        .collect();

    let list = List::new(items)
        .style(PANEL)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" playlist (enter plays) "),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(panel.cursor()));
    frame.render_widget(Clear, area);
    frame.render_stateful_widget(list, area, &mut state);
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};

    use super::*;
    use crate::engine::{EngineError, EngineState, MirrorLink, Playlist};

    fn text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn render(state: &EngineState) -> String {
        let player = PlayerState::idle(0.5);
        let playlist = Playlist::default();
        let view = EngineView {
            state,
            player: &player,
            playlist: &playlist,
        };
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        let mut viz = Visualizer::new();
        terminal
            .draw(|f| {
                draw(
                    f,
                    view,
                    &PlaylistPanel::default(),
                    &UiSettings::default(),
                    &mut viz,
                    None,
                    0,
                )
            })
            .unwrap();
        text(&terminal)
    }

    #[test]
    fn loading_text_tracks_resolution() {
        let checking = render(&EngineState::ResolvingMirror {
            link: None,
            spotify_connected: false,
        });
        assert!(checking.contains("Checking Spotify Mirror Status..."));

        let loading = render(&EngineState::ResolvingMirror {
            link: Some(MirrorLink {
                enabled: true,
                pi_connected: true,
            }),
            spotify_connected: true,
        });
        assert!(loading.contains("Loading Spotify Music..."));
        assert!(loading.contains("Mirror Mode Enabled"));
    }

    #[test]
    fn error_page_offers_retry() {
        let out = render(&EngineState::Error(EngineError::MirrorEnable(
            "Error connecting to Pi".to_string(),
        )));
        assert!(out.contains("Error connecting to Pi"));
        assert!(out.contains("press r to retry"));
    }

    #[test]
    fn header_lists_connection_flags() {
        let out = render(&EngineState::LocalAuthoritative {
            link: MirrorLink {
                enabled: true,
                pi_connected: false,
            },
            spotify_connected: true,
        });
        assert!(out.contains("SmartMonitor Music"));
        assert!(out.contains("Spotify Connected"));
        assert!(out.contains("Mirror Active"));
        assert!(!out.contains("Pi Connected"));
        assert!(!out.contains("Mirror Mode Active"));
    }

    #[test]
    fn banner_only_while_mirrored() {
        let out = render(&EngineState::MirroredAuthoritative {
            link: MirrorLink {
                enabled: true,
                pi_connected: true,
            },
        });
        assert!(out.contains("Mirror Mode Active - Live Spotify data via Pi integration"));
        assert!(out.contains("read-only"));
    }

    #[test]
    fn panel_cursor_stays_in_bounds() {
        let mut panel = PlaylistPanel::default();
        panel.toggle(Some(2));
        assert!(panel.is_open());
        assert_eq!(panel.cursor(), 2);
        panel.down(3);
        assert_eq!(panel.cursor(), 2);
        panel.up();
        panel.up();
        panel.up();
        assert_eq!(panel.cursor(), 0);
        panel.toggle(None);
        assert!(!panel.is_open());
    }
}
