//! TUI for the harmonium host
//!
//! Bellows dots, piano range, timbre status and a scope of the output.

mod bellows;
mod keyboard;
pub mod spectrum;
mod status;
mod waveform;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

use bellows::render_bellows;
use keyboard::render_keyboard;
use spectrum::render_spectrum;
use status::render_status;
use waveform::render_waveform;

/// Number of bellows dots
const BELLOWS_DOTS: usize = 16;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Status
            Constraint::Length(3), // Bellows
            Constraint::Length(5), // Keyboard
            Constraint::Min(8),    // Scope
            Constraint::Length(1), // Help
        ])
        .split(frame.area());

    let engine = app.engine();
    render_status(frame, chunks[0], app);
    render_bellows(
        frame,
        chunks[1],
        &engine.bellows_view(BELLOWS_DOTS).with_hand_drawn(app.hand_drawn()),
    );
    render_keyboard(frame, chunks[2], app.range(), &engine.active_note_set());

    let scope = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[3]);
    let (front, back) = app.scope().as_slices();
    render_waveform(frame, scope[0], front, back);
    render_spectrum(frame, scope[1], app.spectrum().data());

    let help = Paragraph::new(
        " [A..K] Play  [Z/X] Octave  [↑/↓] Pump lid  [Space] Start/Stop  [Esc] All off  \
         [ [ ] ] Bright  [-/=] Chorus  [,/.] Octave mix  [Q] Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, chunks[4]);
}
