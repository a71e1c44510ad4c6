//! Status bar - engine state, bellows readings and timbre

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use lid_harmonium::EngineState;

use crate::app::App;

pub fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let engine = app.engine();
    let block = Block::default().title(" harmonium ").borders(Borders::ALL);

    let (symbol, label, color) = match engine.state() {
        EngineState::Running => ("▶", "Running", Color::Green),
        EngineState::Stopped => ("⏸", "Stopped", Color::Yellow),
    };

    let line = Line::from(vec![
        Span::styled(format!(" {symbol} {label}  "), Style::default().fg(color)),
        Span::styled(
            format!("Lid: {:>5.1}°  {:>6.1}°/s  ", app.lid_angle(), engine.current_velocity()),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!(
                "Voices: {}/{}  ",
                engine.active_note_count(),
                engine.config().max_voices
            ),
            Style::default().fg(Color::Magenta),
        ),
        Span::raw(format!(
            "LPF {:.2}  Chorus {:.2}  Octave {:.2}  ",
            engine.lpf_alpha(),
            engine.chorus_mix(),
            engine.octave_up_mix()
        )),
        Span::styled(
            format!(
                "Oct {:+}  {:.0}kHz{}",
                app.octave_shift(),
                app.sample_rate() / 1000.0,
                if app.release_events() { "" } else { "  (hold timeout)" }
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
