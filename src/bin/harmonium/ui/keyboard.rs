//! Piano range widget
//!
//! Two columns per note: black keys on the top row, white keys below, then C labels.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use lid_harmonium::io::{
    keyboard::ActiveNoteSet,
    midi::{is_black_key, note_name},
    KeyRange,
};

pub fn render_keyboard(frame: &mut Frame, area: Rect, range: KeyRange, active: &ActiveNoteSet) {
    let block = Block::default()
        .title(format!(
            " Keys {}–{} ({} sounding) ",
            note_name(range.start),
            note_name(range.end),
            active.len()
        ))
        .borders(Borders::ALL);

    let key = |note: u8, black_row: bool| {
        if is_black_key(note) != black_row {
            return Span::raw("  ");
        }
        let color = match (active.contains(note), black_row) {
            (true, _) => Color::Yellow,
            (false, true) => Color::DarkGray,
            (false, false) => Color::White,
        };
        Span::styled("█ ", Style::default().fg(color))
    };

    let black: Vec<Span> = range.notes().map(|note| key(note, true)).collect();
    let white: Vec<Span> = range.notes().map(|note| key(note, false)).collect();
    let labels: String = range
        .notes()
        .map(|note| if note % 12 == 0 { format!("{:<2}", note_name(note)) } else { "  ".to_string() })
        .collect();

    let keys = Paragraph::new(vec![
        Line::from(black),
        Line::from(white),
        Line::styled(labels, Style::default().fg(Color::DarkGray)),
    ])
    .block(block);
    frame.render_widget(keys, area);
}
