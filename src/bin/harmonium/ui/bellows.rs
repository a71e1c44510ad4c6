//! Bellows dots widget

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use lid_harmonium::io::BellowsView;

pub fn render_bellows(frame: &mut Frame, area: Rect, view: &BellowsView) {
    let block = Block::default()
        .title(format!(" Bellows {:>3.0}% ", view.pressure * 100.0))
        .borders(Borders::ALL);

    let (full, half, empty) = if view.hand_drawn {
        ("✺", "✹", "·")
    } else {
        ("●", "◐", "○")
    };

    let spans: Vec<Span> = view
        .dot_levels()
        .map(|level| {
            let (symbol, color) = if level >= 0.75 {
                (full, Color::Yellow)
            } else if level >= 0.25 {
                (half, Color::LightYellow)
            } else {
                (empty, Color::DarkGray)
            };
            Span::styled(format!("{symbol} "), Style::default().fg(color))
        })
        .collect();

    let dots = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(block);
    frame.render_widget(dots, area);
}
