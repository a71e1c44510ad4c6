//! harmonium - terminal reed organ
//!
//! Run with: cargo run --bin harmonium -- --help

mod app;
mod cli;
mod ui;

use std::io::stdout;

use clap::Parser;
use crossterm::{
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, terminal,
};
use rtrb::RingBuffer;

use app::App;
use cli::Args;
use lid_harmonium::{runtime::OutputDevice, Engine};

/// Scope samples buffered between the audio callback and the UI
const SCOPE_QUEUE: usize = 16_384;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    // Logs go to stderr, which the TUI owns, so they stay off unless asked for.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();

    let args = Args::parse();

    let device = OutputDevice::default_output()?;
    let sample_rate = device.sample_rate();
    let (engine, synth) = Engine::new(args.engine_config(sample_rate));

    let (scope_tx, scope_rx) = RingBuffer::new(SCOPE_QUEUE);
    let _output = device.open(synth, Some(scope_tx))?;

    let mut terminal = ratatui::init();
    let release_events = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout(),
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let mut app = App::new(engine, scope_rx, sample_rate, &args, release_events);
    let result = app.run(&mut terminal);

    if release_events {
        let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
    }
    ratatui::restore();
    result
}
