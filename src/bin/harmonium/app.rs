//! Terminal host: computer keyboard → notes, arrow keys → simulated lid.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEvent as TermKeyEvent, KeyEventKind};
use ratatui::DefaultTerminal;
use rtrb::Consumer;

use lid_harmonium::{
    io::{midi::validate_note, KeyEvent, KeyRange},
    Engine,
};

use crate::cli::Args;
use crate::ui::{self, spectrum::SpectrumAnalyzer};

/// Scope window shown by the waveform and analysed by the spectrum
pub const SCOPE_LEN: usize = 2048;

/// UI and sensor tick, about 60 Hz
const FRAME: Duration = Duration::from_millis(16);

/// Without release events a note is let go once key repeat stops refreshing it.
/// Must exceed the terminal's initial repeat delay.
const HOLD_TIMEOUT: Duration = Duration::from_millis(600);

/// Degrees of lid travel per arrow key press
const LID_STEP: f32 = 6.0;
const LID_RANGE: (f32, f32) = (0.0, 135.0);

/// Piano row on a QWERTY keyboard, C to C
const KEY_ROW: [char; 13] = ['a', 'w', 's', 'e', 'd', 'f', 't', 'g', 'y', 'h', 'u', 'j', 'k'];

pub struct App {
    engine: Engine,
    scope_rx: Consumer<f32>,
    scope: VecDeque<f32>,
    spectrum: SpectrumAnalyzer,
    sample_rate: f32,
    range: KeyRange,
    octave_shift: i32,
    lid_angle: f32,
    /// Last press (or repeat) of each note held from the computer keyboard
    held: [Option<Instant>; 128],
    release_events: bool,
    hand_drawn: bool,
    should_quit: bool,
}

impl App {
    pub fn new(
        engine: Engine,
        scope_rx: Consumer<f32>,
        sample_rate: f32,
        args: &Args,
        release_events: bool,
    ) -> Self {
        Self {
            engine,
            scope_rx,
            scope: VecDeque::from(vec![0.0; SCOPE_LEN]),
            spectrum: SpectrumAnalyzer::new(SCOPE_LEN, sample_rate),
            sample_rate,
            range: args.key_range(),
            octave_shift: 0,
            lid_angle: 90.0,
            held: [None; 128],
            release_events,
            hand_drawn: !args.plain_dots,
            should_quit: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        self.engine.start_engine();

        while !self.should_quit {
            let now = Instant::now();
            // The sensor reports even when the lid is still.
            self.engine.update_with_lid_angle_at(self.lid_angle, now);
            self.expire_held(now);
            self.poll_scope();

            terminal.draw(|frame| ui::render(frame, self))?;

            if event::poll(FRAME)? {
                while let Event::Key(key) = event::read()? {
                    self.handle_key(key);
                    if !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }

        self.engine.stop_engine();
        Ok(())
    }

    fn poll_scope(&mut self) {
        let mut received = false;
        while let Ok(sample) = self.scope_rx.pop() {
            self.scope.pop_front();
            self.scope.push_back(sample);
            received = true;
        }
        if received {
            self.spectrum.update(self.scope.make_contiguous());
        }
    }

    fn handle_key(&mut self, key: TermKeyEvent) {
        let now = Instant::now();

        if let KeyCode::Char(c) = key.code {
            if let Some(note) = self.key_note(c) {
                match key.kind {
                    KeyEventKind::Release => self.release_held(note),
                    _ => {
                        if self.held[note as usize].is_none() {
                            self.engine.handle_key_event(KeyEvent::down(note as i32));
                        }
                        self.held[note as usize] = Some(now);
                    }
                }
                return;
            }
        }

        if key.kind == KeyEventKind::Release {
            return;
        }

        match key.code {
            KeyCode::Up => self.move_lid(LID_STEP),
            KeyCode::Down => self.move_lid(-LID_STEP),
            _ if key.kind == KeyEventKind::Repeat => {}
            KeyCode::Char(' ') => {
                if self.engine.is_engine_running() {
                    self.engine.stop_engine();
                } else {
                    self.engine.start_engine();
                }
                self.held = [None; 128];
            }
            KeyCode::Esc => {
                self.engine.all_notes_off();
                self.held = [None; 128];
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Char('z') => self.shift_octave(-1),
            KeyCode::Char('x') => self.shift_octave(1),
            KeyCode::Char('[') => self.engine.set_lpf_alpha(self.engine.lpf_alpha() - 0.01),
            KeyCode::Char(']') => self.engine.set_lpf_alpha(self.engine.lpf_alpha() + 0.01),
            KeyCode::Char('-') => self.engine.set_chorus_mix(self.engine.chorus_mix() - 0.05),
            KeyCode::Char('=') => self.engine.set_chorus_mix(self.engine.chorus_mix() + 0.05),
            KeyCode::Char(',') => self.engine.set_octave_up_mix(self.engine.octave_up_mix() - 0.05),
            KeyCode::Char('.') => self.engine.set_octave_up_mix(self.engine.octave_up_mix() + 0.05),
            _ => {}
        }
    }

    fn key_note(&self, c: char) -> Option<u8> {
        let offset = KEY_ROW.iter().position(|&k| k == c.to_ascii_lowercase())? as i32;
        validate_note(self.range.start as i32 + 12 * self.octave_shift + offset)
    }

    fn release_held(&mut self, note: u8) {
        if self.held[note as usize].take().is_some() {
            self.engine.handle_key_event(KeyEvent::up(note as i32));
        }
    }

    fn expire_held(&mut self, now: Instant) {
        if self.release_events {
            return;
        }
        for note in 0..self.held.len() {
            if let Some(last) = self.held[note] {
                if now.duration_since(last) > HOLD_TIMEOUT {
                    self.release_held(note as u8);
                }
            }
        }
    }

    fn shift_octave(&mut self, delta: i32) {
        for note in 0..self.held.len() {
            self.release_held(note as u8);
        }
        self.octave_shift = (self.octave_shift + delta).clamp(-4, 4);
    }

    fn move_lid(&mut self, delta: f32) {
        self.lid_angle = (self.lid_angle + delta).clamp(LID_RANGE.0, LID_RANGE.1);
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn scope(&self) -> &VecDeque<f32> {
        &self.scope
    }

    pub fn spectrum(&self) -> &SpectrumAnalyzer {
        &self.spectrum
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn range(&self) -> KeyRange {
        self.range
    }

    pub fn octave_shift(&self) -> i32 {
        self.octave_shift
    }

    pub fn lid_angle(&self) -> f32 {
        self.lid_angle
    }

    pub fn hand_drawn(&self) -> bool {
        self.hand_drawn
    }

    pub fn release_events(&self) -> bool {
        self.release_events
    }
}
