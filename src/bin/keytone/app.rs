//! Keytone - main application builder and runner

use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use ratatui::DefaultTerminal;

use keytone::engine::{AudioEngine, EngineConfig, EngineError};
use keytone::synth::Synth;

use super::keys;
use super::ui::View;

/// Main application builder
pub struct Keytone {
    config: EngineConfig,
}

enum Action {
    Continue,
    Quit,
}

impl Keytone {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    /// Select an output device by name; `None` uses the system default.
    pub fn device(mut self, device: Option<String>) -> Self {
        self.config.device = device;
        self
    }

    pub fn sample_rate(mut self, sample_rate: Option<u32>) -> Self {
        if let Some(rate) = sample_rate {
            self.config.sample_rate = rate;
        }
        self
    }

    /// Run the application (takes over the terminal, plays audio)
    pub fn run(self) -> EyreResult<()> {
        let synth = Arc::new(Synth::new());
        let mut engine = self.start_engine(&synth)?;

        let mut terminal = ratatui::init();

        // Key-release reporting needs a terminal that speaks the kitty
        // protocol; without it we fall back to tap-to-toggle notes. The
        // probe requires raw mode, so it runs after the terminal is set up.
        let release_events = crossterm::terminal::supports_keyboard_enhancement()
            .unwrap_or(false)
            && execute!(
                stdout(),
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
            )
            .is_ok();

        let result = event_loop(&mut terminal, &synth, &engine, release_events);

        if release_events {
            let _ = execute!(stdout(), PopKeyboardEnhancementFlags);
        }
        ratatui::restore();

        let stopped = engine.stop();
        result?;
        stopped.wrap_err("audio device failed during playback")?;
        Ok(())
    }

    fn start_engine(&self, synth: &Arc<Synth>) -> EyreResult<AudioEngine> {
        let mut engine = AudioEngine::new(self.config.clone());
        engine.set_source(synth.clone());
        match engine.start() {
            Ok(()) => Ok(engine),
            // Plenty of hosts refuse mono; retry with a stereo fan-out
            // before giving up.
            Err(EngineError::DeviceOpenFailed(_)) if self.config.channels == 1 => {
                let mut config = self.config.clone();
                config.channels = 2;
                let mut engine = AudioEngine::new(config);
                engine.set_source(synth.clone());
                engine
                    .start()
                    .wrap_err("failed to open the audio output device")?;
                Ok(engine)
            }
            Err(err) => Err(err).wrap_err("failed to start the audio engine"),
        }
    }
}

impl Default for Keytone {
    fn default() -> Self {
        Self::new()
    }
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    synth: &Arc<Synth>,
    engine: &AudioEngine,
    release_events: bool,
) -> EyreResult<()> {
    let mut view = View::new(engine.config(), release_events);
    loop {
        terminal.draw(|frame| view.render(frame, synth, engine))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            match key.kind {
                KeyEventKind::Press => {
                    if let Action::Quit = handle_press(key, synth, release_events) {
                        return Ok(());
                    }
                }
                KeyEventKind::Release => {
                    if let Some((id, _)) = keys::note_for(key.code) {
                        synth.note_off(id);
                    }
                }
                _ => {}
            }
        }
    }
}

fn handle_press(key: KeyEvent, synth: &Arc<Synth>, release_events: bool) -> Action {
    if key.code == KeyCode::Esc
        || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
    {
        return Action::Quit;
    }
    if key.code == KeyCode::Backspace {
        synth.all_notes_off();
        return Action::Continue;
    }
    if let Some(waveform) = keys::waveform_for(key.code) {
        synth.set_waveform(waveform);
        return Action::Continue;
    }
    if let Some((id, frequency)) = keys::note_for(key.code) {
        if release_events {
            synth.note_on(id, frequency);
        } else if synth.is_holding(id) {
            synth.note_off(id);
        } else {
            synth.note_on(id, frequency);
        }
    }
    Action::Continue
}
