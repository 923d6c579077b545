//! Terminal view: waveform selection, held notes, and engine statistics.

use std::sync::Arc;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use keytone::dsp::Waveform;
use keytone::engine::{AudioEngine, EngineConfig};
use keytone::synth::Synth;

pub struct View {
    device: String,
    sample_rate: u32,
    release_events: bool,
}

impl View {
    pub fn new(config: &EngineConfig, release_events: bool) -> Self {
        Self {
            device: config
                .device
                .clone()
                .unwrap_or_else(|| "default output".to_string()),
            sample_rate: config.sample_rate,
            release_events,
        }
    }

    pub fn render(&mut self, frame: &mut Frame, synth: &Arc<Synth>, engine: &AudioEngine) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(frame.area());

        // Waveform selector
        let selected = synth.waveform();
        let mut spans = vec![Span::raw("Waveform: ")];
        for (slot, waveform) in Waveform::ALL.iter().enumerate() {
            let label = format!(" {} {} ", slot + 1, waveform);
            let style = if *waveform == selected {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            spans.push(Span::styled(label, style));
            spans.push(Span::raw(" "));
        }
        frame.render_widget(
            Paragraph::new(Line::from(spans))
                .block(Block::default().borders(Borders::ALL).title(" keytone ")),
            chunks[0],
        );

        // Engine status
        let status = format!(
            "{} @ {} Hz | t = {:7.2}s | underruns: {}{}",
            self.device,
            self.sample_rate,
            engine.time(),
            engine.underruns(),
            if engine.device_lost() {
                " | DEVICE LOST"
            } else {
                ""
            },
        );
        frame.render_widget(
            Paragraph::new(status).block(Block::default().borders(Borders::ALL).title(" engine ")),
            chunks[1],
        );

        // Held notes
        let mut frequencies = synth.held_frequencies();
        frequencies.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let notes = if frequencies.is_empty() {
            "-".to_string()
        } else {
            frequencies
                .iter()
                .map(|f| format!("{f:.1} Hz"))
                .collect::<Vec<_>>()
                .join("  ")
        };
        frame.render_widget(
            Paragraph::new(notes).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" notes ({}) ", synth.active_notes())),
            ),
            chunks[2],
        );

        // Help line
        let mode = if self.release_events {
            "hold keys to play"
        } else {
            "tap keys to toggle notes"
        };
        let help = format!(
            "ZXCVBNM = C4-B4   QWERTYUIOP = C5-E6   1-4 = waveform   Backspace = silence   Esc = quit   ({mode})"
        );
        frame.render_widget(
            Paragraph::new(help).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }
}
