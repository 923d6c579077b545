//! Pre-defined key-to-frequency table.
//!
//! Two-row piano layout: the bottom letter row covers octave 4, the top row
//! climbs from C5 to E6. The note id is the key's character, so holding a
//! key maps to exactly one registry entry.

use crossterm::event::KeyCode;
use keytone::dsp::Waveform;
use keytone::notes;
use keytone::synth::NoteId;

pub fn note_for(code: KeyCode) -> Option<(NoteId, f64)> {
    let KeyCode::Char(c) = code else {
        return None;
    };
    let key = c.to_ascii_lowercase();
    let frequency = match key {
        // Top row: QWERTYUIOP maps to C5-E6
        'q' => notes::C5,
        'w' => notes::D5,
        'e' => notes::E5,
        'r' => notes::F5,
        't' => notes::G5,
        'y' => notes::A5,
        'u' => notes::B5,
        'i' => notes::C6,
        'o' => notes::D6,
        'p' => notes::E6,
        // Bottom row: ZXCVBNM maps to C4-B4
        'z' => notes::C4,
        'x' => notes::D4,
        'c' => notes::E4,
        'v' => notes::F4,
        'b' => notes::G4,
        'n' => notes::A4,
        'm' => notes::B4,
        _ => return None,
    };
    Some((key as NoteId, frequency))
}

pub fn waveform_for(code: KeyCode) -> Option<Waveform> {
    match code {
        KeyCode::Char('1') => Some(Waveform::Sine),
        KeyCode::Char('2') => Some(Waveform::Square),
        KeyCode::Char('3') => Some(Waveform::Saw),
        KeyCode::Char('4') => Some(Waveform::Triangle),
        _ => None,
    }
}
