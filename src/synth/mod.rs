// Purpose: the note control surface - who is playing what, and how it mixes.
// This layer sits between the input/control collaborators and the engine.

pub mod registry;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::dsp::Waveform;
use crate::engine::SampleSource;

pub use registry::{NoteId, NoteRegistry};

/// Headroom factor applied to the summed oscillator mix before clipping.
pub const MIX_ATTENUATION: f64 = 0.5;

/// Most simultaneous notes voiced in a single sample. The registry itself is
/// unbounded; this only caps the stack buffer the mixer snapshots into.
pub const MAX_VOICED_NOTES: usize = 32;

/// Polyphonic tone generator: an active-note registry plus a process-wide
/// waveform selection, mixed through the oscillator bank.
///
/// All control operations (`note_on`, `note_off`, `set_waveform`) are safe to
/// call from any number of threads while the engine is sampling. Waveform
/// selection is a single atomic byte, so readers always observe a valid prior
/// or current value.
pub struct Synth {
    registry: NoteRegistry,
    waveform: AtomicU8,
}

impl Synth {
    pub fn new() -> Self {
        Self {
            registry: NoteRegistry::new(),
            waveform: AtomicU8::new(Waveform::Sine.index()),
        }
    }

    pub fn note_on(&self, id: NoteId, frequency: f64) {
        self.registry.note_on(id, frequency);
    }

    pub fn note_off(&self, id: NoteId) {
        self.registry.note_off(id);
    }

    pub fn all_notes_off(&self) {
        self.registry.clear();
    }

    pub fn set_waveform(&self, waveform: Waveform) {
        self.waveform.store(waveform.index(), Ordering::Relaxed);
    }

    pub fn waveform(&self) -> Waveform {
        Waveform::from_index(self.waveform.load(Ordering::Relaxed))
    }

    pub fn is_holding(&self, id: NoteId) -> bool {
        self.registry.contains(id)
    }

    pub fn active_notes(&self) -> usize {
        self.registry.len()
    }

    /// Point-in-time copy of the active frequencies, for display and tests.
    pub fn held_frequencies(&self) -> Vec<f64> {
        self.registry.snapshot()
    }

    /// Mix every active note at `time` seconds.
    ///
    /// Copies the frequencies out of the registry into a stack buffer, drops
    /// the lock, then evaluates the oscillator bank, so no lock is held while
    /// synthesizing. Returns `MIX_ATTENUATION` times the oscillator sum; the
    /// engine clips and quantizes downstream.
    pub fn sample(&self, time: f64) -> f64 {
        let mut frequencies = [0.0f64; MAX_VOICED_NOTES];
        let voiced = self.registry.snapshot_into(&mut frequencies);
        let waveform = self.waveform();

        let mut mixed = 0.0;
        for &frequency in &frequencies[..voiced] {
            mixed += waveform.amplitude(frequency, time);
        }
        mixed * MIX_ATTENUATION
    }
}

impl Default for Synth {
    fn default() -> Self {
        Self::new()
    }
}

/// A shared `Synth` plugs straight into the engine as its synthesis source.
impl SampleSource for Arc<Synth> {
    fn sample(&mut self, time: f64) -> f64 {
        Synth::sample(self, time)
    }
}
