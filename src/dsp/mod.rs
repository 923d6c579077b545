//! Low-level DSP primitives used by the synthesis layer.
//!
//! Everything here is allocation-free and realtime-safe: pure functions of
//! frequency and time with no hidden state, so the producer thread can call
//! them for every sample without touching the allocator or a lock.

/// Oscillator waveforms.
pub mod oscillator;

pub use oscillator::Waveform;
