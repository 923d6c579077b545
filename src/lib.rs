pub mod dsp;
pub mod engine; // Block pool, producer thread, streaming state machine
pub mod io; // Device sinks, sample formats, enumeration
pub mod notes; // Named note frequencies
pub mod synth; // Active-note registry and oscillator mixing

pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_BLOCK_COUNT: usize = 8;
pub const DEFAULT_BLOCK_SAMPLES: usize = 512;
