//! Named note frequencies in Hz, equal temperament with A4 = 440.
//!
//! Covers the three octaves a two-row QWERTY keyboard can reach; front-ends
//! build their key tables from these.

// Octave 4
pub const C4: f64 = 261.626;
pub const D4: f64 = 293.665;
pub const E4: f64 = 329.628;
pub const F4: f64 = 349.228;
pub const G4: f64 = 392.000;
pub const A4: f64 = 440.000;
pub const B4: f64 = 493.883;

// Octave 5
pub const C5: f64 = 523.25;
pub const D5: f64 = 587.33;
pub const E5: f64 = 659.25;
pub const F5: f64 = 698.46;
pub const G5: f64 = 783.99;
pub const A5: f64 = 880.00;
pub const B5: f64 = 987.77;

// Octave 6
pub const C6: f64 = 1046.50;
pub const D6: f64 = 1174.66;
pub const E6: f64 = 1318.51;
