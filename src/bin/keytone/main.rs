//! keytone - terminal polyphonic keyboard synthesizer
//!
//! Run with: cargo run
//!
//! Two rows of the QWERTY layout play notes (ZXCVBNM for octave 4,
//! QWERTYUIOP for octaves 5-6), digits 1-4 pick the waveform, Esc quits.

mod app;
mod keys;
mod ui;

use app::Keytone;
use keytone::io::output_devices;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let mut list_devices = false;
    let mut device = None;
    let mut sample_rate = None;
    for arg in std::env::args().skip(1) {
        if arg == "--list-devices" {
            list_devices = true;
        } else if let Some(name) = arg.strip_prefix("--device=") {
            device = Some(name.to_string());
        } else if let Some(rate) = arg.strip_prefix("--sample-rate=") {
            sample_rate = rate.parse().ok();
        } else {
            eprintln!("unknown argument: {arg}");
        }
    }

    if list_devices {
        println!("Available output devices:");
        for name in output_devices()? {
            println!("- {name}");
        }
        return Ok(());
    }

    Keytone::new().device(device).sample_rate(sample_rate).run()
}
