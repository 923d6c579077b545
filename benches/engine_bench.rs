//! Benchmarks for the synthesis hot path.
//!
//! Run with: cargo bench
//!
//! The producer thread evaluates oscillators, mixes, and quantizes once per
//! sample; at 44.1 kHz a 512-sample block gives it an ~11.6ms deadline, so
//! these numbers say how much polyphony fits inside a block period.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keytone::dsp::Waveform;
use keytone::io::SampleFormat;
use keytone::synth::Synth;

const BLOCK_SIZES: &[usize] = &[128, 256, 512];
const PERIOD: f64 = 1.0 / 44_100.0;

fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");
    for &size in BLOCK_SIZES {
        for waveform in Waveform::ALL {
            let name = waveform.to_string().to_lowercase();
            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, &size| {
                b.iter(|| {
                    let mut acc = 0.0;
                    for n in 0..size {
                        acc += waveform.amplitude(black_box(440.0), n as f64 * PERIOD);
                    }
                    black_box(acc)
                })
            });
        }
    }
    group.finish();
}

fn bench_mix_and_quantize(c: &mut Criterion) {
    let mut group = c.benchmark_group("synth/block");
    for &voices in &[1usize, 3, 8] {
        let synth = Synth::new();
        for voice in 0..voices {
            synth.note_on(voice as u32, 110.0 * (voice + 1) as f64);
        }
        let format = SampleFormat::Int32;
        group.bench_with_input(BenchmarkId::new("voices", voices), &voices, |b, _| {
            let mut out = vec![0i32; 512];
            b.iter(|| {
                for (n, slot) in out.iter_mut().enumerate() {
                    *slot = format.quantize(synth.sample(n as f64 * PERIOD));
                }
                black_box(out[511])
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_oscillator, bench_mix_and_quantize);
criterion_main!(benches);
