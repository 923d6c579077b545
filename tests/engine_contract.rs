//! Contract tests for the streaming engine: block conservation, rotation
//! order, clock accounting, and bounded shutdown. Everything runs against
//! in-process sinks, so no audio hardware is required.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use keytone::engine::pool::Block;
use keytone::engine::{AudioEngine, EngineConfig, EngineError};
use keytone::io::capture::CaptureSink;
use keytone::io::sink::{AudioSink, Completion, SubmitError};
use keytone::io::{output_devices, SampleFormat};

fn test_config(block_count: usize, block_samples: usize) -> EngineConfig {
    EngineConfig {
        sample_rate: 48_000,
        channels: 1,
        block_count,
        block_samples,
        sample_format: SampleFormat::Int32,
        device: None,
    }
}

/// Spin until `done` returns true or the budget elapses.
fn wait_for(mut done: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !done() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        std::thread::sleep(Duration::from_millis(2));
    }
}

/// Sink that records submission order, then completes immediately.
struct OrderSink {
    completion: Completion,
    order: Arc<Mutex<Vec<usize>>>,
}

impl AudioSink for OrderSink {
    fn submit(&mut self, block: Block) -> Result<(), SubmitError> {
        self.order.lock().unwrap().push(block.index());
        (self.completion)(block);
        Ok(())
    }
}

#[test]
fn clock_advances_one_period_per_generated_sample() {
    // Sink completes 8 blocks then behaves like a stalled device; with a
    // 4-block pool the producer generates exactly 12 blocks and suspends.
    let tape = Arc::new(Mutex::new(Vec::new()));
    let mut engine = AudioEngine::new(test_config(4, 256));
    engine
        .start_with_sink(|completion| {
            Box::new(
                CaptureSink::new(SampleFormat::Int32, completion)
                    .with_tape(tape.clone())
                    .with_limit(8),
            ) as Box<dyn AudioSink>
        })
        .unwrap();

    wait_for(|| tape.lock().unwrap().len() >= 12 * 256);
    let expected = (12 * 256) as f64 / 48_000.0;
    assert!((engine.time() - expected).abs() < 1e-9);
    assert_eq!(tape.lock().unwrap().len(), 12 * 256);
    // No source registered: the default streams silence.
    assert!(tape.lock().unwrap().iter().all(|&s| s == 0.0));
}

#[test]
fn shutdown_while_blocked_on_the_pool_is_bounded() {
    let mut engine = AudioEngine::new(test_config(4, 128));
    engine
        .start_with_sink(|completion| {
            // Never completes anything: the producer fills the pool, then
            // suspends waiting for a block that will never come back.
            Box::new(CaptureSink::new(SampleFormat::Int32, completion).with_limit(0))
                as Box<dyn AudioSink>
        })
        .unwrap();

    wait_for(|| engine.free_blocks() == Some(0));

    let started = Instant::now();
    engine.stop().unwrap();
    // Budget of a few block periods; at 48 kHz a 128-sample block is ~2.7ms,
    // so even a generous bound proves the wait was released by shutdown.
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!engine.is_running());
}

#[test]
fn blocks_rotate_in_strict_round_robin_order() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let mut engine = AudioEngine::new(test_config(4, 64));
    engine
        .start_with_sink(|completion| {
            Box::new(OrderSink {
                completion,
                order: order.clone(),
            }) as Box<dyn AudioSink>
        })
        .unwrap();

    wait_for(|| order.lock().unwrap().len() >= 12);
    if let Some(free) = engine.free_blocks() {
        assert!(free <= 4, "free count exceeded the pool size");
    }
    engine.stop().unwrap();

    let order = order.lock().unwrap();
    for (submission, &index) in order.iter().take(12).enumerate() {
        assert_eq!(index, submission % 4, "submission {submission} out of order");
    }
}

#[test]
fn engine_streams_the_registered_source() {
    let tape = Arc::new(Mutex::new(Vec::new()));
    let mut engine = AudioEngine::new(test_config(2, 64));
    engine.set_source(|time: f64| (std::f64::consts::TAU * 440.0 * time).sin() * 0.25);
    engine
        .start_with_sink(|completion| {
            Box::new(
                CaptureSink::new(SampleFormat::Int32, completion)
                    .with_tape(tape.clone())
                    .with_limit(4),
            ) as Box<dyn AudioSink>
        })
        .unwrap();

    let total = (4 + 2) * 64;
    wait_for(|| tape.lock().unwrap().len() >= total);
    engine.stop().unwrap();

    let tape = tape.lock().unwrap();
    for (n, &sample) in tape.iter().take(total).enumerate() {
        let time = n as f64 / 48_000.0;
        let expected = (std::f64::consts::TAU * 440.0 * time).sin() * 0.25;
        assert!(
            (f64::from(sample) - expected).abs() < 1e-6,
            "sample {n} diverged from the source"
        );
    }
}

#[test]
fn source_survives_a_restart() {
    let mut engine = AudioEngine::new(test_config(2, 32));
    engine.set_source(|_: f64| 0.125);

    for _ in 0..2 {
        let tape = Arc::new(Mutex::new(Vec::new()));
        engine
            .start_with_sink(|completion| {
                Box::new(
                    CaptureSink::new(SampleFormat::Int32, completion)
                        .with_tape(tape.clone())
                        .with_limit(2),
                ) as Box<dyn AudioSink>
            })
            .unwrap();
        wait_for(|| !tape.lock().unwrap().is_empty());
        engine.stop().unwrap();
        assert!((f64::from(tape.lock().unwrap()[0]) - 0.125).abs() < 1e-6);
    }
}

#[test]
fn degenerate_pool_geometry_is_rejected() {
    let mut engine = AudioEngine::new(test_config(0, 512));
    let result = engine.start_with_sink(|completion| {
        Box::new(CaptureSink::new(SampleFormat::Int32, completion)) as Box<dyn AudioSink>
    });
    assert!(matches!(result, Err(EngineError::AllocationFailed)));
    assert!(!engine.is_running());
}

#[test]
fn stop_without_start_is_a_no_op() {
    let mut engine = AudioEngine::new(test_config(4, 128));
    engine.stop().unwrap();
    assert!(!engine.is_running());
}

#[test]
fn device_enumeration_is_deterministic() {
    // Either both calls fail identically (headless host) or they agree.
    match (output_devices(), output_devices()) {
        (Ok(first), Ok(second)) => assert_eq!(first, second),
        (Err(_), Err(_)) => {}
        (first, second) => panic!("enumeration flapped: {first:?} vs {second:?}"),
    }
}
