// Purpose: the real-time streaming core - block rotation, the producer
// thread, and its Stopped -> Running -> Stopping -> Stopped state machine.

pub mod clock;
pub mod error;
pub mod pool;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::io::device;
use crate::io::quantize::SampleFormat;
use crate::io::sink::{AudioSink, Completion};
use crate::{DEFAULT_BLOCK_COUNT, DEFAULT_BLOCK_SAMPLES, DEFAULT_SAMPLE_RATE};

pub use clock::SampleClock;
pub use error::EngineError;
pub use pool::{Block, BlockPool};

/// Anything that can answer "what is the amplitude at `time` seconds".
///
/// Implemented for any `FnMut(f64) -> f64` closure, so a source can carry
/// captured state; `Arc<Synth>` implements it directly. Must return values
/// in [-1, 1] - the engine clips before quantizing either way.
pub trait SampleSource: Send {
    fn sample(&mut self, time: f64) -> f64;
}

impl<F> SampleSource for F
where
    F: FnMut(f64) -> f64 + Send,
{
    fn sample(&mut self, time: f64) -> f64 {
        self(time)
    }
}

/// Engine configuration. Defaults mirror the crate-level constants: 44.1 kHz
/// mono, eight blocks of 512 samples, 32-bit samples, default output device.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub block_count: usize,
    pub block_samples: usize,
    pub sample_format: SampleFormat,
    /// Output device name as reported by `io::output_devices`; `None` picks
    /// the system default.
    pub device: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            block_count: DEFAULT_BLOCK_COUNT,
            block_samples: DEFAULT_BLOCK_SAMPLES,
            sample_format: SampleFormat::Int32,
            device: None,
        }
    }
}

/// State shared between the engine owner and the producer thread.
struct EngineShared {
    stop: AtomicBool,
    /// Elapsed seconds, stored as f64 bits. Written by the producer only.
    clock_bits: AtomicU64,
    underruns: AtomicU64,
    device_lost: AtomicBool,
}

/// Live resources of a Running engine.
struct Runtime {
    pool: Arc<BlockPool>,
    worker: JoinHandle<Box<dyn SampleSource>>,
    /// The OS stream must stay alive (and on the owner thread) for playback
    /// to continue; dropping it stops the device.
    stream: Option<cpal::Stream>,
}

/// Double-buffered streaming engine.
///
/// `start` allocates the block pool, opens the sink, and spawns the producer
/// loop; `stop` winds it all down cooperatively within a few block periods.
/// The registered synthesis source survives a stop, so the engine can be
/// restarted. Because the engine owns the OS stream handle it is not `Send`;
/// keep it on the thread that started it.
pub struct AudioEngine {
    config: EngineConfig,
    source: Option<Box<dyn SampleSource>>,
    shared: Arc<EngineShared>,
    runtime: Option<Runtime>,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            source: None,
            shared: Arc::new(EngineShared {
                stop: AtomicBool::new(false),
                clock_bits: AtomicU64::new(0f64.to_bits()),
                underruns: AtomicU64::new(0),
                device_lost: AtomicBool::new(false),
            }),
            runtime: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register the synthesis source consulted for every sample. Without one
    /// the engine streams silence.
    pub fn set_source<S: SampleSource + 'static>(&mut self, source: S) {
        self.source = Some(Box::new(source));
    }

    /// Open the configured output device and start streaming.
    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.runtime.is_some() {
            log::debug!("start ignored: engine already running");
            return Ok(());
        }
        let pool = self.make_pool()?;
        let completion = Self::recycle_into(&pool);
        let (sink, stream) = device::open_sink(&self.config, completion)?;
        self.spawn(pool, Box::new(sink), Some(stream))
    }

    /// Start streaming into a caller-provided sink instead of an OS device.
    ///
    /// The factory receives the completion handle that returns finished
    /// blocks to the pool; the sink must invoke it exactly once per
    /// submitted block it finishes with. Used for offline rendering (see
    /// `io::capture`) and by the test suite.
    pub fn start_with_sink<F>(&mut self, make_sink: F) -> Result<(), EngineError>
    where
        F: FnOnce(Completion) -> Box<dyn AudioSink>,
    {
        if self.runtime.is_some() {
            log::debug!("start ignored: engine already running");
            return Ok(());
        }
        let pool = self.make_pool()?;
        let completion = Self::recycle_into(&pool);
        let sink = make_sink(completion);
        self.spawn(pool, sink, None)
    }

    /// Wind the producer down and release the device.
    ///
    /// Reports `DeviceLost` if the sink died while running; every other
    /// runtime condition is non-fatal and already logged.
    pub fn stop(&mut self) -> Result<(), EngineError> {
        let Some(runtime) = self.runtime.take() else {
            return Ok(());
        };
        log::debug!("engine stopping");
        self.shared.stop.store(true, Ordering::Release);
        // The producer may be asleep waiting for a free block; shutdown
        // always wakes it, completion or not.
        runtime.pool.shutdown();
        match runtime.worker.join() {
            Ok(source) => self.source = Some(source),
            Err(_) => log::error!("producer thread panicked"),
        }
        drop(runtime.stream);
        log::debug!("engine stopped");

        if self.shared.device_lost.load(Ordering::Acquire) {
            return Err(EngineError::DeviceLost);
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_some()
    }

    /// Elapsed global-clock time in seconds, as last published by the
    /// producer (updated once per generated block).
    pub fn time(&self) -> f64 {
        f64::from_bits(self.shared.clock_bits.load(Ordering::Acquire))
    }

    /// Number of device callbacks the sink had to pad with silence because
    /// no block was ready.
    pub fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }

    /// True once the sink has reported the device permanently gone.
    pub fn device_lost(&self) -> bool {
        self.shared.device_lost.load(Ordering::Acquire)
    }

    /// Free blocks in the pool right now; `None` while stopped.
    pub fn free_blocks(&self) -> Option<usize> {
        self.runtime.as_ref().map(|runtime| runtime.pool.free_count())
    }

    fn make_pool(&self) -> Result<Arc<BlockPool>, EngineError> {
        if self.config.block_count == 0 || self.config.block_samples == 0 {
            return Err(EngineError::AllocationFailed);
        }
        Ok(Arc::new(BlockPool::new(
            self.config.block_count,
            self.config.block_samples,
        )))
    }

    /// Completion handle handed to the sink: an explicit captured context,
    /// so several engines can coexist in one process.
    fn recycle_into(pool: &Arc<BlockPool>) -> Completion {
        let pool = pool.clone();
        Box::new(move |block| pool.release(block))
    }

    fn spawn(
        &mut self,
        pool: Arc<BlockPool>,
        sink: Box<dyn AudioSink>,
        stream: Option<cpal::Stream>,
    ) -> Result<(), EngineError> {
        self.shared.stop.store(false, Ordering::Release);
        self.shared.device_lost.store(false, Ordering::Release);
        self.shared.underruns.store(0, Ordering::Relaxed);
        self.shared.clock_bits.store(0f64.to_bits(), Ordering::Release);

        let source = self
            .source
            .take()
            .unwrap_or_else(|| Box::new(|_: f64| 0.0));
        let config = self.config.clone();
        let shared = self.shared.clone();
        let worker_pool = pool.clone();
        let worker = std::thread::Builder::new()
            .name("keytone-engine".into())
            .spawn(move || run_producer(config, worker_pool, sink, source, shared))
            .map_err(|_| EngineError::AllocationFailed)?;

        log::info!(
            "engine running: {} blocks x {} samples at {} Hz",
            self.config.block_count,
            self.config.block_samples,
            self.config.sample_rate,
        );
        self.runtime = Some(Runtime { pool, worker, stream });
        Ok(())
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// The Running loop: acquire a free block, fill it sample by sample from the
/// source, quantize, submit, rotate. Returns the source so the engine can be
/// restarted with it.
fn run_producer(
    config: EngineConfig,
    pool: Arc<BlockPool>,
    mut sink: Box<dyn AudioSink>,
    mut source: Box<dyn SampleSource>,
    shared: Arc<EngineShared>,
) -> Box<dyn SampleSource> {
    let mut clock = SampleClock::new(config.sample_rate);
    let format = config.sample_format;

    while !shared.stop.load(Ordering::Acquire) {
        if !sink.is_alive() {
            log::error!("audio device lost, halting generation");
            shared.device_lost.store(true, Ordering::Release);
            break;
        }

        // The only suspension point; released by completion or shutdown.
        let Some(mut block) = pool.acquire() else {
            break;
        };

        for slot in block.samples_mut() {
            *slot = format.quantize(source.sample(clock.seconds()));
            clock.advance();
        }

        shared
            .clock_bits
            .store(clock.seconds().to_bits(), Ordering::Release);

        match sink.submit(block) {
            Ok(()) => {}
            Err(rejected) => {
                // Degraded playback, not fatal: this block's audio is lost
                // but the buffer itself goes straight back into rotation.
                log::warn!("{}: {rejected}", EngineError::SubmitFailed);
                pool.release(rejected.into_block());
            }
        }
        shared
            .underruns
            .store(sink.underruns(), Ordering::Relaxed);
    }

    sink.close();
    source
}
