//! cpal-backed output sink.
//!
//! Blocks travel from the producer thread to the OS audio callback through
//! an SPSC ring sized to the pool, so the ring can never overflow while the
//! pool invariant holds. The callback drains blocks frame by frame,
//! dequantizes, fans the mono sample out to every device channel, and fires
//! the completion handle once a block is spent - on the device's thread,
//! not ours.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::{Consumer, Producer, RingBuffer};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::engine::pool::Block;
use crate::engine::{EngineConfig, EngineError};
use crate::io::quantize::SampleFormat;
use crate::io::sink::{AudioSink, Completion, SubmitError};

struct SinkShared {
    alive: AtomicBool,
    underruns: AtomicU64,
}

/// Submit-side handle for a cpal output stream. The stream object itself is
/// returned separately from `open_sink` and must stay on the opening thread.
pub struct DeviceSink {
    tx: Producer<Block>,
    shared: Arc<SinkShared>,
}

impl AudioSink for DeviceSink {
    fn submit(&mut self, block: Block) -> Result<(), SubmitError> {
        match self.tx.push(block) {
            Ok(()) => Ok(()),
            Err(rtrb::PushError::Full(block)) => Err(SubmitError::new(block)),
        }
    }

    fn is_alive(&self) -> bool {
        self.shared.alive.load(Ordering::Acquire)
    }

    fn underruns(&self) -> u64 {
        self.shared.underruns.load(Ordering::Relaxed)
    }
}

/// Names of the available output devices, in OS-reported order. The order is
/// deterministic for a fixed hardware configuration.
pub fn output_devices() -> Result<Vec<String>, EngineError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|_| EngineError::DeviceUnavailable)?;
    let mut names = Vec::new();
    for device in devices {
        if let Ok(name) = device.name() {
            names.push(name);
        }
    }
    Ok(names)
}

fn select_device(requested: Option<&str>) -> Result<cpal::Device, EngineError> {
    let host = cpal::default_host();
    match requested {
        Some(name) => {
            let mut devices = host
                .output_devices()
                .map_err(|_| EngineError::DeviceUnavailable)?;
            devices
                .find(|device| device.name().map(|n| n == name).unwrap_or(false))
                .ok_or(EngineError::DeviceUnavailable)
        }
        None => host
            .default_output_device()
            .ok_or(EngineError::DeviceUnavailable),
    }
}

/// Open the configured output device and start its stream.
///
/// Returns the `Send` submit handle together with the stream object. The
/// stream is playback's lifeline: dropping it closes the device, which is
/// exactly how the engine's stop path releases OS resources.
pub fn open_sink(
    config: &EngineConfig,
    completion: Completion,
) -> Result<(DeviceSink, cpal::Stream), EngineError> {
    let device = select_device(config.device.as_deref())?;
    let supported = device
        .default_output_config()
        .map_err(|err| EngineError::DeviceOpenFailed(err.to_string()))?;
    let stream_config = cpal::StreamConfig {
        channels: config.channels,
        sample_rate: cpal::SampleRate(config.sample_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    let (tx, rx) = RingBuffer::new(config.block_count);
    let shared = Arc::new(SinkShared {
        alive: AtomicBool::new(true),
        underruns: AtomicU64::new(0),
    });

    let stream = match supported.sample_format() {
        cpal::SampleFormat::F32 => build_stream::<f32>(
            &device,
            &stream_config,
            rx,
            config.sample_format,
            completion,
            shared.clone(),
        ),
        cpal::SampleFormat::I16 => build_stream::<i16>(
            &device,
            &stream_config,
            rx,
            config.sample_format,
            completion,
            shared.clone(),
        ),
        cpal::SampleFormat::U16 => build_stream::<u16>(
            &device,
            &stream_config,
            rx,
            config.sample_format,
            completion,
            shared.clone(),
        ),
        other => Err(EngineError::DeviceOpenFailed(format!(
            "unsupported device sample format {other:?}"
        ))),
    }?;

    stream
        .play()
        .map_err(|err| EngineError::DeviceOpenFailed(err.to_string()))?;

    if let Ok(name) = device.name() {
        log::debug!(
            "output open on {name}: {} Hz, {} channel(s)",
            config.sample_rate,
            config.channels
        );
    }
    Ok((DeviceSink { tx, shared }, stream))
}

fn build_stream<T>(
    device: &cpal::Device,
    stream_config: &cpal::StreamConfig,
    mut rx: Consumer<Block>,
    format: SampleFormat,
    mut completion: Completion,
    shared: Arc<SinkShared>,
) -> Result<cpal::Stream, EngineError>
where
    T: cpal::SizedSample + cpal::FromSample<f32> + Send + 'static,
{
    let channels = stream_config.channels as usize;
    let err_shared = shared.clone();
    // Block currently being drained, and how far into it we are.
    let mut current: Option<(Block, usize)> = None;

    let stream = device
        .build_output_stream(
            stream_config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                let mut starved = false;
                for frame in data.chunks_mut(channels) {
                    if current.is_none() {
                        current = rx.pop().ok().map(|block| (block, 0));
                    }
                    let value = if let Some((block, position)) = current.as_mut() {
                        let value = format.dequantize(block.samples()[*position]);
                        *position += 1;
                        value
                    } else {
                        starved = true;
                        0.0
                    };
                    let spent = current
                        .as_ref()
                        .is_some_and(|(block, position)| *position == block.len());
                    if spent {
                        if let Some((block, _)) = current.take() {
                            completion(block);
                        }
                    }
                    let converted = T::from_sample(value);
                    for channel in frame.iter_mut() {
                        *channel = converted;
                    }
                }
                if starved {
                    shared.underruns.fetch_add(1, Ordering::Relaxed);
                }
            },
            move |err| {
                log::error!("audio stream error: {err}");
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    err_shared.alive.store(false, Ordering::Release);
                }
            },
            None,
        )
        .map_err(|err| EngineError::DeviceOpenFailed(err.to_string()))?;

    Ok(stream)
}
