use thiserror::Error;

/// Engine and device failures, split by severity.
///
/// Initialization errors (`DeviceUnavailable`, `DeviceOpenFailed`,
/// `AllocationFailed`) are returned synchronously from `AudioEngine::start`
/// with no partial state left live. During playback only `DeviceLost` is
/// fatal; a failed block submit is logged and generation continues.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No output devices were found, or the selected device is missing.
    #[error("no matching audio output device is available")]
    DeviceUnavailable,

    /// The device refused the requested stream format.
    #[error("audio device refused the requested format: {0}")]
    DeviceOpenFailed(String),

    /// The block pool or producer thread could not be set up.
    #[error("could not reserve the audio block pool")]
    AllocationFailed,

    /// The device became permanently unusable during playback.
    #[error("audio device was lost during playback")]
    DeviceLost,

    /// A single block failed to reach the sink; playback is degraded but
    /// generation continues.
    #[error("a block could not be submitted to the audio sink")]
    SubmitFailed,
}
