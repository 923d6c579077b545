use std::fmt;

use crate::engine::pool::Block;

/// Handle a sink invokes when the device has finished consuming a block.
///
/// The engine builds one per pool and captures the pool inside it - an
/// explicit context, so multiple engines can stream at once. It runs on
/// whatever thread the sink completes from; the engine does not control it.
pub type Completion = Box<dyn FnMut(Block) + Send>;

/// Submit side of an audio output.
///
/// A sink accepts filled blocks for asynchronous playback and must invoke
/// its registered `Completion` exactly once per block it finishes with. It
/// never mutates block contents. Implementations: the cpal device sink
/// (`io::device`) and the offline capture sink (`io::capture`).
pub trait AudioSink: Send {
    /// Hand a filled block to the output, returning immediately. On failure
    /// the block comes back inside the error so the caller can recycle it.
    fn submit(&mut self, block: Block) -> Result<(), SubmitError>;

    /// False once the device is permanently gone.
    fn is_alive(&self) -> bool {
        true
    }

    /// Callbacks the device had to pad with silence so far.
    fn underruns(&self) -> u64 {
        0
    }

    /// Stop playback and release output resources.
    fn close(&mut self) {}
}

/// A block the sink could not accept, returned to the caller so the pool
/// never leaks on the degraded path.
pub struct SubmitError(Block);

impl SubmitError {
    pub fn new(block: Block) -> Self {
        Self(block)
    }

    pub fn into_block(self) -> Block {
        self.0
    }
}

impl fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubmitError").field(&self.0).finish()
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink rejected block {}", self.0.index())
    }
}

impl std::error::Error for SubmitError {}
