//! Offline sink: completes blocks as soon as they are submitted.
//!
//! With no limit, blocks flow through the pool at full speed - rendering to
//! a tape runs as fast as the CPU can synthesize, which is how the engine
//! bounces audio without a device. With a completion limit the sink starts
//! holding blocks once the limit is reached, which stalls the producer on
//! the pool exactly like a silent output device would; the test suite leans
//! on this to exercise the shutdown path deterministically.

use std::sync::{Arc, Mutex};

use crate::engine::pool::Block;
use crate::io::quantize::SampleFormat;
use crate::io::sink::{AudioSink, Completion, SubmitError};

pub struct CaptureSink {
    completion: Completion,
    format: SampleFormat,
    tape: Option<Arc<Mutex<Vec<f32>>>>,
    limit: Option<u64>,
    completed: u64,
    held: Vec<Block>,
}

impl CaptureSink {
    pub fn new(format: SampleFormat, completion: Completion) -> Self {
        Self {
            completion,
            format,
            tape: None,
            limit: None,
            completed: 0,
            held: Vec::new(),
        }
    }

    /// Record every submitted block's samples (dequantized) onto `tape`.
    pub fn with_tape(mut self, tape: Arc<Mutex<Vec<f32>>>) -> Self {
        self.tape = Some(tape);
        self
    }

    /// Complete only the first `blocks` submissions; hold the rest.
    pub fn with_limit(mut self, blocks: u64) -> Self {
        self.limit = Some(blocks);
        self
    }
}

impl AudioSink for CaptureSink {
    fn submit(&mut self, block: Block) -> Result<(), SubmitError> {
        if let Some(tape) = &self.tape {
            let mut tape = tape.lock().unwrap();
            tape.extend(block.samples().iter().map(|&s| self.format.dequantize(s)));
        }
        match self.limit {
            Some(limit) if self.completed >= limit => self.held.push(block),
            _ => {
                self.completed += 1;
                (self.completion)(block);
            }
        }
        Ok(())
    }

    fn close(&mut self) {
        // Held blocks are discarded together with the pool.
        self.held.clear();
    }
}
