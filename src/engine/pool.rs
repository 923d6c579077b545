use std::collections::VecDeque;
use std::fmt;
use std::sync::{Condvar, Mutex};

/// Fixed-length buffer of quantized mono samples, tagged with its pool slot.
///
/// A block is either free (owned by the engine, writable) or in-flight
/// (owned by the sink, read-only). Ownership alternates by moving the value:
/// `BlockPool::acquire` hands it to the producer, `AudioSink::submit` moves
/// it into the sink, and the completion notification moves it back via
/// `BlockPool::release`. The two sides can never alias it.
pub struct Block {
    index: usize,
    samples: Box<[i32]>,
}

impl Block {
    fn new(index: usize, len: usize) -> Self {
        Self {
            index,
            samples: vec![0; len].into_boxed_slice(),
        }
    }

    /// Position of this block in the pool's ring.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i32] {
        &mut self.samples
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("index", &self.index)
            .field("len", &self.samples.len())
            .finish()
    }
}

struct PoolState {
    free: VecDeque<Block>,
    stopped: bool,
}

/// Fixed ring of blocks with a counting wait on the free side.
///
/// Rotation is strict round-robin: blocks are acquired in index order, and
/// because the sink completes them in submission order, the free queue stays
/// in ring order too. Playback order therefore exactly matches generation
/// order.
pub struct BlockPool {
    state: Mutex<PoolState>,
    available: Condvar,
    count: usize,
    block_samples: usize,
}

impl BlockPool {
    pub fn new(count: usize, block_samples: usize) -> Self {
        let free = (0..count)
            .map(|index| Block::new(index, block_samples))
            .collect();
        Self {
            state: Mutex::new(PoolState {
                free,
                stopped: false,
            }),
            available: Condvar::new(),
            count,
            block_samples,
        }
    }

    /// Wait until a block is free, mark it in-flight, and hand it over.
    ///
    /// Returns `None` once `shutdown` has been called, including when the
    /// caller was already asleep inside the wait: shutdown always issues a
    /// wake-up, so a pending wait is released deterministically even if no
    /// completion ever arrives again.
    pub fn acquire(&self) -> Option<Block> {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(block) = state.free.pop_front() {
                return Some(block);
            }
            state = self.available.wait(state).unwrap();
        }
    }

    /// Return a block to the free ring and wake one waiter. Called from the
    /// sink's completion context, which runs on a thread the engine does not
    /// control.
    pub fn release(&self, block: Block) {
        let mut state = self.state.lock().unwrap();
        debug_assert!(
            state.free.len() < self.count,
            "released more blocks than the pool owns"
        );
        state.free.push_back(block);
        self.available.notify_one();
    }

    /// Stop handing out blocks and release any pending `acquire` wait.
    pub fn shutdown(&self) {
        let mut state = self.state.lock().unwrap();
        state.stopped = true;
        self.available.notify_all();
    }

    /// Number of blocks currently free. Never exceeds `block_count`.
    pub fn free_count(&self) -> usize {
        self.state.lock().unwrap().free.len()
    }

    pub fn block_count(&self) -> usize {
        self.count
    }

    pub fn block_samples(&self) -> usize {
        self.block_samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    #[test]
    fn starts_with_every_block_free() {
        let pool = BlockPool::new(8, 512);
        assert_eq!(pool.free_count(), 8);
        assert_eq!(pool.block_count(), 8);
        assert_eq!(pool.block_samples(), 512);
    }

    #[test]
    fn acquire_hands_out_blocks_in_ring_order() {
        let pool = BlockPool::new(4, 16);
        let mut held = Vec::new();
        for expected in 0..4 {
            let block = pool.acquire().unwrap();
            assert_eq!(block.index(), expected);
            held.push(block);
        }
        assert_eq!(pool.free_count(), 0);

        // Completions arrive in submission order; the ring keeps rotating.
        for block in held {
            pool.release(block);
        }
        assert_eq!(pool.free_count(), 4);
        assert_eq!(pool.acquire().unwrap().index(), 0);
    }

    #[test]
    fn free_count_never_exceeds_pool_size() {
        let pool = BlockPool::new(3, 8);
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        pool.release(a);
        pool.release(b);
        assert_eq!(pool.free_count(), 3);
    }

    #[test]
    fn release_unblocks_a_waiting_acquire() {
        let pool = Arc::new(BlockPool::new(1, 8));
        let block = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            std::thread::spawn(move || pool.acquire().map(|b| b.index()))
        };
        std::thread::sleep(Duration::from_millis(20));
        pool.release(block);
        assert_eq!(waiter.join().unwrap(), Some(0));
    }

    #[test]
    fn shutdown_wakes_a_blocked_acquire_within_budget() {
        let pool = Arc::new(BlockPool::new(2, 8));
        let _a = pool.acquire().unwrap();
        let _b = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            std::thread::spawn(move || {
                let started = Instant::now();
                let block = pool.acquire();
                (block.is_none(), started.elapsed())
            })
        };
        std::thread::sleep(Duration::from_millis(30));
        pool.shutdown();

        let (woke_empty, waited) = waiter.join().unwrap();
        assert!(woke_empty, "shutdown must release the wait with no block");
        assert!(waited < Duration::from_secs(1), "wait released too slowly");
    }

    #[test]
    fn acquire_after_shutdown_returns_none() {
        let pool = BlockPool::new(2, 8);
        pool.shutdown();
        assert!(pool.acquire().is_none());
    }
}
