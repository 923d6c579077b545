use std::collections::HashMap;
use std::sync::Mutex;

/// Opaque note identifier assigned by the input layer. The registry never
/// interprets it; it only has to be unique per held note.
pub type NoteId = u32;

/// Concurrency-safe mapping from note id to frequency.
///
/// Mutable from any thread; the producer thread reads it as a point-in-time
/// snapshot. Writers hold the lock only long enough to touch the map, and
/// readers only long enough to copy the frequencies out, so neither side can
/// stall the other for unbounded time.
pub struct NoteRegistry {
    notes: Mutex<HashMap<NoteId, f64>>,
}

impl NoteRegistry {
    pub fn new() -> Self {
        Self {
            notes: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or retune) a note. Calling `note_on` for an id that is already
    /// held overwrites its frequency.
    pub fn note_on(&self, id: NoteId, frequency: f64) {
        debug_assert!(frequency > 0.0, "note frequency must be positive");
        self.notes.lock().unwrap().insert(id, frequency);
    }

    /// Stop a note. Releasing an id that is not held is a no-op, not an
    /// error: key-up events can arrive for keys we never mapped.
    pub fn note_off(&self, id: NoteId) {
        self.notes.lock().unwrap().remove(&id);
    }

    /// Silence everything at once.
    pub fn clear(&self) {
        self.notes.lock().unwrap().clear();
    }

    pub fn contains(&self, id: NoteId) -> bool {
        self.notes.lock().unwrap().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.notes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Point-in-time copy of the active frequencies. Allocates; intended for
    /// front-ends and tests, not the audio path.
    pub fn snapshot(&self) -> Vec<f64> {
        self.notes.lock().unwrap().values().copied().collect()
    }

    /// Copy active frequencies into `out` without allocating, returning how
    /// many were written. The lock is released before the caller iterates,
    /// so synthesis never mixes while holding it. Notes beyond `out.len()`
    /// are skipped for that snapshot.
    pub fn snapshot_into(&self, out: &mut [f64]) -> usize {
        let notes = self.notes.lock().unwrap();
        let mut written = 0;
        for &frequency in notes.values() {
            if written == out.len() {
                break;
            }
            out[written] = frequency;
            written += 1;
        }
        written
    }
}

impl Default for NoteRegistry {
    fn default() -> Self {
        Self::new()
    }
}
