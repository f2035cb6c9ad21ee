use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use super::{Storage, StorageError, SweepSession};
use crate::models::Note;

/// In-memory stand-in for the postgres backend, with the same observable
/// contract: unique ids, conditional delete, exclusive sweep sessions.
#[derive(Default)]
pub struct MemoryStorage {
    notes: Mutex<HashMap<String, Note>>,
    sweeping: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> MemoryStorage {
        MemoryStorage::default()
    }

    pub fn note_count(&self) -> usize {
        self.notes.lock().map(|map| map.len()).unwrap_or(0)
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<String, Note>>, StorageError> {
        self.notes
            .lock()
            .map_err(|_| StorageError::Backend("note map lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn insert_note(&self, note: Note) -> Result<(), StorageError> {
        let mut map = self.guard()?;
        if map.contains_key(&note.id) {
            return Err(StorageError::IdCollision);
        }
        map.insert(note.id.clone(), note);
        Ok(())
    }

    fn fetch_note(&self, note_id: &str) -> Result<Option<Note>, StorageError> {
        Ok(self.guard()?.get(note_id).cloned())
    }

    fn delete_authorized(&self, note_id: &str, token: &str) -> Result<bool, StorageError> {
        let mut map = self.guard()?;
        match map.get(note_id) {
            Some(note) if note.delete_token == token => {
                map.remove(note_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn begin_sweep(&self) -> Result<Option<Box<dyn SweepSession + '_>>, StorageError> {
        match self
            .sweeping
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
        {
            Ok(_) => Ok(Some(Box::new(MemorySweep { store: self }))),
            Err(_) => Ok(None),
        }
    }
}

struct MemorySweep<'a> {
    store: &'a MemoryStorage,
}

impl SweepSession for MemorySweep<'_> {
    fn delete_expired_batch(
        &mut self,
        cutoff: SystemTime,
        limit: i64,
    ) -> Result<usize, StorageError> {
        let mut map = self.store.guard()?;
        let expired: Vec<String> = map
            .iter()
            .filter(|(_, note)| note.is_expired(cutoff))
            .take(limit as usize)
            .map(|(note_id, _)| note_id.clone())
            .collect();
        for note_id in &expired {
            map.remove(note_id);
        }
        Ok(expired.len())
    }

    fn finish(self: Box<Self>) -> Vec<String> {
        self.store.sweeping.store(false, Ordering::Release);
        Vec::new()
    }
}
