use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;

use crate::foundation::error::RigResult;

type Slot<V> = Arc<Mutex<Option<Arc<V>>>>;

/// Read-through cache keyed by string with one lock per key.
///
/// The outer map lock is only held long enough to find or create the slot for a key. Loading
/// happens under the slot lock, so concurrent callers asking for the same key wait for one load
/// while callers for unrelated keys never contend. Failed loads are not remembered; the next
/// caller retries against the backing source.
pub(crate) struct KeyedCache<V> {
    slots: Mutex<HashMap<String, Slot<V>>>,
}

impl<V> Default for KeyedCache<V> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> KeyedCache<V> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get_or_try_load(
        &self,
        key: &str,
        load: impl FnOnce() -> RigResult<V>,
    ) -> RigResult<Arc<V>> {
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(key.to_owned()).or_default().clone()
        };

        let mut value = slot.lock();
        if let Some(v) = value.as_ref() {
            return Ok(v.clone());
        }

        let loaded = Arc::new(load()?);
        *value = Some(loaded.clone());
        Ok(loaded)
    }

    /// Drop every cached value. In-flight loads keep their slot and finish normally.
    pub(crate) fn clear(&self) {
        self.slots.lock().clear();
    }

    /// Number of loaded keys. Slots busy with a load are skipped rather than waited on.
    pub(crate) fn len(&self) -> usize {
        let slots: Vec<Slot<V>> = self.slots.lock().values().cloned().collect();
        slots
            .iter()
            .filter(|slot| slot.try_lock().is_some_and(|v| v.is_some()))
            .count()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/cache.rs"]
mod tests;
