//! In-flight write guard
//!
//! Blocks a second write to the same key while the first is still awaiting
//! the store. Transitions are keyed by (record, stage): different stages of
//! the same record are not blocked, flag monotonicity makes those races
//! safe. Ledger writes are keyed by (GR number, field).

use crate::domain::ids::{GrNumber, TransitRecordId};
use crate::domain::kaat::LedgerField;
use crate::domain::transit::Stage;
use std::collections::HashSet;
use std::hash::Hash;
use std::sync::Mutex;

/// Set of keys with a write in flight
#[derive(Debug)]
pub struct BusySet<K> {
    busy: Mutex<HashSet<K>>,
}

/// (record, stage) pairs with a transition in flight
pub type InFlightSet = BusySet<(TransitRecordId, Stage)>;

/// Claim on one or more transition pairs
pub type InFlightToken<'a> = BusyToken<'a, (TransitRecordId, Stage)>;

/// (GR number, field) pairs with a ledger write in flight
pub type LedgerBusySet = BusySet<(GrNumber, LedgerField)>;

impl<K> Default for BusySet<K> {
    fn default() -> Self {
        Self {
            busy: Mutex::new(HashSet::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> BusySet<K> {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims one key, returning `None` if it is already busy
    ///
    /// The key is released when the returned token is dropped, on every
    /// exit path of the caller.
    pub fn claim(&self, key: K) -> Option<BusyToken<'_, K>> {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        if busy.insert(key.clone()) {
            Some(BusyToken {
                set: self,
                keys: vec![key],
            })
        } else {
            None
        }
    }

    /// Claims every key, or none of them
    ///
    /// Returns the first busy key on conflict.
    pub fn claim_all(&self, keys: Vec<K>) -> Result<BusyToken<'_, K>, K> {
        let mut busy = self.busy.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conflict) = keys.iter().find(|k| busy.contains(*k)) {
            return Err(conflict.clone());
        }

        busy.extend(keys.iter().cloned());
        Ok(BusyToken { set: self, keys })
    }

    /// Whether a key is currently busy
    pub fn contains(&self, key: &K) -> bool {
        self.busy
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }

    /// Number of busy keys
    pub fn len(&self) -> usize {
        self.busy.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// True when nothing is in flight
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl InFlightSet {
    /// Claims a (record, stage) pair
    pub fn try_acquire(&self, record_id: TransitRecordId, stage: Stage) -> Option<InFlightToken<'_>> {
        self.claim((record_id, stage))
    }

    /// Claims a pair for every record, or none of them
    ///
    /// Returns the first busy record id on conflict.
    pub fn try_acquire_all(
        &self,
        record_ids: &[TransitRecordId],
        stage: Stage,
    ) -> Result<InFlightToken<'_>, TransitRecordId> {
        self.claim_all(record_ids.iter().map(|id| (*id, stage)).collect())
            .map_err(|(id, _)| id)
    }

    /// Whether a pair is currently busy
    pub fn is_busy(&self, record_id: TransitRecordId, stage: Stage) -> bool {
        self.contains(&(record_id, stage))
    }
}

/// Claim on one or more keys of a [`BusySet`]
#[derive(Debug)]
pub struct BusyToken<'a, K: Eq + Hash> {
    set: &'a BusySet<K>,
    keys: Vec<K>,
}

impl<K: Eq + Hash> Drop for BusyToken<'_, K> {
    fn drop(&mut self) {
        let mut busy = self.set.busy.lock().unwrap_or_else(|e| e.into_inner());
        for key in &self.keys {
            busy.remove(key);
        }
    }
}
