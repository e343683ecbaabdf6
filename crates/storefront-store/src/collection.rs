//! # Persistent Collection
//!
//! Ordered keyed collection that writes itself through to a
//! [`KeyValueSlot`] after every mutation.
//!
//! ## Mutation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  set / delete / clear                                                   │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  1. update in-memory map (+ insertion order)                           │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  2. save(): whole collection as a JSON array ──► slot.write(key)       │
//! │        │        (failure: warn! and continue)                          │
//! │        ▼                                                                │
//! │  3. notify subscribers with a Change                                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Loading
//! A missing slot or a payload that is not a JSON array yields an empty
//! collection. Individual records that fail to decode, or that break their
//! own invariant ([`Keyed::is_valid`]), are dropped.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use storefront_core::{CartLine, ProductId};

use crate::error::{StoreError, StoreResult};
use crate::slot::KeyValueSlot;

// =============================================================================
// Keyed Records
// =============================================================================

/// A record that knows its own key.
pub trait Keyed {
    type Key: Clone + Eq + Hash + Debug;

    fn key(&self) -> Self::Key;

    /// Record-level invariant checked on load and on `set`.
    fn is_valid(&self) -> bool {
        true
    }
}

impl Keyed for CartLine {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.product_id.clone()
    }

    fn is_valid(&self) -> bool {
        self.quantity >= 1
    }
}

/// A bare id is its own key (set semantics).
impl Keyed for ProductId {
    type Key = ProductId;

    fn key(&self) -> ProductId {
        self.clone()
    }
}

// =============================================================================
// Subscriptions
// =============================================================================

/// What changed in a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<K> {
    /// The collection was (re)loaded from its slot.
    Loaded,
    /// A record was inserted or replaced.
    Set(K),
    /// A record was deleted.
    Removed(K),
    /// Every record was deleted.
    Cleared,
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener<K> = Box<dyn FnMut(&Change<K>) + Send>;

// =============================================================================
// Store
// =============================================================================

/// Ordered mapping from `V::Key` to `V`, persisted under a fixed slot key.
pub struct PersistentCollectionStore<V: Keyed> {
    slot: Arc<dyn KeyValueSlot>,
    slot_key: String,
    entries: HashMap<V::Key, V>,
    order: Vec<V::Key>,
    listeners: Vec<(SubscriptionId, Listener<V::Key>)>,
    next_subscription: u64,
}

impl<V> PersistentCollectionStore<V>
where
    V: Keyed + Clone + Serialize + DeserializeOwned,
{
    /// Loads the collection stored under `slot_key`. Never fails.
    pub fn load(slot: Arc<dyn KeyValueSlot>, slot_key: impl Into<String>) -> Self {
        let mut store = PersistentCollectionStore {
            slot,
            slot_key: slot_key.into(),
            entries: HashMap::new(),
            order: Vec::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        };
        store.read_slot();
        store
    }

    /// Re-reads the slot, discarding in-memory state, and notifies `Loaded`.
    pub fn reload(&mut self) {
        self.read_slot();
        self.notify(Change::Loaded);
    }

    fn read_slot(&mut self) {
        self.entries.clear();
        self.order.clear();

        let records = match self.decode_slot() {
            Ok(records) => records,
            Err(e) => {
                warn!(slot = %self.slot_key, error = %e, "Discarding unreadable slot");
                Vec::new()
            }
        };

        let total = records.len();
        for raw in records {
            match serde_json::from_value::<V>(raw) {
                Ok(record) if record.is_valid() => self.insert(record),
                Ok(record) => {
                    warn!(slot = %self.slot_key, key = ?record.key(), "Dropping invalid record")
                }
                Err(e) => warn!(slot = %self.slot_key, error = %e, "Dropping undecodable record"),
            }
        }

        debug!(slot = %self.slot_key, loaded = self.order.len(), total, "Collection loaded");
    }

    fn decode_slot(&self) -> StoreResult<Vec<Value>> {
        let Some(payload) = self.slot.read(&self.slot_key)? else {
            return Ok(Vec::new());
        };

        serde_json::from_str(&payload).map_err(|source| StoreError::Decode {
            key: self.slot_key.clone(),
            source,
        })
    }

    /// Writes the whole collection to the slot. Failures are logged only.
    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(slot = %self.slot_key, error = %e, "Failed to persist collection");
        }
    }

    fn try_save(&self) -> StoreResult<()> {
        let payload = serde_json::to_string(&self.all()).map_err(|source| StoreError::Encode {
            key: self.slot_key.clone(),
            source,
        })?;
        self.slot.write(&self.slot_key, &payload)
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Inserts or replaces the record with the same key.
    ///
    /// Returns `false` (and changes nothing) when the record is invalid.
    pub fn set(&mut self, value: V) -> bool {
        if !value.is_valid() {
            warn!(slot = %self.slot_key, key = ?value.key(), "Refusing invalid record");
            return false;
        }

        let key = value.key();
        self.insert(value);
        self.save();
        self.notify(Change::Set(key));
        true
    }

    /// Deletes the record with `key`, returning it.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<V>
    where
        V::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.entries.remove(key)?;
        self.order
            .retain(|k| <V::Key as Borrow<Q>>::borrow(k) != key);

        self.save();
        self.notify(Change::Removed(removed.key()));
        Some(removed)
    }

    /// Deletes every record.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.save();
        self.notify(Change::Cleared);
    }

    fn insert(&mut self, value: V) {
        let key = value.key();
        if self.entries.insert(key.clone(), value).is_none() {
            self.order.push(key);
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        V::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        V::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Records in insertion order.
    pub fn all(&self) -> Vec<&V> {
        self.order
            .iter()
            .filter_map(|k| self.entries.get(k))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn slot_key(&self) -> &str {
        &self.slot_key
    }
}

impl<V: Keyed> PersistentCollectionStore<V> {
    /// Registers a listener called after every mutation (and its save).
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Change<V::Key>) + Send + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, change: Change<V::Key>) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&change);
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
