//! Typed preference cells.
//!
//! A [`PreferenceData<V>`] caches its value so [`get`](PreferenceData::get)
//! never waits on the datastore. Mutations take a per-cell async guard,
//! update the cache, notify subscribers, then forward the new raw value
//! through the cell's [`PersistHook`] and wait for it. Concurrent `set`s on
//! one cell therefore observe a total order; ordering across cells is the
//! datastore's business.

use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use pref_codec::string;
use pref_types::{PreferenceKey, TypeError, TypedKey};
use tokio::sync::{broadcast, Mutex};
use tracing::warn;

use crate::error::{ModelError, Result};
use crate::hook::PersistHook;
use crate::serializer::{PrimitiveSerializer, PrimitiveValue, ValueSerializer};

/// Capacity of each cell's change channel.
const CHANGE_CHANNEL_CAPACITY: usize = 16;

/// How a raw value offered to a cell was taken.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No raw value; the cell uses its default.
    Unset,
    /// The raw value was decoded and cached.
    Loaded,
    /// The raw value could not be decoded; the cell uses its default.
    Rejected,
}

/// Type-erased view of a cell, used by models and datastores.
pub trait Preference: Send + Sync {
    fn typed_key(&self) -> &TypedKey;

    /// Bind the cell to its datastore.
    ///
    /// Decodes `raw` into the cached value and installs `hook` for all later
    /// mutations. Fails with [`ModelError::AlreadyInitialized`] on a second
    /// call, leaving the cell untouched.
    fn init(&self, raw: Option<&str>, hook: Arc<dyn PersistHook>) -> Result<LoadOutcome>;

    /// Replace the cached value from a new raw value without persisting.
    ///
    /// Used when the datastore swaps its whole snapshot, e.g. on import.
    fn reload(&self, raw: Option<&str>) -> LoadOutcome;

    /// The cached value in on-disk form, or `None` when unset.
    fn raw_value(&self) -> Option<String>;

    fn is_initialized(&self) -> bool;
}

/// A named, typed preference value.
pub struct PreferenceData<V> {
    key: TypedKey,
    default: V,
    serializer: Box<dyn ValueSerializer<V>>,
    cached: RwLock<Option<V>>,
    write_guard: Mutex<()>,
    hook: OnceLock<Arc<dyn PersistHook>>,
    changes: broadcast::Sender<V>,
}

impl<V: PrimitiveValue> PreferenceData<V> {
    /// A cell for one of the built-in kinds.
    pub fn primitive(key: &str, default: V) -> Result<Self> {
        Self::new(key, default, PrimitiveSerializer::<V>::new())
    }
}

impl<V> PreferenceData<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// A cell stored through `serializer`.
    ///
    /// Fails with [`ModelError::InvalidKey`] if `key` cannot be stored.
    pub fn new<S>(key: &str, default: V, serializer: S) -> Result<Self>
    where
        S: ValueSerializer<V> + 'static,
    {
        let key = TypedKey::new(serializer.wire_type(), PreferenceKey::new(key)?);
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            key,
            default,
            serializer: Box::new(serializer),
            cached: RwLock::new(None),
            write_guard: Mutex::new(()),
            hook: OnceLock::new(),
            changes,
        })
    }

    pub fn key(&self) -> &TypedKey {
        &self.key
    }

    pub fn default_value(&self) -> &V {
        &self.default
    }

    /// The current value, or the default when unset.
    pub fn get(&self) -> V {
        self.get_or_none().unwrap_or_else(|| self.default.clone())
    }

    /// The current value, or `None` when the cell holds its default.
    pub fn get_or_none(&self) -> Option<V> {
        self.cached
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Store `value` and wait until the datastore has taken it.
    ///
    /// On a persist failure the value stays cached: the datastore holds it
    /// in memory but it may not be on disk yet.
    pub async fn set(&self, value: V) -> Result<()> {
        let raw = self.encode(&value);
        self.mutate(Some(value), Some(raw)).await
    }

    /// Return to the default and remove the stored entry.
    pub async fn reset(&self) -> Result<()> {
        self.mutate(None, None).await
    }

    /// Receive every value this cell takes from now on.
    ///
    /// Resets deliver the default value.
    pub fn subscribe(&self) -> broadcast::Receiver<V> {
        self.changes.subscribe()
    }

    async fn mutate(&self, value: Option<V>, raw: Option<String>) -> Result<()> {
        let hook = self
            .hook
            .get()
            .cloned()
            .ok_or_else(|| ModelError::NotInitialized {
                key: self.key.clone(),
            })?;

        let _guard = self.write_guard.lock().await;
        self.store(value);
        hook.persist(&self.key, raw)
            .await
            .map_err(|source| ModelError::Persist {
                key: self.key.clone(),
                source,
            })
    }

    fn store(&self, value: Option<V>) {
        let notify = value.clone().unwrap_or_else(|| self.default.clone());
        *self
            .cached
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = value;
        // No subscribers is fine.
        let _ = self.changes.send(notify);
    }

    fn encode(&self, value: &V) -> String {
        let text = self.serializer.serialize(value);
        if self.key.tag.is_string() {
            string::encode(&text)
        } else {
            text
        }
    }

    fn decode(&self, raw: &str) -> std::result::Result<V, String> {
        let text = if self.key.tag.is_string() {
            string::decode(raw).map_err(|e| e.to_string())?
        } else {
            raw.to_string()
        };
        self.serializer
            .deserialize(&text)
            .map_err(|e: TypeError| e.to_string())
    }

    fn load(&self, raw: Option<&str>) -> LoadOutcome {
        let Some(raw) = raw else {
            self.store(None);
            return LoadOutcome::Unset;
        };
        match self.decode(raw) {
            Ok(value) => {
                self.store(Some(value));
                LoadOutcome::Loaded
            }
            Err(reason) => {
                warn!(key = %self.key, raw, %reason, "stored value rejected; using default");
                self.store(None);
                LoadOutcome::Rejected
            }
        }
    }
}

impl<V> Preference for PreferenceData<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn typed_key(&self) -> &TypedKey {
        &self.key
    }

    fn init(&self, raw: Option<&str>, hook: Arc<dyn PersistHook>) -> Result<LoadOutcome> {
        let already = || ModelError::AlreadyInitialized {
            key: self.key.clone(),
        };
        // The hook is only ever installed under the write guard, so a busy
        // guard means another init is binding the cell or it is already
        // bound and mutating.
        let Ok(_guard) = self.write_guard.try_lock() else {
            return Err(already());
        };
        if self.hook.get().is_some() {
            return Err(already());
        }
        let outcome = self.load(raw);
        self.hook.set(hook).map_err(|_| already())?;
        Ok(outcome)
    }

    fn reload(&self, raw: Option<&str>) -> LoadOutcome {
        self.load(raw)
    }

    fn raw_value(&self) -> Option<String> {
        self.get_or_none().map(|value| self.encode(&value))
    }

    fn is_initialized(&self) -> bool {
        self.hook.get().is_some()
    }
}

impl<V> fmt::Debug for PreferenceData<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceData")
            .field("key", &self.key)
            .field("initialized", &self.hook.get().is_some())
            .finish_non_exhaustive()
    }
}
