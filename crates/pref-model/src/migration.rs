//! Load-time migration of stored entries.
//!
//! While a datastore loads its file, every well-formed line is offered to
//! the model's [`Migration`] as a [`MigrationEntry`] with action
//! [`MigrationAction::KeepAsIs`]. The hook returns the entry it wants
//! stored: unchanged, marked [`Reset`](MigrationAction::Reset) to drop it,
//! or marked [`Transform`](MigrationAction::Transform) with a new type, key
//! or value. This is how renamed keys and changed value formats are carried
//! across application versions.

use pref_codec::Record;
use pref_types::{PreferenceKey, TypeTag, TypedKey};
use tracing::debug;

/// What the loader should do with a migrated entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MigrationAction {
    /// Store the entry as it was read.
    KeepAsIs,
    /// Drop the entry; its preference falls back to the default.
    Reset,
    /// Store the entry's (possibly rewritten) type, key and value.
    Transform,
}

/// One stored line as seen by a migration.
///
/// `value` is always decoded: string values arrive unescaped and are
/// re-encoded by the loader when the final type is a string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationEntry {
    pub action: MigrationAction,
    pub tag: TypeTag,
    pub key: String,
    pub value: String,
}

impl MigrationEntry {
    /// An entry to keep as read.
    pub fn keep(tag: TypeTag, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: MigrationAction::KeepAsIs,
            tag,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Mark this entry for removal.
    pub fn reset(self) -> Self {
        Self {
            action: MigrationAction::Reset,
            ..self
        }
    }

    /// Replace this entry with a rewritten one.
    pub fn transform(
        self,
        tag: TypeTag,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            action: MigrationAction::Transform,
            tag,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Whether this entry currently has the given tag and key.
    pub fn is(&self, tag: TypeTag, key: &str) -> bool {
        self.tag == tag && self.key == key
    }
}

impl From<Record> for MigrationEntry {
    fn from(record: Record) -> Self {
        Self::keep(record.tag, String::from(record.key), record.value)
    }
}

/// Application hook that rewrites stored entries during load.
///
/// The default implementation keeps every entry. Closures of type
/// `Fn(MigrationEntry) -> MigrationEntry` implement this trait.
pub trait Migration: Send + Sync {
    fn migrate(&self, entry: MigrationEntry) -> MigrationEntry {
        entry
    }
}

/// The identity migration.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeepAsIs;

impl Migration for KeepAsIs {}

impl<F> Migration for F
where
    F: Fn(MigrationEntry) -> MigrationEntry + Send + Sync,
{
    fn migrate(&self, entry: MigrationEntry) -> MigrationEntry {
        self(entry)
    }
}

/// Run one record through `migration` and resolve the result.
///
/// Returns the record to store, or `None` if the migration reset the entry
/// or rewrote it to an unusable key.
pub fn apply(migration: &dyn Migration, record: Record) -> Option<Record> {
    let original = record.typed_key();
    let entry = migration.migrate(MigrationEntry::from(record));

    match entry.action {
        MigrationAction::Reset => {
            debug!(key = %original, "migration reset entry");
            None
        }
        MigrationAction::KeepAsIs | MigrationAction::Transform => {
            match PreferenceKey::new(entry.key.as_str()) {
                Ok(key) => {
                    if entry.action == MigrationAction::Transform {
                        debug!(
                            from = %original,
                            to = %TypedKey::new(entry.tag, key.clone()),
                            "migration transformed entry"
                        );
                    }
                    Some(Record::new(entry.tag, key, entry.value))
                }
                Err(e) => {
                    debug!(
                        key = %original,
                        error = %e,
                        "migration produced invalid key; dropping entry"
                    );
                    None
                }
            }
        }
    }
}
