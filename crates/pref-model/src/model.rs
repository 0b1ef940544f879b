//! Preference models: the validated set of declared cells.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use pref_types::{TypeTag, TypedKey};

use crate::cell::Preference;
use crate::error::{ModelError, Result};
use crate::migration::{KeepAsIs, Migration};

/// An immutable, validated registry of preference cells.
///
/// Cells keep their declaration order, which is also the order their lines
/// are written to disk. No key string may be owned by more than one cell,
/// whatever the cells' types.
pub struct PreferenceModel {
    name: String,
    entries: Vec<Arc<dyn Preference>>,
    index: HashMap<TypedKey, usize>,
    migration: Arc<dyn Migration>,
}

impl PreferenceModel {
    /// Validate `entries` and build a model with the identity migration.
    pub fn new(name: impl Into<String>, entries: Vec<Arc<dyn Preference>>) -> Result<Self> {
        Self::with_migration(name, entries, Arc::new(KeepAsIs))
    }

    /// Validate `entries` and build a model using `migration` at load time.
    pub fn with_migration(
        name: impl Into<String>,
        entries: Vec<Arc<dyn Preference>>,
        migration: Arc<dyn Migration>,
    ) -> Result<Self> {
        let name = name.into();

        let mut owners: BTreeMap<String, Vec<TypeTag>> = BTreeMap::new();
        for entry in &entries {
            let key = entry.typed_key();
            owners
                .entry(key.key.as_str().to_string())
                .or_default()
                .push(key.tag);
        }
        let conflicts: BTreeMap<String, Vec<TypeTag>> = owners
            .into_iter()
            .filter(|(_, tags)| tags.len() > 1)
            .collect();
        if !conflicts.is_empty() {
            return Err(ModelError::DuplicateKeys {
                model: name,
                conflicts,
            });
        }

        let index = entries
            .iter()
            .enumerate()
            .map(|(pos, entry)| (entry.typed_key().clone(), pos))
            .collect();

        Ok(Self {
            name,
            entries,
            index,
            migration,
        })
    }

    /// Start declaring a model.
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            entries: Vec::new(),
            migration: Arc::new(KeepAsIs),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared cells in declaration order.
    pub fn entries(&self) -> &[Arc<dyn Preference>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declaration position of `key`, if it is declared.
    pub fn position(&self, key: &TypedKey) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &TypedKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn get(&self, key: &TypedKey) -> Option<&Arc<dyn Preference>> {
        self.position(key).map(|pos| &self.entries[pos])
    }

    /// Declared keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &TypedKey> + '_ {
        self.entries.iter().map(|entry| entry.typed_key())
    }

    pub fn migration(&self) -> &dyn Migration {
        self.migration.as_ref()
    }
}

impl fmt::Debug for PreferenceModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreferenceModel")
            .field("name", &self.name)
            .field("keys", &self.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

/// Incremental declaration of a [`PreferenceModel`].
///
/// ```
/// use std::sync::Arc;
/// use pref_model::{PreferenceData, PreferenceModel};
///
/// let integer = Arc::new(PreferenceData::primitive("integer", 0i32)?);
/// let string = Arc::new(PreferenceData::primitive("string", String::new())?);
///
/// let model = PreferenceModel::builder("settings")
///     .entry(&integer)
///     .entry(&string)
///     .build()?;
/// assert_eq!(model.len(), 2);
/// # Ok::<(), pref_model::ModelError>(())
/// ```
pub struct ModelBuilder {
    name: String,
    entries: Vec<Arc<dyn Preference>>,
    migration: Arc<dyn Migration>,
}

impl ModelBuilder {
    /// Declare a cell. The caller keeps its typed handle.
    pub fn entry<P: Preference + 'static>(mut self, cell: &Arc<P>) -> Self {
        self.entries.push(cell.clone());
        self
    }

    /// Use `migration` when loading stored entries.
    pub fn migration<M: Migration + 'static>(mut self, migration: M) -> Self {
        self.migration = Arc::new(migration);
        self
    }

    /// Validate the declarations.
    pub fn build(self) -> Result<PreferenceModel> {
        PreferenceModel::with_migration(self.name, self.entries, self.migration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::PreferenceData;
    use crate::migration::MigrationEntry;

    #[test]
    fn keeps_declaration_order() {
        let b = Arc::new(PreferenceData::primitive("b", false).unwrap());
        let a = Arc::new(PreferenceData::primitive("a", 0i32).unwrap());
        let model = PreferenceModel::builder("m").entry(&b).entry(&a).build().unwrap();

        let keys: Vec<String> = model.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b;b", "i;a"]);
        assert_eq!(model.position(a.key()), Some(1));
        assert!(model.contains(b.key()));
        assert_eq!(model.name(), "m");
    }

    #[test]
    fn lookup_of_undeclared_key() {
        let a = Arc::new(PreferenceData::primitive("a", 0i32).unwrap());
        let model = PreferenceModel::builder("m").entry(&a).build().unwrap();

        let other = TypedKey::parse(TypeTag::Long, "a").unwrap();
        assert!(model.get(&other).is_none());
        assert!(model.get(a.key()).is_some());
    }

    #[test]
    fn duplicate_typed_keys_fail() {
        let first = Arc::new(PreferenceData::primitive("volume", 0i32).unwrap());
        let second = Arc::new(PreferenceData::primitive("volume", 5i32).unwrap());

        let err = PreferenceModel::builder("audio")
            .entry(&first)
            .entry(&second)
            .build()
            .unwrap_err();

        match err {
            ModelError::DuplicateKeys { model, conflicts } => {
                assert_eq!(model, "audio");
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts["volume"], vec![TypeTag::Int, TypeTag::Int]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn key_reused_across_types_fails() {
        let int = Arc::new(PreferenceData::primitive("size", 0i32).unwrap());
        let text = Arc::new(PreferenceData::primitive("size", String::new()).unwrap());
        let ok = Arc::new(PreferenceData::primitive("other", true).unwrap());

        let err = PreferenceModel::builder("layout")
            .entry(&int)
            .entry(&ok)
            .entry(&text)
            .build()
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("layout"));
        assert!(message.contains("size [i, s]"));
        match err {
            ModelError::DuplicateKeys { conflicts, .. } => {
                assert_eq!(conflicts.keys().collect::<Vec<_>>(), vec!["size"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn reports_every_conflicting_key() {
        let cells: Vec<Arc<dyn Preference>> = vec![
            Arc::new(PreferenceData::primitive("x", 0i32).unwrap()),
            Arc::new(PreferenceData::primitive("y", 0i64).unwrap()),
            Arc::new(PreferenceData::primitive("x", 0f64).unwrap()),
            Arc::new(PreferenceData::primitive("y", false).unwrap()),
        ];
        let err = PreferenceModel::new("m", cells).unwrap_err();
        match err {
            ModelError::DuplicateKeys { conflicts, .. } => {
                assert_eq!(conflicts["x"], vec![TypeTag::Int, TypeTag::Double]);
                assert_eq!(conflicts["y"], vec![TypeTag::Long, TypeTag::Boolean]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn custom_migration_is_kept() {
        let a = Arc::new(PreferenceData::primitive("a", 0i32).unwrap());
        let model = PreferenceModel::builder("m")
            .entry(&a)
            .migration(|entry: MigrationEntry| entry.reset())
            .build()
            .unwrap();

        let out = model
            .migration()
            .migrate(MigrationEntry::keep(TypeTag::Int, "a", "1"));
        assert_eq!(out.action, crate::migration::MigrationAction::Reset);
    }

    #[test]
    fn empty_model_is_valid() {
        let model = PreferenceModel::new("empty", Vec::new()).unwrap();
        assert!(model.is_empty());
    }
}
