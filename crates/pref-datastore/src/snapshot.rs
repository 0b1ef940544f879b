//! The actor's authoritative state and its load/persist pipeline.

use pref_codec::{parse_document, render_document};
use pref_model::migration;
use pref_model::PreferenceModel;
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::strategy::{LoadStrategy, PersistStrategy};

/// Raw values for every declared entry, in declaration order.
///
/// Slot `i` belongs to `model.entries()[i]`, so the key set always equals
/// the model's declared entries. Values are in on-disk form.
pub(crate) type RawValues = Vec<Option<String>>;

pub(crate) struct Snapshot {
    pub load: LoadStrategy,
    pub persist: PersistStrategy,
    pub raw_values: RawValues,
    /// Whether entry `i` was bound to this datastore during `init`. Cells
    /// owned by another datastore are never reloaded from this one.
    pub bound: Vec<bool>,
}

impl Snapshot {
    /// Rewrite the whole document if a persist strategy is configured.
    pub async fn persist(&self, model: &PreferenceModel) -> Result<()> {
        let PersistStrategy::UseWriter(writer) = &self.persist else {
            return Ok(());
        };
        let content = render(model, &self.raw_values);
        if let Err(e) = writer.write(&content).await {
            error!(model = model.name(), error = %e, "failed to persist datastore");
            return Err(e.into());
        }
        debug!(model = model.name(), len = content.len(), "datastore persisted");
        Ok(())
    }
}

/// Parse `content`, run every line through the model's migration, and keep
/// the values of declared entries.
///
/// Malformed lines and entries the model does not declare are dropped. If a
/// declared entry appears more than once the last line wins.
pub(crate) fn load_raw_values(model: &PreferenceModel, content: &str) -> RawValues {
    let doc = parse_document(content);
    for skipped in &doc.skipped {
        warn!(
            model = model.name(),
            line = skipped.line_no,
            reason = %skipped.reason,
            "skipping malformed datastore line"
        );
    }

    let mut raw_values: RawValues = vec![None; model.len()];
    for (line_no, record) in doc.records {
        let Some(record) = migration::apply(model.migration(), record) else {
            continue;
        };
        let key = record.typed_key();
        match model.position(&key) {
            Some(pos) => raw_values[pos] = Some(record.raw_value()),
            None => debug!(
                model = model.name(),
                line = line_no,
                key = %key,
                "dropping undeclared entry"
            ),
        }
    }
    raw_values
}

/// Serialize raw values as a document, skipping unset entries.
pub(crate) fn render(model: &PreferenceModel, raw_values: &RawValues) -> String {
    render_document(
        model
            .keys()
            .zip(raw_values.iter().map(|raw| raw.as_deref())),
    )
}
