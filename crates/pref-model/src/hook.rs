//! The seam between cells and the datastore that owns them.

use async_trait::async_trait;
use pref_types::TypedKey;

/// Boxed error returned by a persist hook.
///
/// The datastore reports its own error type through this box; callers that
/// need the details can downcast it.
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Receives every mutation of a cell.
///
/// Installed once per cell during datastore `init`. `raw` is the value in
/// its on-disk form, or `None` when the cell was reset to its default.
/// The returned future completes once the change is reflected in the
/// datastore's authoritative state.
#[async_trait]
pub trait PersistHook: Send + Sync {
    async fn persist(&self, key: &TypedKey, raw: Option<String>) -> Result<(), HookError>;
}
