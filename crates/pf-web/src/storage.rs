//! `localStorage`-backed preference store

use pf_core::error::{PortfolioError, Result};
use pf_core::storage::PreferenceStore;

/// Preferences kept in the window's `localStorage`
///
/// Storage can be missing (privacy modes, sandboxed frames); reads then
/// return nothing and writes fail with [`PortfolioError::Storage`].
pub struct LocalStorageStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStorageStore {
    pub fn new() -> Self {
        let storage = web_sys::window().and_then(|window| window.local_storage().ok().flatten());
        if storage.is_none() {
            tracing::warn!("localStorage unavailable, preferences will not persist");
        }
        Self { storage }
    }
}

impl Default for LocalStorageStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PreferenceStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| PortfolioError::Storage("localStorage unavailable".to_string()))?;
        storage
            .set_item(key, value)
            .map_err(|err| PortfolioError::Storage(format!("write to '{key}' failed: {err:?}")))
    }
}
