//! Settings Storage Abstraction
//!
//! Platform-agnostic trait for durable key-value preferences storage:
//! - iOS: UserDefaults
//! - Android: SharedPreferences / DataStore
//! - Desktop: SQLite-backed store or OS-specific preferences

use async_trait::async_trait;

use crate::error::Result;

/// Key-value settings storage trait
///
/// Writes must be durable enough that a `get_string` following a
/// `set_string` in the same process observes the written value.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::settings::SettingsStore;
///
/// async fn save_blob(store: &dyn SettingsStore, blob: &str) -> Result<()> {
///     store.set_string("SpotifySession", blob).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Store a string value, overwriting any previous value
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;

    /// Retrieve a string value
    ///
    /// Returns `Ok(None)` if the key does not exist.
    async fn get_string(&self, key: &str) -> Result<Option<String>>;

    /// Delete a setting
    ///
    /// Idempotent: deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a setting exists
    async fn has_key(&self, key: &str) -> Result<bool> {
        Ok(self.get_string(key).await?.is_some())
    }

    /// List all setting keys
    async fn list_keys(&self) -> Result<Vec<String>>;

    /// Clear all settings
    async fn clear_all(&self) -> Result<()>;
}
