//! # Session Store
//!
//! Persists the authenticated session between launches through the
//! platform's [`SettingsStore`] bridge, under a single well-known key.
//! The blob is opaque to the host: JSON in, JSON out, never inspected
//! outside this module.

use crate::error::Result;
use crate::types::Session;
use bridge_traits::SettingsStore;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Settings key the session blob lives under.
pub const SESSION_STORAGE_KEY: &str = "SpotifySession";

/// JSON-backed session persistence over a platform settings store.
#[derive(Clone)]
pub struct SessionStore {
    settings: Arc<dyn SettingsStore>,
}

impl SessionStore {
    /// Creates a new session store backed by the given settings bridge.
    pub fn new(settings: Arc<dyn SettingsStore>) -> Self {
        Self { settings }
    }

    /// Persists the session, replacing any previous blob.
    #[instrument(skip(self, session))]
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string(session)?;
        self.settings.set_string(SESSION_STORAGE_KEY, &json).await?;
        debug!("Session persisted");
        Ok(())
    }

    /// Loads the stored session, if any.
    ///
    /// A blob that fails to parse is deleted and reported as absent; the
    /// caller sees the same outcome as a fresh install.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<Option<Session>> {
        let Some(json) = self.settings.get_string(SESSION_STORAGE_KEY).await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&json) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!("Stored session is corrupted, deleting: {}", e);
                self.settings.delete(SESSION_STORAGE_KEY).await?;
                Ok(None)
            }
        }
    }

    /// Removes the stored session. Idempotent.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.settings.delete(SESSION_STORAGE_KEY).await?;
        debug!("Stored session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MockSettingsStore {
        storage: Arc<Mutex<HashMap<String, String>>>,
    }

    impl MockSettingsStore {
        fn new() -> Self {
            Self {
                storage: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn insert_raw(&self, key: &str, value: &str) {
            self.storage
                .lock()
                .await
                .insert(key.to_string(), value.to_string());
        }
    }

    #[async_trait]
    impl SettingsStore for MockSettingsStore {
        async fn set_string(&self, key: &str, value: &str) -> BridgeResult<()> {
            let mut storage = self.storage.lock().await;
            storage.insert(key.to_string(), value.to_string());
            Ok(())
        }

        async fn get_string(&self, key: &str) -> BridgeResult<Option<String>> {
            let storage = self.storage.lock().await;
            Ok(storage.get(key).cloned())
        }

        async fn delete(&self, key: &str) -> BridgeResult<()> {
            let mut storage = self.storage.lock().await;
            storage.remove(key);
            Ok(())
        }

        async fn list_keys(&self) -> BridgeResult<Vec<String>> {
            let storage = self.storage.lock().await;
            Ok(storage.keys().cloned().collect())
        }

        async fn clear_all(&self) -> BridgeResult<()> {
            let mut storage = self.storage.lock().await;
            storage.clear();
            Ok(())
        }
    }

    fn test_session() -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let store = SessionStore::new(Arc::new(MockSettingsStore::new()));

        let session = test_session();
        store.save(&session).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, session);
    }

    #[tokio::test]
    async fn test_load_empty_returns_none() {
        let store = SessionStore::new(Arc::new(MockSettingsStore::new()));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_session() {
        let store = SessionStore::new(Arc::new(MockSettingsStore::new()));

        let mut session = test_session();
        store.save(&session).await.unwrap();

        session.access_token = "newer-access".to_string();
        store.save(&session).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.access_token, "newer-access");
    }

    #[tokio::test]
    async fn test_corrupted_blob_is_deleted() {
        let settings = Arc::new(MockSettingsStore::new());
        settings
            .insert_raw(SESSION_STORAGE_KEY, "{not valid json")
            .await;

        let store = SessionStore::new(settings.clone());
        assert!(store.load().await.unwrap().is_none());

        // The corrupted blob was removed, not just skipped
        let raw = settings.get_string(SESSION_STORAGE_KEY).await.unwrap();
        assert!(raw.is_none());
    }

    #[tokio::test]
    async fn test_clear_is_idempotent() {
        let store = SessionStore::new(Arc::new(MockSettingsStore::new()));

        store.save(&test_session()).await.unwrap();
        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_none());
    }
}
