// src/settings/mod.rs
mod store;

pub use store::{FileSettingsStore, SettingsError, SettingsStore};

/// Read the persisted flag once at startup. Any failure leaves monitoring disabled.
pub async fn load_initial_flag(store: &dyn SettingsStore) -> bool {
    match store.load_stream_enabled().await {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::error!(error = %e, "Failed to read stream setting, starting disabled");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreadable_settings_default_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "[1, 2, 3]").await.unwrap();

        assert!(!load_initial_flag(&FileSettingsStore::new(&path)).await);
    }

    #[tokio::test]
    async fn test_persisted_flag_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, r#"{"stream_enabled": true}"#).await.unwrap();

        assert!(load_initial_flag(&FileSettingsStore::new(&path)).await);
    }
}
