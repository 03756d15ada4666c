// src/settings/store.rs
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const STREAM_ENABLED_KEY: &str = "stream_enabled";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("settings file {0} must contain a JSON object")]
    NotAnObject(PathBuf),
}

/// Where the "stream enabled" flag is persisted.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_stream_enabled(&self) -> Result<bool, SettingsError>;

    async fn save_stream_enabled(&self, enabled: bool) -> Result<(), SettingsError>;
}

/// JSON settings file. Keys other than `stream_enabled` are preserved on save.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_object(&self) -> Result<Map<String, Value>, SettingsError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        match serde_json::from_str(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(SettingsError::NotAnObject(self.path.clone())),
            Err(source) => Err(SettingsError::Parse {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load_stream_enabled(&self) -> Result<bool, SettingsError> {
        let settings = self.read_object().await?;
        Ok(settings
            .get(STREAM_ENABLED_KEY)
            .and_then(Value::as_bool)
            .unwrap_or(false))
    }

    async fn save_stream_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        let mut settings = self.read_object().await?;
        settings.insert(STREAM_ENABLED_KEY.to_string(), Value::Bool(enabled));

        let body = serde_json::to_vec_pretty(&Value::Object(settings)).map_err(|source| {
            SettingsError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        // Write next to the target and rename so readers never see a partial file.
        let tmp = self.path.with_extension("json.tmp");
        let io_err = |source| SettingsError::Io {
            path: self.path.clone(),
            source,
        };
        tokio::fs::write(&tmp, body).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_err)?;

        tracing::debug!(path = %self.path.display(), enabled, "Persisted stream setting");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        assert!(!store.load_stream_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.json"));

        store.save_stream_enabled(true).await.unwrap();
        assert!(store.load_stream_enabled().await.unwrap());

        store.save_stream_enabled(false).await.unwrap();
        assert!(!store.load_stream_enabled().await.unwrap());
    }

    #[tokio::test]
    async fn test_save_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, r#"{"waitlist_enabled": true, "stream_enabled": false}"#)
            .await
            .unwrap();

        let store = FileSettingsStore::new(&path);
        store.save_stream_enabled(true).await.unwrap();

        let saved: Value = serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(saved["waitlist_enabled"], Value::Bool(true));
        assert_eq!(saved["stream_enabled"], Value::Bool(true));
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "not json").await.unwrap();

        let store = FileSettingsStore::new(&path);
        assert!(matches!(
            store.load_stream_enabled().await,
            Err(SettingsError::Parse { .. })
        ));
    }
}
