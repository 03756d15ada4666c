// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Prefix for environment overrides, e.g. `STREAM_MONITOR__NOTIFIER__TOKEN`.
pub const ENV_PREFIX: &str = "STREAM_MONITOR";

/// Load configuration from a file (YAML or JSON) layered with environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();

    let raw = ::config::Config::builder()
        .add_source(::config::File::from(path))
        .add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let mut config: Config = raw
        .try_deserialize()
        .context("Failed to parse config")?;

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // `load_config` reads the process environment, so loads must not overlap
    // with a test that sets `STREAM_MONITOR__*` variables.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn test_load_yaml_with_defaults() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "stream:\n  url: \"http://camera.local:8889/cam/index.m3u8\"").unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.stream.url.host_str(), Some("camera.local"));
        assert_eq!(config.stream.interval_secs, 10);
        assert_eq!(config.stream.timeout_secs, 5);
        assert_eq!(config.notifier.kind, NotifierKind::Disabled);
        assert_eq!(config.notifier.timeout_secs, 10);
    }

    #[test]
    fn test_load_json_notifier() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{
                "stream": {{ "url": "https://camera.local/live", "interval_secs": 30 }},
                "notifier": {{
                    "kind": "push",
                    "url": "http://ha.local:8123/api/services/notify/mobile",
                    "token": "secret"
                }}
            }}"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.stream.interval_secs, 30);
        assert_eq!(config.notifier.kind, NotifierKind::Push);
        assert_eq!(config.notifier.token.as_deref(), Some("secret"));
    }

    #[test]
    fn test_load_rejects_zero_interval() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "stream:\n  url: \"http://camera.local/live\"\n  interval_secs: 0").unwrap();

        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _env = env_lock();
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "stream:\n  url: \"http://camera.local/live\"\n  interval_secs: 10\n\
             notifier:\n  kind: push\n  url: \"http://ha.local:8123/api/services/notify/mobile\"\n  token: from-file"
        )
        .unwrap();

        std::env::set_var("STREAM_MONITOR__NOTIFIER__TOKEN", "tok");
        std::env::set_var("STREAM_MONITOR__STREAM__INTERVAL_SECS", "30");
        let loaded = load_config(file.path());
        std::env::remove_var("STREAM_MONITOR__NOTIFIER__TOKEN");
        std::env::remove_var("STREAM_MONITOR__STREAM__INTERVAL_SECS");

        let config = loaded.unwrap();
        assert_eq!(config.notifier.kind, NotifierKind::Push);
        assert_eq!(config.notifier.token.as_deref(), Some("tok"));
        assert_eq!(config.stream.interval_secs, 30);
    }
}
