// src/config/models.rs
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("stream url must use http or https, got {0:?}")]
    UnsupportedScheme(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stream: StreamConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    #[serde(default)]
    pub settings: SettingsConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Semantic checks that serde cannot express.
    ///
    /// A push or event sink without a URL or token is downgraded to
    /// [`NotifierKind::Disabled`] rather than failing startup.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.stream.interval_secs == 0 {
            return Err(ConfigError::Zero("stream.interval_secs"));
        }
        if self.stream.timeout_secs == 0 {
            return Err(ConfigError::Zero("stream.timeout_secs"));
        }
        if !matches!(self.stream.url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(
                self.stream.url.scheme().to_string(),
            ));
        }
        if self.notifier.timeout_secs == 0 {
            return Err(ConfigError::Zero("notifier.timeout_secs"));
        }
        if self.notifier.queue_capacity == 0 {
            return Err(ConfigError::Zero("notifier.queue_capacity"));
        }

        if self.notifier.kind != NotifierKind::Disabled
            && (self.notifier.url.is_none() || self.notifier.token.is_none())
        {
            tracing::warn!(
                kind = ?self.notifier.kind,
                "Notifier url or token is missing, alerts will only be logged"
            );
            self.notifier.kind = NotifierKind::Disabled;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    pub url: Url,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_probe_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_camera_name")]
    pub camera_name: String,
}

impl StreamConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Bearer-authenticated push notification (`message`/`title`/`data`).
    Push,
    /// Bearer-authenticated event post (`type`/`timestamp`/`source`).
    Event,
    #[default]
    Disabled,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,
    pub url: Option<Url>,
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub title: String,
    pub badge: u32,
    pub offline_sound: String,
    pub online_sound: String,
    pub event_name: String,
    pub source: String,
    pub queue_capacity: usize,
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Disabled,
            url: None,
            token: None,
            timeout_secs: 10,
            title: "Stream Monitor".to_string(),
            badge: 1,
            offline_sound: "DeviceShutdown.caf".to_string(),
            online_sound: "DeviceStartup.caf".to_string(),
            event_name: "stream_monitor_event".to_string(),
            source: "stream-monitor".to_string(),
            queue_capacity: 16,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// JSON file holding the persisted `stream_enabled` flag.
    pub path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("settings.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub bind: SocketAddr,
    pub path: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind: SocketAddr::from(([127, 0, 0, 1], 9090)),
            path: "/metrics".to_string(),
        }
    }
}

fn default_interval_secs() -> u64 {
    10
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_camera_name() -> String {
    "Puppy Cam".to_string()
}
