// src/notify/sink.rs
use crate::config::NotifierConfig;
use crate::monitor::AlertKind;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use url::Url;

/// Event type posted by [`EventNotifier`].
pub const STREAM_STATUS_EVENT: &str = "stream_status";

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notification sink returned status {0}")]
    Status(u16),

    #[error("notification timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid notification endpoint: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("notification sink panicked")]
    Panicked,
}

/// Destination for stream alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, kind: AlertKind) -> Result<(), NotifyError>;

    fn name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct PushPayload<'a> {
    message: String,
    title: &'a str,
    data: PushData<'a>,
}

#[derive(Debug, Serialize)]
struct PushData<'a> {
    sound: &'a str,
    badge: u32,
}

/// Bearer-authenticated push notification sink.
pub struct PushNotifier {
    client: Client,
    url: Url,
    token: String,
    title: String,
    badge: u32,
    offline_sound: String,
    online_sound: String,
    camera_name: String,
}

impl PushNotifier {
    pub fn new(
        url: Url,
        token: String,
        config: &NotifierConfig,
        camera_name: &str,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            url,
            token,
            title: config.title.clone(),
            badge: config.badge,
            offline_sound: config.offline_sound.clone(),
            online_sound: config.online_sound.clone(),
            camera_name: camera_name.to_string(),
        })
    }

    fn sound(&self, kind: AlertKind) -> &str {
        match kind {
            AlertKind::WentOffline => &self.offline_sound,
            AlertKind::BackOnline => &self.online_sound,
        }
    }
}

#[async_trait]
impl Notifier for PushNotifier {
    async fn notify(&self, kind: AlertKind) -> Result<(), NotifyError> {
        let payload = PushPayload {
            message: kind.message(&self.camera_name),
            title: &self.title,
            data: PushData {
                sound: self.sound(kind),
                badge: self.badge,
            },
        };

        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        check_status(response.status())?;

        tracing::info!(
            message = %payload.message,
            sound = payload.data.sound,
            "Push notification sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "push"
    }
}

/// Bearer-authenticated event sink posting to `<base>/api/events/<event_name>`.
pub struct EventNotifier {
    client: Client,
    endpoint: Url,
    token: String,
    source: String,
    camera_name: String,
}

impl EventNotifier {
    pub fn new(
        base_url: &Url,
        token: String,
        config: &NotifierConfig,
        camera_name: &str,
    ) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(&format!(
            "{}/api/events/{}",
            base_url.as_str().trim_end_matches('/'),
            config.event_name
        ))?;
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            endpoint,
            token,
            source: config.source.clone(),
            camera_name: camera_name.to_string(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Notifier for EventNotifier {
    async fn notify(&self, kind: AlertKind) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "type": STREAM_STATUS_EVENT,
            "timestamp": Utc::now().to_rfc3339(),
            "source": self.source,
            "camera_name": self.camera_name,
            "status": kind.status(),
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;

        check_status(response.status())?;

        tracing::info!(
            endpoint = %self.endpoint,
            status = kind.status(),
            "Stream status event fired"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "event"
    }
}

/// Sink used when no destination is configured; alerts are only logged.
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn notify(&self, kind: AlertKind) -> Result<(), NotifyError> {
        tracing::info!(status = kind.status(), "Notifier disabled, alert not sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

fn check_status(status: reqwest::StatusCode) -> Result<(), NotifyError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(NotifyError::Status(status.as_u16()))
    }
}
