// JSON loading capability and the notification side channel it reports through
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("cannot decode response of {url}: {message}")]
    Decode { url: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub text: String,
}

impl Notification {
    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
        }
    }
}

/// User-visible notification channel
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

#[async_trait]
pub trait JsonLoader: Send + Sync {
    /// Fetch and parse `url`.
    ///
    /// `Ok(None)` means "no data yet". Ordinary HTTP and parse failures are reported
    /// through `notifier` and also come back as `Ok(None)`; only failures the loader
    /// could not handle itself are returned as `Err`.
    async fn load_json(&self, url: &str, notifier: &dyn Notifier) -> Result<Option<Value>, LoadError>;
}

/// Typed variant of `JsonLoader::load_json`
pub async fn load_typed<T: DeserializeOwned>(
    loader: &dyn JsonLoader,
    url: &str,
    notifier: &dyn Notifier,
) -> Result<Option<T>, LoadError> {
    match loader.load_json(url, notifier).await? {
        Some(Value::Null) | None => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| LoadError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            }),
    }
}
