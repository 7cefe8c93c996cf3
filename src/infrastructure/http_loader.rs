// reqwest implementation of the JSON loading capability
use crate::application::json_loader::{JsonLoader, LoadError, Notification, Notifier};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpJsonLoader {
    client: reqwest::Client,
}

impl HttpJsonLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoadError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    async fn fetch(&self, url: &str) -> Result<Option<Value>, LoadError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| LoadError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| LoadError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str::<Value>(&body)
            .map(|value| if value.is_null() { None } else { Some(value) })
            .map_err(|e| LoadError::Decode {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl JsonLoader for HttpJsonLoader {
    async fn load_json(&self, url: &str, notifier: &dyn Notifier) -> Result<Option<Value>, LoadError> {
        match self.fetch(url).await {
            Ok(value) => Ok(value),
            // The server answered but with something unusable: tell the user, treat as no data
            Err(e @ (LoadError::Status { .. } | LoadError::Decode { .. })) => {
                tracing::warn!("{}", e);
                notifier.notify(Notification::error("Cannot load data", e.to_string()));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
