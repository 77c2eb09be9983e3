use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::api::error::FetchFailed;

/// Performs a single `GET` and decodes the body as JSON.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, FetchFailed>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn get_json(&self, url: &str) -> Result<Value, FetchFailed> {
        (**self).get_json(url).await
    }
}

/// HTTP transport. No timeout is set; an in-flight request always runs to
/// completion or error.
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, FetchFailed> {
        debug!("Sending request to {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailed::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Read bytes first so an undecodable body is reported as such rather
        // than as a network error.
        let body = response.bytes().await?;
        let json = serde_json::from_slice(&body)?;
        Ok(json)
    }
}
