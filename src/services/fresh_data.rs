use std::sync::Arc;

use tracing::debug;

use crate::api::client::Transport;
use crate::api::error::FetchFailed;
use crate::models::cache::{CacheState, CacheStore, Payload};
use crate::models::payload::normalize;

/// Serves one endpoint from its [`CacheStore`] while fresh, otherwise fetches.
///
/// Overlapping calls on a stale gate are not merged: each issues its own
/// request and the store keeps whichever response completes last.
pub struct FreshDataGate<T> {
    endpoint: String,
    store: Arc<CacheStore>,
    transport: T,
}

impl<T: Transport> FreshDataGate<T> {
    pub fn new(endpoint: impl Into<String>, store: Arc<CacheStore>, transport: T) -> Self {
        Self {
            endpoint: endpoint.into(),
            store,
            transport,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn state(&self) -> CacheState {
        self.store.state()
    }

    /// Last stored payload regardless of age.
    pub fn cached(&self) -> Option<Payload> {
        self.store.get().map(|(cached, _)| cached.data)
    }

    pub async fn fetch_or_serve(&self) -> Result<Payload, FetchFailed> {
        if let Some((cached, age)) = self.store.get() {
            if age < cached.ttl {
                debug!("Cache hit for {} (age {:?})", self.endpoint, age);
                return Ok(cached.data);
            }
        }

        debug!("Cache miss for {}", self.endpoint);
        let body = self.transport.get_json(&self.endpoint).await?;
        let payload: Payload = Arc::new(normalize(body));
        self.store.set(payload.clone());
        debug!("Stored {} records for {}", payload.len(), self.endpoint);

        Ok(payload)
    }
}
