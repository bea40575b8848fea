//! Read side of the session: serve fresh cache entries, refetch the rest.

use crate::api::{
    Agent, ConversationDetail, ConversationSummary, ModelConfig, ProviderConfig,
    RemoteDataClient, RemoteFailure,
};
use crate::core::cache::{CacheStore, QueryData, QueryKey};
use crate::core::error::Failure;
use futures_util::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct QueryClient {
    remote: Arc<dyn RemoteDataClient>,
    cache: Arc<CacheStore>,
}

impl QueryClient {
    pub fn new(remote: Arc<dyn RemoteDataClient>, cache: Arc<CacheStore>) -> Self {
        Self { remote, cache }
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Return the cached value for `key` when it is fresh, otherwise fetch.
    pub async fn load(&self, key: &QueryKey) -> Result<QueryData, Failure> {
        let read = self.cache.read(key);
        if !read.is_stale {
            if let Some(value) = read.value {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
        }
        self.fetch(key).await
    }

    /// Fetch `key` from the backend regardless of what is cached.
    ///
    /// The fetched value is returned even when an invalidation landed while
    /// the request was running; the entry then stays stale for the next read.
    pub async fn fetch(&self, key: &QueryKey) -> Result<QueryData, Failure> {
        let ticket = self.cache.begin_fetch(key);
        match self.fetch_remote(key).await {
            Ok(value) => {
                self.cache.complete_fetch(ticket, value.clone());
                Ok(value)
            }
            Err(err) => {
                self.cache.abort_fetch(ticket);
                warn!(key = %key, error = %err, "query failed");
                Err(err.into())
            }
        }
    }

    async fn fetch_remote(&self, key: &QueryKey) -> Result<QueryData, RemoteFailure> {
        let remote = self.remote.as_ref();
        let value = match key {
            QueryKey::Conversation(id) => QueryData::Conversation(remote.get_conversation(id).await?),
            QueryKey::RecentConversations { limit } => {
                QueryData::RecentConversations(remote.list_recent_conversations(*limit).await?)
            }
            QueryKey::SystemAgents => QueryData::Agents(remote.list_available_agents().await?),
            QueryKey::ProviderConfigs => {
                QueryData::Providers(remote.list_provider_configs().await?)
            }
            QueryKey::Models(provider_id) => {
                // The backend only lists every model; keep this provider's children.
                let models = remote
                    .list_model_configs()
                    .await?
                    .into_iter()
                    .filter(|model| &model.provider_id == provider_id)
                    .collect();
                QueryData::Models(models)
            }
        };
        Ok(value)
    }

    pub async fn conversation(&self, id: &str) -> Result<ConversationDetail, Failure> {
        let key = QueryKey::Conversation(id.to_string());
        let data = self.load(&key).await?;
        data.into_conversation()
            .ok_or_else(|| unexpected_shape(&key))
    }

    pub async fn recent_conversations(
        &self,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, Failure> {
        let key = QueryKey::RecentConversations { limit };
        let data = self.load(&key).await?;
        data.into_recent_conversations()
            .ok_or_else(|| unexpected_shape(&key))
    }

    pub async fn agents(&self) -> Result<Vec<Agent>, Failure> {
        let key = QueryKey::SystemAgents;
        let data = self.load(&key).await?;
        data.into_agents().ok_or_else(|| unexpected_shape(&key))
    }

    pub async fn providers(&self) -> Result<Vec<ProviderConfig>, Failure> {
        let key = QueryKey::ProviderConfigs;
        let data = self.load(&key).await?;
        data.into_providers().ok_or_else(|| unexpected_shape(&key))
    }

    pub async fn models_for(&self, provider_id: &str) -> Result<Vec<ModelConfig>, Failure> {
        let key = QueryKey::Models(provider_id.to_string());
        let data = self.load(&key).await?;
        data.into_models().ok_or_else(|| unexpected_shape(&key))
    }

    /// Refetch every displayed key that went stale, concurrently.
    /// Returns the keys whose refetch failed.
    pub async fn refresh_displayed(&self) -> Vec<(QueryKey, Failure)> {
        let pending = self.cache.take_pending_refetches();
        if pending.is_empty() {
            return Vec::new();
        }
        debug!(count = pending.len(), "refreshing displayed queries");

        let results = join_all(pending.iter().map(|key| self.fetch(key))).await;
        pending
            .into_iter()
            .zip(results)
            .filter_map(|(key, result)| result.err().map(|err| (key, err)))
            .collect()
    }
}

fn unexpected_shape(key: &QueryKey) -> Failure {
    RemoteFailure::decode(format!("cached value for {key} has an unexpected shape")).into()
}
