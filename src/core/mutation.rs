//! State-changing operations and the coordinator that keeps the cache
//! consistent with them.
//!
//! Every operation names the cache keys its success makes obsolete. The
//! coordinator invalidates those keys in one critical section after the
//! backend confirms the change and before the caller sees the result.

use crate::api::{
    ModelConfig, ModelUpdate, NewModel, NewProvider, ProviderConfig, ProviderUpdate,
    RemoteDataClient, RemoteFailure, SendMessageRequest, SendMessageResponse,
};
use crate::core::cache::{CacheStore, KeyPattern, QueryKey};
use crate::core::error::Failure;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[async_trait]
pub trait Mutation: Send + Sync {
    type Output: Send;

    /// Short label used in logs and concurrency errors.
    fn name(&self) -> &'static str;

    async fn dispatch(
        &self,
        remote: &dyn RemoteDataClient,
    ) -> Result<Self::Output, RemoteFailure>;

    /// Keys made obsolete by this operation. `output` is `None` when the
    /// backend reported the target as already gone.
    fn invalidates(&self, output: Option<&Self::Output>) -> Vec<KeyPattern>;
}

#[derive(Debug, Clone)]
pub struct SendMessage {
    pub request: SendMessageRequest,
}

#[async_trait]
impl Mutation for SendMessage {
    type Output = SendMessageResponse;

    fn name(&self) -> &'static str {
        "send message"
    }

    async fn dispatch(
        &self,
        remote: &dyn RemoteDataClient,
    ) -> Result<SendMessageResponse, RemoteFailure> {
        remote.send_message(&self.request).await
    }

    fn invalidates(&self, output: Option<&SendMessageResponse>) -> Vec<KeyPattern> {
        let conversation_id = output
            .map(|response| response.conversation_id.as_str())
            .or(self.request.conversation_id.as_deref());

        let mut keys = Vec::with_capacity(2);
        if let Some(id) = conversation_id {
            keys.push(QueryKey::Conversation(id.to_string()).into());
        }
        keys.push(KeyPattern::AnyRecentConversations);
        keys
    }
}

#[derive(Debug, Clone)]
pub struct CreateProvider {
    pub provider: NewProvider,
}

#[async_trait]
impl Mutation for CreateProvider {
    type Output = ProviderConfig;

    fn name(&self) -> &'static str {
        "create provider"
    }

    async fn dispatch(
        &self,
        remote: &dyn RemoteDataClient,
    ) -> Result<ProviderConfig, RemoteFailure> {
        remote.create_provider_config(&self.provider).await
    }

    fn invalidates(&self, _output: Option<&ProviderConfig>) -> Vec<KeyPattern> {
        vec![QueryKey::ProviderConfigs.into()]
    }
}

#[derive(Debug, Clone)]
pub struct UpdateProvider {
    pub id: String,
    pub update: ProviderUpdate,
}

#[async_trait]
impl Mutation for UpdateProvider {
    type Output = ProviderConfig;

    fn name(&self) -> &'static str {
        "update provider"
    }

    async fn dispatch(
        &self,
        remote: &dyn RemoteDataClient,
    ) -> Result<ProviderConfig, RemoteFailure> {
        remote.update_provider_config(&self.id, &self.update).await
    }

    fn invalidates(&self, _output: Option<&ProviderConfig>) -> Vec<KeyPattern> {
        vec![QueryKey::ProviderConfigs.into()]
    }
}

/// Removing a provider removes its models server-side as well.
#[derive(Debug, Clone)]
pub struct DeleteProvider {
    pub id: String,
}

#[async_trait]
impl Mutation for DeleteProvider {
    type Output = ();

    fn name(&self) -> &'static str {
        "delete provider"
    }

    async fn dispatch(&self, remote: &dyn RemoteDataClient) -> Result<(), RemoteFailure> {
        remote.delete_provider_config(&self.id).await
    }

    fn invalidates(&self, _output: Option<&()>) -> Vec<KeyPattern> {
        vec![
            QueryKey::ProviderConfigs.into(),
            QueryKey::Models(self.id.clone()).into(),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CreateModel {
    pub model: NewModel,
}

#[async_trait]
impl Mutation for CreateModel {
    type Output = ModelConfig;

    fn name(&self) -> &'static str {
        "create model"
    }

    async fn dispatch(&self, remote: &dyn RemoteDataClient) -> Result<ModelConfig, RemoteFailure> {
        remote.create_model_config(&self.model).await
    }

    fn invalidates(&self, output: Option<&ModelConfig>) -> Vec<KeyPattern> {
        let mut patterns = vec![QueryKey::Models(self.model.provider_id.clone()).into()];
        // A missing parent means the provider listing is out of date too.
        if output.is_none() {
            patterns.push(QueryKey::ProviderConfigs.into());
        }
        patterns
    }
}

#[derive(Debug, Clone)]
pub struct UpdateModel {
    pub id: String,
    pub provider_id: String,
    pub update: ModelUpdate,
}

#[async_trait]
impl Mutation for UpdateModel {
    type Output = ModelConfig;

    fn name(&self) -> &'static str {
        "update model"
    }

    async fn dispatch(&self, remote: &dyn RemoteDataClient) -> Result<ModelConfig, RemoteFailure> {
        remote.update_model_config(&self.id, &self.update).await
    }

    fn invalidates(&self, _output: Option<&ModelConfig>) -> Vec<KeyPattern> {
        vec![QueryKey::Models(self.provider_id.clone()).into()]
    }
}

#[derive(Debug, Clone)]
pub struct DeleteModel {
    pub id: String,
    pub provider_id: String,
}

#[async_trait]
impl Mutation for DeleteModel {
    type Output = ();

    fn name(&self) -> &'static str {
        "delete model"
    }

    async fn dispatch(&self, remote: &dyn RemoteDataClient) -> Result<(), RemoteFailure> {
        remote.delete_model_config(&self.id).await
    }

    fn invalidates(&self, _output: Option<&()>) -> Vec<KeyPattern> {
        vec![QueryKey::Models(self.provider_id.clone()).into()]
    }
}

/// Runs mutations against the backend and invalidates what they touched.
#[derive(Clone)]
pub struct MutationCoordinator {
    remote: Arc<dyn RemoteDataClient>,
    cache: Arc<CacheStore>,
}

impl MutationCoordinator {
    pub fn new(remote: Arc<dyn RemoteDataClient>, cache: Arc<CacheStore>) -> Self {
        Self { remote, cache }
    }

    /// Dispatch `operation`. Nothing is applied to the cache optimistically;
    /// a not-found failure still invalidates because the target is gone.
    pub async fn execute<M: Mutation>(&self, operation: &M) -> Result<M::Output, Failure> {
        match operation.dispatch(self.remote.as_ref()).await {
            Ok(output) => {
                let patterns = operation.invalidates(Some(&output));
                let invalidated = self.cache.invalidate_matching(&patterns);
                info!(
                    operation = operation.name(),
                    invalidated = invalidated.len(),
                    "mutation applied"
                );
                Ok(output)
            }
            Err(err) if err.is_not_found() => {
                let patterns = operation.invalidates(None);
                self.cache.invalidate_matching(&patterns);
                warn!(operation = operation.name(), error = %err, "mutation target no longer exists");
                Err(err.into())
            }
            Err(err) => {
                warn!(operation = operation.name(), error = %err, "mutation failed");
                Err(err.into())
            }
        }
    }
}
