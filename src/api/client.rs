//! Contract between the session/cache layer and whatever talks to the backend.

use super::{
    Agent, ConversationDetail, ConversationSummary, ModelConfig, ModelUpdate, NewModel,
    NewProvider, ProviderConfig, ProviderUpdate, SendMessageRequest, SendMessageResponse,
};
use async_trait::async_trait;
use std::error::Error;
use std::fmt;

/// Coarse classification of a backend failure.
///
/// Only [`RemoteFailureKind::NotFound`] changes how the core reacts; the
/// rest are carried through to the caller unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    NotFound,
    Validation,
    Unauthorized,
    Server,
    Transport,
    Decode,
}

impl RemoteFailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RemoteFailureKind::NotFound => "not found",
            RemoteFailureKind::Validation => "rejected",
            RemoteFailureKind::Unauthorized => "unauthorized",
            RemoteFailureKind::Server => "server error",
            RemoteFailureKind::Transport => "transport error",
            RemoteFailureKind::Decode => "unexpected response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFailure {
    kind: RemoteFailureKind,
    message: String,
    field: Option<String>,
}

impl RemoteFailure {
    pub fn new(kind: RemoteFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            field: None,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteFailureKind::NotFound, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(RemoteFailureKind::Validation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(RemoteFailureKind::Server, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(RemoteFailureKind::Transport, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(RemoteFailureKind::Decode, message)
    }

    /// Attach the request field the backend blamed.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn kind(&self) -> RemoteFailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteFailureKind::NotFound
    }
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.field {
            Some(field) => write!(f, "{} ({field}): {}", self.kind.as_str(), self.message),
            None => write!(f, "{}: {}", self.kind.as_str(), self.message),
        }
    }
}

impl Error for RemoteFailure {}

/// Typed request/response access to the Conversations, Chat, Agents and
/// Configuration resources.
///
/// Implementations own transport concerns (encoding, auth headers,
/// timeouts). They must not cache or retry.
#[async_trait]
pub trait RemoteDataClient: Send + Sync {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, RemoteFailure>;

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetail, RemoteFailure>;

    async fn list_recent_conversations(
        &self,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, RemoteFailure>;

    async fn list_available_agents(&self) -> Result<Vec<Agent>, RemoteFailure>;

    async fn list_provider_configs(&self) -> Result<Vec<ProviderConfig>, RemoteFailure>;

    async fn create_provider_config(
        &self,
        provider: &NewProvider,
    ) -> Result<ProviderConfig, RemoteFailure>;

    async fn update_provider_config(
        &self,
        provider_id: &str,
        update: &ProviderUpdate,
    ) -> Result<ProviderConfig, RemoteFailure>;

    async fn delete_provider_config(&self, provider_id: &str) -> Result<(), RemoteFailure>;

    /// Every model visible to the current user, across all providers.
    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>, RemoteFailure>;

    async fn create_model_config(&self, model: &NewModel) -> Result<ModelConfig, RemoteFailure>;

    async fn update_model_config(
        &self,
        model_id: &str,
        update: &ModelUpdate,
    ) -> Result<ModelConfig, RemoteFailure>;

    async fn delete_model_config(&self, model_id: &str) -> Result<(), RemoteFailure>;
}
