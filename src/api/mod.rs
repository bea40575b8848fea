//! Payloads exchanged with the chat backend.
//!
//! Field names follow the backend's JSON (`llm_id`, `api_key`, `provider`);
//! the Rust side uses the domain names (`provider_id`, `credential`, `name`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod client;
pub mod http;

pub use client::{RemoteDataClient, RemoteFailure, RemoteFailureKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Tool => "tool",
        }
    }
}

/// A side-effect record emitted while an agent was producing a reply.
///
/// The contents are never interpreted here; records are kept in the order
/// the backend reported them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventRecord(pub Value);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(rename = "message_id", default)]
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, with = "crate::utils::time::optional_timestamp")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(rename = "model_used", default)]
    pub model: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<EventRecord>>,
}

impl ChatMessage {
    pub fn event_count(&self) -> usize {
        self.events.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(rename = "conversation_id")]
    pub id: String,
    pub title: String,
    #[serde(with = "crate::utils::time::timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(rename = "conversation_id")]
    pub id: String,
    pub title: String,
    #[serde(with = "crate::utils::time::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub messages_count: usize,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "agent_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub team: Option<Vec<String>>,
    #[serde(default)]
    pub is_system_agent: bool,
    #[serde(default = "default_agent_status")]
    pub status: String,
    #[serde(default)]
    pub model_id: Option<String>,
}

fn default_agent_status() -> String {
    "active".to_string()
}

impl Agent {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// A credentialed upstream vendor. The credential itself is write-only and
/// never comes back from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(rename = "llm_id")]
    pub id: String,
    #[serde(rename = "provider")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "model_id")]
    pub id: String,
    #[serde(rename = "llm_id")]
    pub provider_id: String,
    pub name: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub agent_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SendMessageResponse {
    pub conversation_id: String,
    #[serde(default)]
    pub user_message_id: Option<String>,
    #[serde(default)]
    pub assistant_message_id: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub events: Option<Vec<EventRecord>>,
}

impl SendMessageResponse {
    pub fn event_count(&self) -> usize {
        self.events.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct NewProvider {
    #[serde(rename = "provider")]
    pub name: String,
    #[serde(rename = "api_key")]
    pub credential: String,
}

impl fmt::Debug for NewProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewProvider")
            .field("name", &self.name)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Provider update body. A `None` credential is left out of the request so
/// the stored secret is kept.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct ProviderUpdate {
    #[serde(rename = "provider")]
    pub name: String,
    #[serde(rename = "api_key", skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl fmt::Debug for ProviderUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderUpdate")
            .field("name", &self.name)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewModel {
    #[serde(rename = "llm_id")]
    pub provider_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModelUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ModelUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.base_url.is_none()
    }
}

/// `{ "data": [...], "count": n }` wrapper used by every list route.
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub count: Option<usize>,
}
