use crate::api::{
    Agent, ChatMessage, ConversationDetail, ConversationSummary, EventRecord, ModelConfig,
    ModelUpdate, NewModel, NewProvider, ProviderConfig, ProviderUpdate, RemoteDataClient,
    RemoteFailure, Role, SendMessageRequest, SendMessageResponse,
};
use crate::core::app::{App, AppSettings};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Notify;

#[derive(Default)]
struct FakeState {
    conversations: HashMap<String, ConversationDetail>,
    // Most recently touched first.
    recent_order: Vec<String>,
    agents: Vec<Agent>,
    providers: Vec<ProviderConfig>,
    credentials: HashMap<String, String>,
    models: Vec<ModelConfig>,
    provider_updates: Vec<ProviderUpdate>,
    sent_requests: Vec<SendMessageRequest>,
    calls: Vec<&'static str>,
    failures: HashMap<&'static str, RemoteFailure>,
    next_id: u64,
}

impl FakeState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    fn touch_conversation(&mut self, id: &str) {
        self.recent_order.retain(|existing| existing != id);
        self.recent_order.insert(0, id.to_string());
    }

    fn record(&mut self, call: &'static str) -> Result<(), RemoteFailure> {
        self.calls.push(call);
        match self.failures.remove(call) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// In-memory backend with the same parent/child rules as the real one.
#[derive(Default)]
pub struct FakeRemote {
    state: Mutex<FakeState>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    send_started: Notify,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_agent(&self, id: &str, name: &str) -> Agent {
        let agent = Agent {
            id: id.to_string(),
            name: name.to_string(),
            instruction: format!("You are {name}."),
            team: None,
            is_system_agent: true,
            status: "active".to_string(),
            model_id: None,
        };
        self.lock().agents.push(agent.clone());
        agent
    }

    pub fn retire_agent(&self, id: &str) {
        for agent in self.lock().agents.iter_mut().filter(|agent| agent.id == id) {
            agent.status = "disabled".to_string();
        }
    }

    pub fn add_provider(&self, name: &str) -> ProviderConfig {
        let mut state = self.lock();
        let provider = ProviderConfig {
            id: state.next_id("provider"),
            name: name.to_string(),
        };
        state.providers.push(provider.clone());
        provider
    }

    pub fn add_model(&self, provider_id: &str, name: &str) -> ModelConfig {
        let mut state = self.lock();
        let model = ModelConfig {
            id: state.next_id("model"),
            provider_id: provider_id.to_string(),
            name: name.to_string(),
            base_url: None,
        };
        state.models.push(model.clone());
        model
    }

    pub fn add_conversation(&self, id: &str, title: &str) {
        let mut state = self.lock();
        state.conversations.insert(
            id.to_string(),
            ConversationDetail {
                id: id.to_string(),
                title: title.to_string(),
                created_at: test_timestamp(),
                messages_count: 0,
                messages: Vec::new(),
            },
        );
        state.touch_conversation(id);
    }

    /// Make the next call to `method` fail with `failure`.
    pub fn fail_next(&self, method: &'static str, failure: RemoteFailure) {
        self.lock().failures.insert(method, failure);
    }

    /// Park every following send until the returned gate is notified.
    pub fn hold_sends(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self
            .send_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
        gate
    }

    /// Resolves once a held send has reached the backend.
    pub async fn send_started(&self) {
        self.send_started.notified().await;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.lock().calls.iter().filter(|call| **call == method).count()
    }

    pub fn provider_updates(&self) -> Vec<ProviderUpdate> {
        self.lock().provider_updates.clone()
    }

    pub fn sent_requests(&self) -> Vec<SendMessageRequest> {
        self.lock().sent_requests.clone()
    }

    pub fn credential_for(&self, provider_id: &str) -> Option<String> {
        self.lock().credentials.get(provider_id).cloned()
    }

    pub fn model_count(&self) -> usize {
        self.lock().models.len()
    }
}

#[async_trait]
impl RemoteDataClient for FakeRemote {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, RemoteFailure> {
        {
            let mut state = self.lock();
            state.record("send_message")?;
            state.sent_requests.push(request.clone());
            if request.agent_id.trim().is_empty() {
                return Err(RemoteFailure::validation("field required").with_field("agent_id"));
            }
            if !state.agents.iter().any(|agent| agent.id == request.agent_id) {
                return Err(RemoteFailure::not_found(format!(
                    "agent {}",
                    request.agent_id
                )));
            }
        }

        let gate = self
            .send_gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            self.send_started.notify_one();
            gate.notified().await;
        }

        let mut state = self.lock();
        let conversation_id = match &request.conversation_id {
            Some(id) if state.conversations.contains_key(id) => id.clone(),
            Some(id) => return Err(RemoteFailure::not_found(format!("conversation {id}"))),
            None => {
                let id = state.next_id("conversation");
                let title: String = request.message.chars().take(30).collect();
                state.conversations.insert(
                    id.clone(),
                    ConversationDetail {
                        id: id.clone(),
                        title,
                        created_at: test_timestamp(),
                        messages_count: 0,
                        messages: Vec::new(),
                    },
                );
                id
            }
        };

        let agent_name = state
            .agents
            .iter()
            .find(|agent| agent.id == request.agent_id)
            .map(|agent| agent.name.clone());
        let user_message = ChatMessage {
            id: state.next_id("message"),
            role: Role::User,
            content: request.message.clone(),
            timestamp: Some(test_timestamp()),
            agent_id: Some(request.agent_id.clone()),
            agent_name: None,
            model: None,
            events: None,
        };
        let reply = format!("echo: {}", request.message);
        let events = vec![EventRecord(serde_json::json!({ "event_type": "done" }))];
        let assistant_message = ChatMessage {
            id: state.next_id("message"),
            role: Role::Assistant,
            content: reply.clone(),
            timestamp: Some(test_timestamp()),
            agent_id: Some(request.agent_id.clone()),
            agent_name,
            model: Some("fake-model".to_string()),
            events: Some(events.clone()),
        };

        let messages = vec![user_message.clone(), assistant_message.clone()];
        if let Some(conversation) = state.conversations.get_mut(&conversation_id) {
            conversation.messages.extend(messages.iter().cloned());
            conversation.messages_count = conversation.messages.len();
        }
        state.touch_conversation(&conversation_id);

        Ok(SendMessageResponse {
            conversation_id,
            user_message_id: Some(user_message.id),
            assistant_message_id: Some(assistant_message.id),
            response: Some(reply),
            messages,
            events: Some(events),
        })
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetail, RemoteFailure> {
        let mut state = self.lock();
        state.record("get_conversation")?;
        state
            .conversations
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| RemoteFailure::not_found(format!("conversation {conversation_id}")))
    }

    async fn list_recent_conversations(
        &self,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, RemoteFailure> {
        let mut state = self.lock();
        state.record("list_recent_conversations")?;
        Ok(state
            .recent_order
            .iter()
            .filter_map(|id| state.conversations.get(id))
            .take(limit)
            .map(|detail| ConversationSummary {
                id: detail.id.clone(),
                title: detail.title.clone(),
                created_at: detail.created_at,
            })
            .collect())
    }

    async fn list_available_agents(&self) -> Result<Vec<Agent>, RemoteFailure> {
        let mut state = self.lock();
        state.record("list_available_agents")?;
        Ok(state.agents.clone())
    }

    async fn list_provider_configs(&self) -> Result<Vec<ProviderConfig>, RemoteFailure> {
        let mut state = self.lock();
        state.record("list_provider_configs")?;
        Ok(state.providers.clone())
    }

    async fn create_provider_config(
        &self,
        provider: &NewProvider,
    ) -> Result<ProviderConfig, RemoteFailure> {
        let mut state = self.lock();
        state.record("create_provider_config")?;
        let created = ProviderConfig {
            id: state.next_id("provider"),
            name: provider.name.clone(),
        };
        state
            .credentials
            .insert(created.id.clone(), provider.credential.clone());
        state.providers.push(created.clone());
        Ok(created)
    }

    async fn update_provider_config(
        &self,
        provider_id: &str,
        update: &ProviderUpdate,
    ) -> Result<ProviderConfig, RemoteFailure> {
        let mut state = self.lock();
        state.record("update_provider_config")?;
        state.provider_updates.push(update.clone());
        let Some(provider) = state
            .providers
            .iter_mut()
            .find(|provider| provider.id == provider_id)
        else {
            return Err(RemoteFailure::not_found(format!("provider {provider_id}")));
        };
        provider.name = update.name.clone();
        let updated = provider.clone();
        if let Some(credential) = &update.credential {
            state
                .credentials
                .insert(provider_id.to_string(), credential.clone());
        }
        Ok(updated)
    }

    async fn delete_provider_config(&self, provider_id: &str) -> Result<(), RemoteFailure> {
        let mut state = self.lock();
        state.record("delete_provider_config")?;
        let before = state.providers.len();
        state.providers.retain(|provider| provider.id != provider_id);
        if state.providers.len() == before {
            return Err(RemoteFailure::not_found(format!("provider {provider_id}")));
        }
        state.models.retain(|model| model.provider_id != provider_id);
        state.credentials.remove(provider_id);
        Ok(())
    }

    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>, RemoteFailure> {
        let mut state = self.lock();
        state.record("list_model_configs")?;
        Ok(state.models.clone())
    }

    async fn create_model_config(&self, model: &NewModel) -> Result<ModelConfig, RemoteFailure> {
        let mut state = self.lock();
        state.record("create_model_config")?;
        if !state
            .providers
            .iter()
            .any(|provider| provider.id == model.provider_id)
        {
            return Err(RemoteFailure::not_found(format!(
                "provider {}",
                model.provider_id
            )));
        }
        let created = ModelConfig {
            id: state.next_id("model"),
            provider_id: model.provider_id.clone(),
            name: model.name.clone(),
            base_url: model.base_url.clone(),
        };
        state.models.push(created.clone());
        Ok(created)
    }

    async fn update_model_config(
        &self,
        model_id: &str,
        update: &ModelUpdate,
    ) -> Result<ModelConfig, RemoteFailure> {
        let mut state = self.lock();
        state.record("update_model_config")?;
        let Some(model) = state.models.iter_mut().find(|model| model.id == model_id) else {
            return Err(RemoteFailure::not_found(format!("model {model_id}")));
        };
        if let Some(name) = &update.name {
            model.name = name.clone();
        }
        if let Some(base_url) = &update.base_url {
            model.base_url = Some(base_url.clone());
        }
        Ok(model.clone())
    }

    async fn delete_model_config(&self, model_id: &str) -> Result<(), RemoteFailure> {
        let mut state = self.lock();
        state.record("delete_model_config")?;
        let before = state.models.len();
        state.models.retain(|model| model.id != model_id);
        if state.models.len() == before {
            return Err(RemoteFailure::not_found(format!("model {model_id}")));
        }
        Ok(())
    }
}

pub fn test_timestamp() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

/// An [`App`] wired to a fresh [`FakeRemote`] that knows one agent, `a1`.
pub fn create_test_app() -> (App, Arc<FakeRemote>) {
    let remote = Arc::new(FakeRemote::new());
    remote.add_agent("a1", "Helper");
    let app = App::new(remote.clone(), AppSettings::default());
    (app, remote)
}
