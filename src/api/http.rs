//! `reqwest` implementation of [`RemoteDataClient`] for the JSON REST backend.

use super::client::{RemoteDataClient, RemoteFailure, RemoteFailureKind};
use super::{
    Agent, ConversationDetail, ConversationSummary, ListEnvelope, ModelConfig, ModelUpdate,
    NewModel, NewProvider, ProviderConfig, ProviderUpdate, SendMessageRequest,
    SendMessageResponse,
};
use crate::core::constants::AGENT_LIST_LIMIT;
use crate::utils::url::{construct_api_url, normalize_base_url};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpRemoteClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpRemoteClient {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("chatdeck/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, token))
    }

    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: normalize_base_url(base_url),
            token,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = construct_api_url(&self.base_url, endpoint);
        debug!(%method, %url, "backend request");
        let request = self
            .client
            .request(method, url)
            .header("Accept", "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, RemoteFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        let response = check_status(response).await?;
        response
            .json::<T>()
            .await
            .map_err(|err| RemoteFailure::decode(err.to_string()))
    }

    async fn fetch_list<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Vec<T>, RemoteFailure> {
        let envelope: ListEnvelope<T> = self.fetch(request).await?;
        Ok(envelope.data)
    }

    async fn execute_discarding_body(&self, request: RequestBuilder) -> Result<(), RemoteFailure> {
        let response = request.send().await.map_err(transport_failure)?;
        check_status(response).await?;
        Ok(())
    }
}

fn item_path(collection: &str, id: &str) -> String {
    format!("{collection}/{}", urlencoding::encode(id))
}

fn transport_failure(err: reqwest::Error) -> RemoteFailure {
    if err.is_timeout() {
        RemoteFailure::transport(format!("request timed out: {err}"))
    } else {
        RemoteFailure::transport(err.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, RemoteFailure> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(failure_from_response(status, &body))
}

pub(crate) fn failure_from_response(status: StatusCode, body: &str) -> RemoteFailure {
    let (message, field) = parse_error_detail(body);
    let message = message.unwrap_or_else(|| format!("request failed with status {status}"));

    let failure = match status {
        StatusCode::NOT_FOUND => RemoteFailure::not_found(message),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            RemoteFailure::validation(message)
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            RemoteFailure::new(RemoteFailureKind::Unauthorized, message)
        }
        _ => RemoteFailure::server(format!("{status}: {message}")),
    };

    match field {
        Some(field) => failure.with_field(field),
        None => failure,
    }
}

/// FastAPI reports either `{"detail": "text"}` or a list of
/// `{"loc": [...], "msg": "..."}` items for request validation errors.
fn parse_error_detail(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        let trimmed = body.trim();
        let message = (!trimmed.is_empty()).then(|| trimmed.to_string());
        return (message, None);
    };

    match value.get("detail") {
        Some(Value::String(text)) => (Some(text.clone()), None),
        Some(Value::Array(items)) => {
            let message = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("; ");
            let field = items
                .first()
                .and_then(|item| item.get("loc"))
                .and_then(Value::as_array)
                .and_then(|loc| loc.iter().rev().find_map(Value::as_str))
                .map(domain_field_name);
            ((!message.is_empty()).then_some(message), field)
        }
        _ => (None, None),
    }
}

fn domain_field_name(wire: &str) -> String {
    match wire {
        "provider" => "name",
        "api_key" => "credential",
        "llm_id" => "provider_id",
        other => other,
    }
    .to_string()
}

#[async_trait]
impl RemoteDataClient for HttpRemoteClient {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageResponse, RemoteFailure> {
        self.fetch(self.request(Method::POST, "chat/").json(request))
            .await
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationDetail, RemoteFailure> {
        let path = format!("{}/detailed", item_path("conversations", conversation_id));
        self.fetch(self.request(Method::GET, &path)).await
    }

    async fn list_recent_conversations(
        &self,
        limit: usize,
    ) -> Result<Vec<ConversationSummary>, RemoteFailure> {
        let request = self
            .request(Method::GET, "conversations/recent")
            .query(&[("limit", limit)]);
        self.fetch_list(request).await
    }

    async fn list_available_agents(&self) -> Result<Vec<Agent>, RemoteFailure> {
        let request = self
            .request(Method::GET, "agents/system")
            .query(&[("skip", 0), ("limit", AGENT_LIST_LIMIT)]);
        self.fetch_list(request).await
    }

    async fn list_provider_configs(&self) -> Result<Vec<ProviderConfig>, RemoteFailure> {
        self.fetch_list(self.request(Method::GET, "llm-configs/"))
            .await
    }

    async fn create_provider_config(
        &self,
        provider: &NewProvider,
    ) -> Result<ProviderConfig, RemoteFailure> {
        self.fetch(self.request(Method::POST, "llm-configs/").json(provider))
            .await
    }

    async fn update_provider_config(
        &self,
        provider_id: &str,
        update: &ProviderUpdate,
    ) -> Result<ProviderConfig, RemoteFailure> {
        let path = item_path("llm-configs", provider_id);
        self.fetch(self.request(Method::PUT, &path).json(update))
            .await
    }

    async fn delete_provider_config(&self, provider_id: &str) -> Result<(), RemoteFailure> {
        let path = item_path("llm-configs", provider_id);
        self.execute_discarding_body(self.request(Method::DELETE, &path))
            .await
    }

    async fn list_model_configs(&self) -> Result<Vec<ModelConfig>, RemoteFailure> {
        self.fetch_list(self.request(Method::GET, "models/")).await
    }

    async fn create_model_config(&self, model: &NewModel) -> Result<ModelConfig, RemoteFailure> {
        self.fetch(self.request(Method::POST, "models/").json(model))
            .await
    }

    async fn update_model_config(
        &self,
        model_id: &str,
        update: &ModelUpdate,
    ) -> Result<ModelConfig, RemoteFailure> {
        let path = item_path("models", model_id);
        self.fetch(self.request(Method::PUT, &path).json(update))
            .await
    }

    async fn delete_model_config(&self, model_id: &str) -> Result<(), RemoteFailure> {
        let path = item_path("models", model_id);
        self.execute_discarding_body(self.request(Method::DELETE, &path))
            .await
    }
}
