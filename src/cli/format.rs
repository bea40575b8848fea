//! Plain-text rendering of backend data for the terminal.

use crate::api::{
    Agent, ChatMessage, ConversationDetail, ConversationSummary, ModelConfig, ProviderConfig,
    Role,
};
use crate::core::session::SendOutcome;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

fn speaker(message: &ChatMessage) -> &str {
    match message.role {
        Role::User => "You",
        Role::Assistant => message.agent_name.as_deref().unwrap_or("Assistant"),
        Role::System => "System",
        Role::Tool => "Tool",
    }
}

fn event_suffix(count: usize) -> String {
    match count {
        0 => String::new(),
        1 => " [1 event]".to_string(),
        n => format!(" [{n} events]"),
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    let mut header = speaker(message).to_string();
    if let Some(timestamp) = message.timestamp {
        header.push_str(&format!(" ({})", timestamp.format(TIMESTAMP_FORMAT)));
    }
    if let Some(model) = &message.model {
        header.push_str(&format!(" via {model}"));
    }
    header.push_str(&event_suffix(message.event_count()));

    let mut out = format!("{header}:\n");
    for line in message.content.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    out
}

pub fn format_transcript(detail: &ConversationDetail) -> String {
    let mut out = format!(
        "{} [{}] started {}\n",
        detail.title,
        detail.id,
        detail.created_at.format(TIMESTAMP_FORMAT)
    );
    if detail.messages.is_empty() {
        out.push_str("\n(no messages yet)\n");
        return out;
    }
    for message in &detail.messages {
        out.push('\n');
        out.push_str(&format_message(message));
    }
    out
}

pub fn format_conversations(conversations: &[ConversationSummary]) -> String {
    if conversations.is_empty() {
        return "No conversations yet.\n".to_string();
    }
    let mut out = String::from("Recent conversations:\n");
    for conversation in conversations {
        out.push_str(&format!(
            "  {}  {}  {}\n",
            conversation.id,
            conversation.created_at.format(TIMESTAMP_FORMAT),
            conversation.title
        ));
    }
    out
}

pub fn format_agents(agents: &[Agent], selected: Option<&str>) -> String {
    if agents.is_empty() {
        return "No agents available.\n".to_string();
    }
    let mut out = String::from("Agents:\n");
    for agent in agents {
        let marker = if selected == Some(agent.id.as_str()) {
            "*"
        } else {
            " "
        };
        out.push_str(&format!("{marker} {}  {}", agent.id, agent.name));
        if let Some(team) = agent.team.as_ref().filter(|team| !team.is_empty()) {
            out.push_str(&format!("  (team: {})", team.join(", ")));
        }
        out.push('\n');
    }
    if selected.is_some() {
        out.push_str("\n* = selected agent\n");
    }
    out
}

pub fn format_providers(providers: &[ProviderConfig]) -> String {
    if providers.is_empty() {
        return "No providers configured.\n".to_string();
    }
    let mut out = String::from("Providers:\n");
    for provider in providers {
        out.push_str(&format!("  {}  {}\n", provider.id, provider.name));
    }
    out
}

pub fn format_models(provider_id: &str, models: &[ModelConfig]) -> String {
    if models.is_empty() {
        return format!("No models configured for provider {provider_id}.\n");
    }
    let mut out = format!("Models for provider {provider_id}:\n");
    for model in models {
        out.push_str(&format!("  {}  {}", model.id, model.name));
        if let Some(base_url) = &model.base_url {
            out.push_str(&format!("  {base_url}"));
        }
        out.push('\n');
    }
    out
}

/// Reply text of a completed send, falling back to the last assistant
/// message when the backend left `response` empty.
pub fn format_reply(outcome: &SendOutcome) -> String {
    let response = &outcome.response;
    let reply = response.response.clone().or_else(|| {
        response
            .messages
            .iter()
            .rev()
            .find(|message| message.role == Role::Assistant)
            .map(|message| message.content.clone())
    });

    let mut out = reply.unwrap_or_else(|| "(no reply)".to_string());
    out.push_str(&event_suffix(response.event_count()));
    out.push('\n');
    if outcome.started_new {
        out.push_str(&format!("(started conversation {})\n", outcome.conversation_id));
    }
    out
}
