//! Active conversation/agent selection and the single in-flight send.

use crate::api::{SendMessageRequest, SendMessageResponse};
use crate::core::error::{Failure, Field, ValidationFailure};
use crate::core::flight::SingleFlight;
use crate::core::mutation::{MutationCoordinator, SendMessage};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// What the user currently has selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub conversation_id: Option<String>,
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

#[derive(Debug, Default)]
struct SelectionState {
    selection: Selection,
    // Bumped whenever the conversation selection changes, so a send that
    // finishes late can tell whether the user moved on.
    conversation_epoch: u64,
}

/// Result of an accepted send.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub conversation_id: String,
    /// The send created a new conversation.
    pub started_new: bool,
    /// The conversation is the active one once the send has resolved.
    pub is_active: bool,
    pub response: SendMessageResponse,
}

pub struct SessionState {
    state: Mutex<SelectionState>,
    sending: SingleFlight,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SelectionState::default()),
            sending: SingleFlight::new("send message"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SelectionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn selection(&self) -> Selection {
        self.lock().selection.clone()
    }

    pub fn active_conversation(&self) -> Option<String> {
        self.lock().selection.conversation_id.clone()
    }

    pub fn selected_agent(&self) -> Option<String> {
        self.lock().selection.agent_id.clone()
    }

    pub fn select_conversation(&self, conversation_id: impl Into<String>) {
        let mut state = self.lock();
        state.selection.conversation_id = Some(conversation_id.into());
        state.conversation_epoch += 1;
    }

    /// Clear the conversation so the next send starts a new one.
    pub fn new_conversation(&self) {
        let mut state = self.lock();
        state.selection.conversation_id = None;
        state.conversation_epoch += 1;
    }

    pub fn select_agent(&self, agent_id: impl Into<String>) {
        self.lock().selection.agent_id = Some(agent_id.into());
    }

    pub fn clear_agent(&self) {
        self.lock().selection.agent_id = None;
    }

    /// Select `agent_id` unless the user already picked one. Returns whether
    /// the selection changed.
    pub fn adopt_agent(&self, agent_id: &str) -> bool {
        let mut state = self.lock();
        if state.selection.agent_id.is_some() {
            return false;
        }
        state.selection.agent_id = Some(agent_id.to_string());
        true
    }

    pub fn send_state(&self) -> SendState {
        if self.sending.is_busy() {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    /// Forget every selection.
    pub fn reset(&self) {
        let mut state = self.lock();
        state.selection = Selection::default();
        state.conversation_epoch += 1;
    }

    /// Send `text` to the selected agent in the active conversation, or
    /// start a new conversation when none is active.
    ///
    /// The backend answers every message with a specific agent, so an agent
    /// must be selected even when continuing a conversation. Rejected
    /// locally, without contacting the backend, when the text is blank, when
    /// no agent is selected, or while another send from this session is
    /// still running.
    pub async fn send_message(
        &self,
        coordinator: &MutationCoordinator,
        text: &str,
    ) -> Result<SendOutcome, Failure> {
        if text.trim().is_empty() {
            return Err(ValidationFailure::required(Field::Message).into());
        }

        let (selection, epoch) = {
            let state = self.lock();
            (state.selection.clone(), state.conversation_epoch)
        };
        let Some(agent_id) = selection.agent_id else {
            return Err(ValidationFailure::required(Field::Agent).into());
        };

        let _flight = self.sending.try_begin()?;
        let started_new = selection.conversation_id.is_none();
        debug!(
            conversation = selection.conversation_id.as_deref().unwrap_or("<new>"),
            agent = %agent_id,
            "sending message"
        );

        let operation = SendMessage {
            request: SendMessageRequest {
                message: text.to_string(),
                agent_id,
                conversation_id: selection.conversation_id,
            },
        };
        let response = coordinator.execute(&operation).await?;

        let is_active = {
            let mut state = self.lock();
            if started_new && state.conversation_epoch == epoch {
                state.selection.conversation_id = Some(response.conversation_id.clone());
                state.conversation_epoch += 1;
                info!(conversation = %response.conversation_id, "started new conversation");
            }
            state.selection.conversation_id.as_deref() == Some(response.conversation_id.as_str())
        };

        Ok(SendOutcome {
            conversation_id: response.conversation_id.clone(),
            started_new,
            is_active,
            response,
        })
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
