//! One user session: the cache, the session state and the hierarchy
//! manager, all sharing the same backend client.

use crate::api::{Agent, ConversationDetail, ConversationSummary, RemoteDataClient};
use crate::core::cache::{CacheStore, QueryKey};
use crate::core::constants::{DEFAULT_CACHE_CAPACITY, DEFAULT_RECENT_LIMIT};
use crate::core::error::Failure;
use crate::core::hierarchy::ConfigHierarchy;
use crate::core::mutation::MutationCoordinator;
use crate::core::queries::QueryClient;
use crate::core::session::{SendOutcome, SessionState};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    pub cache_capacity: usize,
    pub recent_limit: usize,
    pub default_agent: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            recent_limit: DEFAULT_RECENT_LIMIT,
            default_agent: None,
        }
    }
}

pub struct App {
    cache: Arc<CacheStore>,
    queries: QueryClient,
    coordinator: MutationCoordinator,
    session: SessionState,
    hierarchy: ConfigHierarchy,
    recent_limit: usize,
    displayed_conversation: Mutex<Option<QueryKey>>,
}

impl App {
    pub fn new(remote: Arc<dyn RemoteDataClient>, settings: AppSettings) -> Self {
        let cache = Arc::new(CacheStore::with_capacity(settings.cache_capacity));
        let queries = QueryClient::new(Arc::clone(&remote), Arc::clone(&cache));
        let coordinator = MutationCoordinator::new(remote, Arc::clone(&cache));
        let hierarchy = ConfigHierarchy::new(queries.clone(), coordinator.clone());

        let session = SessionState::new();
        if let Some(agent) = settings.default_agent {
            session.select_agent(agent);
        }

        Self {
            cache,
            queries,
            coordinator,
            session,
            hierarchy,
            recent_limit: settings.recent_limit,
            displayed_conversation: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn hierarchy(&self) -> &ConfigHierarchy {
        &self.hierarchy
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Send in the active conversation (or start one with the selected agent).
    ///
    /// With no agent selected, a follow-up goes to the agent that last
    /// answered in the active conversation.
    pub async fn send(&self, text: &str) -> Result<SendOutcome, Failure> {
        if self.session.selected_agent().is_none() && !text.trim().is_empty() {
            self.active_transcript().await?;
        }
        let outcome = self.session.send_message(&self.coordinator, text).await?;
        if outcome.is_active {
            self.display_conversation(Some(&outcome.conversation_id));
        }
        Ok(outcome)
    }

    pub fn open_conversation(&self, conversation_id: &str) {
        self.session.select_conversation(conversation_id);
        self.display_conversation(Some(conversation_id));
    }

    pub fn new_conversation(&self) {
        self.session.new_conversation();
        self.display_conversation(None);
    }

    // Keeps the on-screen conversation watched so it refetches as soon as
    // a send invalidates it.
    fn display_conversation(&self, conversation_id: Option<&str>) {
        let next = conversation_id.map(|id| QueryKey::Conversation(id.to_string()));
        let mut displayed = self
            .displayed_conversation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *displayed == next {
            return;
        }
        if let Some(previous) = displayed.take() {
            self.cache.unwatch(&previous);
        }
        if let Some(key) = &next {
            self.cache.watch(key);
        }
        *displayed = next;
    }

    /// Transcript of the active conversation, if any.
    pub async fn active_transcript(&self) -> Result<Option<ConversationDetail>, Failure> {
        let Some(id) = self.session.active_conversation() else {
            return Ok(None);
        };
        let detail = self.queries.conversation(&id).await?;
        self.adopt_conversation_agent(&detail);
        Ok(Some(detail))
    }

    fn adopt_conversation_agent(&self, detail: &ConversationDetail) {
        let last_agent = detail
            .messages
            .iter()
            .rev()
            .find_map(|message| message.agent_id.as_deref());
        if let Some(agent_id) = last_agent {
            if self.session.adopt_agent(agent_id) {
                info!(
                    conversation = %detail.id,
                    agent = agent_id,
                    "continuing with the conversation's agent"
                );
            }
        }
    }

    pub async fn recent_conversations(&self) -> Result<Vec<ConversationSummary>, Failure> {
        self.queries.recent_conversations(self.recent_limit).await
    }

    /// Agents that can currently be chatted with.
    pub async fn agents(&self) -> Result<Vec<Agent>, Failure> {
        let agents = self.queries.agents().await?;
        Ok(agents.into_iter().filter(Agent::is_active).collect())
    }

    /// Refetch whatever is on screen and went stale.
    pub async fn refresh(&self) {
        for (key, err) in self.queries.refresh_displayed().await {
            warn!(key = %key, error = %err, "failed to refresh displayed query");
        }
    }

    /// Drop all cached server state and selections (logout).
    pub fn teardown(&self) {
        self.display_conversation(None);
        self.cache.clear();
        self.session.reset();
        info!("session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Role;
    use crate::utils::test_utils::create_test_app;

    #[tokio::test]
    async fn first_message_creates_and_shows_a_conversation() {
        let (app, remote) = create_test_app();
        app.session().select_agent("a1");

        let outcome = app.send("hi").await.unwrap();
        assert!(outcome.started_new);
        assert_eq!(
            app.session().active_conversation(),
            Some(outcome.conversation_id.clone())
        );

        let transcript = app.active_transcript().await.unwrap().unwrap();
        assert_eq!(transcript.id, outcome.conversation_id);
        assert_eq!(transcript.messages.len(), 2);
        assert_eq!(transcript.messages[0].role, Role::User);
        assert_eq!(transcript.messages[0].content, "hi");
        assert_eq!(transcript.messages[1].event_count(), 1);
        assert_eq!(remote.call_count("get_conversation"), 1);
    }

    #[tokio::test]
    async fn sending_refreshes_the_displayed_transcript() {
        let (app, remote) = create_test_app();
        app.session().select_agent("a1");
        app.send("one").await.unwrap();
        assert_eq!(app.active_transcript().await.unwrap().unwrap().messages.len(), 2);

        app.send("two").await.unwrap();
        app.refresh().await;
        assert_eq!(remote.call_count("get_conversation"), 2);

        // Served from the refreshed entry without another fetch.
        let transcript = app.active_transcript().await.unwrap().unwrap();
        assert_eq!(transcript.messages.len(), 4);
        assert_eq!(remote.call_count("get_conversation"), 2);
    }

    #[tokio::test]
    async fn recent_list_picks_up_new_conversations() {
        let (app, _remote) = create_test_app();
        app.session().select_agent("a1");
        assert!(app.recent_conversations().await.unwrap().is_empty());

        let outcome = app.send("hello there").await.unwrap();

        let recent = app.recent_conversations().await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, outcome.conversation_id);
    }

    #[tokio::test]
    async fn new_conversation_clears_selection_but_keeps_agent() {
        let (app, remote) = create_test_app();
        remote.add_conversation("c1", "Earlier");
        app.session().select_agent("a1");
        app.open_conversation("c1");

        app.new_conversation();

        assert_eq!(app.session().active_conversation(), None);
        assert_eq!(app.session().selected_agent().as_deref(), Some("a1"));
        assert!(app.active_transcript().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn follow_up_without_selection_uses_the_conversation_agent() {
        let (app, remote) = create_test_app();
        app.session().select_agent("a1");
        let first = app.send("hi").await.unwrap();

        app.session().clear_agent();
        app.new_conversation();
        app.open_conversation(&first.conversation_id);
        let outcome = app.send("follow-up").await.unwrap();

        assert!(!outcome.started_new);
        let sent = remote.sent_requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].agent_id, "a1");
        assert_eq!(
            sent[1].conversation_id.as_deref(),
            Some(first.conversation_id.as_str())
        );
        assert_eq!(app.session().selected_agent().as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn follow_up_in_empty_conversation_needs_an_agent() {
        let (app, remote) = create_test_app();
        remote.add_conversation("c1", "Blank");
        app.open_conversation("c1");

        let err = app.send("hello?").await.unwrap_err();

        assert_eq!(err.field(), Some("agent"));
        assert_eq!(remote.call_count("send_message"), 0);
    }

    #[tokio::test]
    async fn explicit_agent_wins_over_the_conversation_agent() {
        let (app, remote) = create_test_app();
        remote.add_agent("a2", "Reviewer");
        app.session().select_agent("a1");
        let first = app.send("hi").await.unwrap();

        app.session().select_agent("a2");
        app.open_conversation(&first.conversation_id);
        app.send("second opinion").await.unwrap();

        assert_eq!(remote.sent_requests()[1].agent_id, "a2");
    }

    #[tokio::test]
    async fn inactive_agents_are_hidden() {
        let (app, remote) = create_test_app();
        remote.add_agent("a2", "Retired");
        remote.retire_agent("a2");

        let agents = app.agents().await.unwrap();
        let ids: Vec<&str> = agents.iter().map(|agent| agent.id.as_str()).collect();
        assert_eq!(ids, vec!["a1"]);
    }

    #[tokio::test]
    async fn default_agent_is_preselected() {
        let remote = Arc::new(crate::utils::test_utils::FakeRemote::new());
        let app = App::new(
            remote,
            AppSettings {
                default_agent: Some("a1".to_string()),
                ..AppSettings::default()
            },
        );
        assert_eq!(app.session().selected_agent().as_deref(), Some("a1"));
    }

    #[tokio::test]
    async fn teardown_clears_cache_and_selection() {
        let (app, _remote) = create_test_app();
        app.session().select_agent("a1");
        app.send("hi").await.unwrap();
        app.active_transcript().await.unwrap();
        assert!(!app.cache().is_empty());

        app.teardown();

        assert!(app.cache().is_empty());
        assert_eq!(app.session().selection(), Default::default());
    }
}
