use std::fmt;

/// Identity of a cached query result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// A single conversation with its full message list.
    Conversation(String),
    /// The "recent conversations" listing for a given page size.
    RecentConversations { limit: usize },
    SystemAgents,
    ProviderConfigs,
    /// Models whose parent is the given provider.
    Models(String),
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Conversation(id) => write!(f, "conversation/{id}"),
            QueryKey::RecentConversations { limit } => write!(f, "conversations/recent/{limit}"),
            QueryKey::SystemAgents => write!(f, "agents/system"),
            QueryKey::ProviderConfigs => write!(f, "llmConfigs"),
            QueryKey::Models(provider_id) => write!(f, "models/{provider_id}"),
        }
    }
}

/// Selects the cache entries a mutation makes obsolete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    Exact(QueryKey),
    /// Every recent-conversations listing, whatever its limit.
    AnyRecentConversations,
}

impl KeyPattern {
    pub fn matches(&self, key: &QueryKey) -> bool {
        match self {
            KeyPattern::Exact(exact) => exact == key,
            KeyPattern::AnyRecentConversations => {
                matches!(key, QueryKey::RecentConversations { .. })
            }
        }
    }
}

impl From<QueryKey> for KeyPattern {
    fn from(key: QueryKey) -> Self {
        KeyPattern::Exact(key)
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyPattern::Exact(key) => write!(f, "{key}"),
            KeyPattern::AnyRecentConversations => write!(f, "conversations/recent/*"),
        }
    }
}
