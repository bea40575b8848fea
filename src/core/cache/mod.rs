//! Process-wide store of server-owned query results.
//!
//! Each entry carries its last known value, a staleness flag and the number
//! of fetches currently running for it. Staleness only ever clears when a
//! fetch that *started after* the latest invalidation completes, so a slow
//! response can never mask a newer invalidation.

mod key;

#[cfg(test)]
mod tests;

pub use key::{KeyPattern, QueryKey};

use crate::api::{Agent, ConversationDetail, ConversationSummary, ModelConfig, ProviderConfig};
use crate::core::constants::DEFAULT_CACHE_CAPACITY;
use lru::LruCache;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// A cached query result.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryData {
    Conversation(ConversationDetail),
    RecentConversations(Vec<ConversationSummary>),
    Agents(Vec<Agent>),
    Providers(Vec<ProviderConfig>),
    Models(Vec<ModelConfig>),
}

impl QueryData {
    pub fn into_conversation(self) -> Option<ConversationDetail> {
        match self {
            QueryData::Conversation(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn into_recent_conversations(self) -> Option<Vec<ConversationSummary>> {
        match self {
            QueryData::RecentConversations(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_agents(self) -> Option<Vec<Agent>> {
        match self {
            QueryData::Agents(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_providers(self) -> Option<Vec<ProviderConfig>> {
        match self {
            QueryData::Providers(list) => Some(list),
            _ => None,
        }
    }

    pub fn into_models(self) -> Option<Vec<ModelConfig>> {
        match self {
            QueryData::Models(list) => Some(list),
            _ => None,
        }
    }
}

/// Snapshot returned by [`CacheStore::read`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRead {
    pub value: Option<QueryData>,
    pub is_stale: bool,
    pub is_fetching: bool,
}

impl CacheRead {
    /// A value exists and no invalidation has happened since it was fetched.
    pub fn is_fresh(&self) -> bool {
        self.value.is_some() && !self.is_stale
    }
}

/// Proof that a fetch was registered; hand it back on completion.
#[derive(Debug)]
#[must_use = "a fetch ticket must be completed or aborted"]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
    epoch: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug)]
struct CacheEntry {
    value: Option<QueryData>,
    stale: bool,
    fetches_in_flight: usize,
    generation: u64,
    displays: usize,
}

impl CacheEntry {
    fn empty(generation: u64) -> Self {
        Self {
            value: None,
            stale: true,
            fetches_in_flight: 0,
            generation,
            displays: 0,
        }
    }

    fn is_evictable(&self) -> bool {
        self.fetches_in_flight == 0 && self.displays == 0
    }
}

#[derive(Debug)]
struct CacheState {
    // Unbounded so pinned entries can push it over `capacity`; trimmed by
    // `evict_over_capacity` instead.
    entries: LruCache<QueryKey, CacheEntry>,
    pending_refetch: Vec<QueryKey>,
    capacity: usize,
    next_generation: u64,
    epoch: u64,
}

impl CacheState {
    fn next_generation(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }

    fn entry_mut(&mut self, key: &QueryKey) -> &mut CacheEntry {
        let generation = self.next_generation();
        self.entries
            .get_or_insert_mut(key.clone(), || CacheEntry::empty(generation))
    }

    fn schedule_refetch(&mut self, key: &QueryKey) {
        if !self.pending_refetch.contains(key) {
            self.pending_refetch.push(key.clone());
        }
    }

    fn mark_stale(&mut self, key: &QueryKey) -> bool {
        let generation = self.next_generation();
        let Some(entry) = self.entries.peek_mut(key) else {
            return false;
        };
        entry.stale = true;
        entry.generation = generation;
        let displayed = entry.displays > 0;
        if displayed {
            self.schedule_refetch(key);
        }
        true
    }

    /// Drop least recently used entries until back under capacity. Entries
    /// that are displayed or being fetched stay, as does `keep`; when only
    /// those are left the store runs over capacity until one is released.
    fn evict_over_capacity(&mut self, keep: Option<&QueryKey>) {
        while self.entries.len() > self.capacity {
            let victim = self
                .entries
                .iter()
                .rev()
                .find(|(key, entry)| keep != Some(*key) && entry.is_evictable())
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    debug!(key = %key, "evicting least recently used cache entry");
                    self.entries.pop(&key);
                }
                None => break,
            }
        }
    }
}

/// Keyed cache shared by every reader and mutation in a session.
#[derive(Debug)]
pub struct CacheStore {
    state: Mutex<CacheState>,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: LruCache::unbounded(),
                pending_refetch: Vec::new(),
                capacity: capacity.max(1),
                next_generation: 0,
                epoch: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current value and status for `key`. A missing entry reads as stale.
    /// Reading marks the entry as recently used.
    pub fn read(&self, key: &QueryKey) -> CacheRead {
        let mut state = self.lock();
        match state.entries.get(key) {
            Some(entry) => CacheRead {
                value: entry.value.clone(),
                is_stale: entry.stale,
                is_fetching: entry.fetches_in_flight > 0,
            },
            None => CacheRead {
                value: None,
                is_stale: true,
                is_fetching: false,
            },
        }
    }

    /// Replace the cached value with one known to be current.
    pub fn write(&self, key: &QueryKey, value: QueryData) {
        let mut state = self.lock();
        let generation = state.next_generation();
        let entry = state.entry_mut(key);
        entry.value = Some(value);
        entry.stale = false;
        entry.generation = generation;
        state.pending_refetch.retain(|pending| pending != key);
        state.evict_over_capacity(Some(key));
    }

    /// Register a fetch for `key`. The returned ticket remembers which
    /// invalidation the fetch is answering.
    pub fn begin_fetch(&self, key: &QueryKey) -> FetchTicket {
        let mut state = self.lock();
        let epoch = state.epoch;
        let entry = state.entry_mut(key);
        entry.fetches_in_flight += 1;
        let generation = entry.generation;
        trace!(key = %key, generation, "fetch started");
        state.pending_refetch.retain(|pending| pending != key);
        state.evict_over_capacity(Some(key));
        FetchTicket {
            key: key.clone(),
            generation,
            epoch,
        }
    }

    /// Store the result of a fetch. Returns `true` when the entry is fresh
    /// afterwards; `false` when it was invalidated while the fetch ran (or
    /// the store was cleared), in which case another fetch is due.
    pub fn complete_fetch(&self, ticket: FetchTicket, value: QueryData) -> bool {
        let mut state = self.lock();
        if ticket.epoch != state.epoch {
            debug!(key = %ticket.key, "dropping fetch result from before cache clear");
            return false;
        }

        let Some(entry) = state.entries.get_mut(&ticket.key) else {
            return false;
        };
        entry.fetches_in_flight = entry.fetches_in_flight.saturating_sub(1);
        let fresh = entry.generation == ticket.generation;
        if fresh {
            entry.value = Some(value);
            entry.stale = false;
        } else if entry.stale {
            entry.value = Some(value);
            debug!(key = %ticket.key, "entry invalidated during fetch; staying stale");
        } else {
            debug!(key = %ticket.key, "discarding fetch result superseded by a newer one");
        }
        let displayed = entry.displays > 0;
        if !fresh && displayed {
            state.schedule_refetch(&ticket.key);
        }
        state.evict_over_capacity(Some(&ticket.key));
        fresh
    }

    /// Release a fetch that failed. The entry keeps its previous value.
    pub fn abort_fetch(&self, ticket: FetchTicket) {
        let mut state = self.lock();
        if ticket.epoch != state.epoch {
            return;
        }
        if let Some(entry) = state.entries.peek_mut(&ticket.key) {
            entry.fetches_in_flight = entry.fetches_in_flight.saturating_sub(1);
        }
    }

    /// Mark `key` stale. Returns `false` when nothing was cached for it.
    pub fn invalidate(&self, key: &QueryKey) -> bool {
        let invalidated = self.lock().mark_stale(key);
        if invalidated {
            debug!(key = %key, "cache entry invalidated");
        }
        invalidated
    }

    /// Mark every entry matching any of `patterns` stale in one critical
    /// section, so no reader observes a partially applied set.
    pub fn invalidate_matching(&self, patterns: &[KeyPattern]) -> Vec<QueryKey> {
        let mut state = self.lock();
        let matched: Vec<QueryKey> = state
            .entries
            .iter()
            .map(|(key, _)| key)
            .filter(|key| patterns.iter().any(|pattern| pattern.matches(key)))
            .cloned()
            .collect();
        for key in &matched {
            state.mark_stale(key);
        }
        drop(state);

        debug!(
            patterns = ?patterns.iter().map(ToString::to_string).collect::<Vec<_>>(),
            invalidated = matched.len(),
            "cache entries invalidated"
        );
        matched
    }

    /// Note that `key` is on screen. Displayed entries are refetched as
    /// soon as they go stale and are never evicted.
    pub fn watch(&self, key: &QueryKey) {
        let mut state = self.lock();
        let entry = state.entry_mut(key);
        entry.displays += 1;
        let needs_fetch = entry.stale && entry.fetches_in_flight == 0;
        if needs_fetch {
            state.schedule_refetch(key);
        }
    }

    pub fn unwatch(&self, key: &QueryKey) {
        let mut state = self.lock();
        if let Some(entry) = state.entries.peek_mut(key) {
            entry.displays = entry.displays.saturating_sub(1);
        }
        state.evict_over_capacity(None);
    }

    /// Drain the displayed keys that went stale and need an immediate fetch.
    pub fn take_pending_refetches(&self) -> Vec<QueryKey> {
        std::mem::take(&mut self.lock().pending_refetch)
    }

    /// Drop everything. Fetches still in flight are ignored when they land.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.pending_refetch.clear();
        state.epoch += 1;
        debug!("cache cleared");
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
