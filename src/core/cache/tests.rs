use super::*;
use crate::api::ProviderConfig;

fn providers(names: &[&str]) -> QueryData {
    QueryData::Providers(
        names
            .iter()
            .enumerate()
            .map(|(index, name)| ProviderConfig {
                id: format!("p{index}"),
                name: name.to_string(),
            })
            .collect(),
    )
}

fn models_key(provider: &str) -> QueryKey {
    QueryKey::Models(provider.to_string())
}

#[test]
fn missing_entry_reads_as_stale_without_value() {
    let cache = CacheStore::new();
    let read = cache.read(&QueryKey::ProviderConfigs);
    assert_eq!(read.value, None);
    assert!(read.is_stale);
    assert!(!read.is_fetching);
    assert!(cache.is_empty());
}

#[test]
fn completed_fetch_after_invalidation_clears_staleness() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;
    cache.write(&key, providers(&["OpenAI"]));

    assert!(cache.invalidate(&key));
    assert!(cache.read(&key).is_stale);

    let ticket = cache.begin_fetch(&key);
    assert!(cache.read(&key).is_fetching);
    assert!(cache.complete_fetch(ticket, providers(&["OpenAI", "DeepSeek"])));

    let read = cache.read(&key);
    assert!(!read.is_stale);
    assert!(!read.is_fetching);
    assert_eq!(read.value, Some(providers(&["OpenAI", "DeepSeek"])));
}

#[test]
fn invalidation_during_fetch_keeps_entry_stale() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;

    let ticket = cache.begin_fetch(&key);
    cache.invalidate(&key);
    assert!(!cache.complete_fetch(ticket, providers(&["old"])));

    let read = cache.read(&key);
    assert!(read.is_stale);
    assert_eq!(read.value, Some(providers(&["old"])));

    let retry = cache.begin_fetch(&key);
    assert!(cache.complete_fetch(retry, providers(&["new"])));
    assert!(cache.read(&key).is_fresh());
}

#[test]
fn superseded_fetch_result_does_not_overwrite_newer_value() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;

    let early = cache.begin_fetch(&key);
    cache.invalidate(&key);
    let late = cache.begin_fetch(&key);

    assert!(cache.complete_fetch(late, providers(&["new"])));
    assert!(cache.read(&key).is_fetching);
    assert!(!cache.complete_fetch(early, providers(&["old"])));

    let read = cache.read(&key);
    assert!(!read.is_stale);
    assert!(!read.is_fetching);
    assert_eq!(read.value, Some(providers(&["new"])));
}

#[test]
fn repeated_invalidations_coalesce() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;
    cache.write(&key, providers(&["OpenAI"]));
    cache.watch(&key);

    cache.invalidate(&key);
    cache.invalidate(&key);
    cache.invalidate_matching(&[KeyPattern::Exact(key.clone())]);

    assert_eq!(cache.take_pending_refetches(), vec![key.clone()]);
    assert!(cache.take_pending_refetches().is_empty());
}

#[test]
fn invalidating_unknown_key_is_a_no_op() {
    let cache = CacheStore::new();
    assert!(!cache.invalidate(&QueryKey::SystemAgents));
    assert!(cache.is_empty());
}

#[test]
fn invalidate_matching_hits_every_recent_listing() {
    let cache = CacheStore::new();
    cache.write(
        &QueryKey::RecentConversations { limit: 10 },
        QueryData::RecentConversations(Vec::new()),
    );
    cache.write(
        &QueryKey::RecentConversations { limit: 25 },
        QueryData::RecentConversations(Vec::new()),
    );
    cache.write(&QueryKey::ProviderConfigs, providers(&["OpenAI"]));

    let mut invalidated = cache.invalidate_matching(&[KeyPattern::AnyRecentConversations]);
    invalidated.sort_by_key(ToString::to_string);

    assert_eq!(
        invalidated,
        vec![
            QueryKey::RecentConversations { limit: 10 },
            QueryKey::RecentConversations { limit: 25 },
        ]
    );
    assert!(cache.read(&QueryKey::ProviderConfigs).is_fresh());
}

#[test]
fn only_displayed_keys_are_scheduled_for_immediate_refetch() {
    let cache = CacheStore::new();
    let shown = models_key("p1");
    let hidden = models_key("p2");
    cache.write(&shown, QueryData::Models(Vec::new()));
    cache.write(&hidden, QueryData::Models(Vec::new()));
    cache.watch(&shown);
    assert!(cache.take_pending_refetches().is_empty());

    cache.invalidate_matching(&[shown.clone().into(), hidden.clone().into()]);
    assert_eq!(cache.take_pending_refetches(), vec![shown.clone()]);

    cache.unwatch(&shown);
    cache.invalidate(&shown);
    assert!(cache.take_pending_refetches().is_empty());
}

#[test]
fn watching_an_uncached_key_requests_a_fetch() {
    let cache = CacheStore::new();
    cache.watch(&QueryKey::SystemAgents);
    assert_eq!(cache.take_pending_refetches(), vec![QueryKey::SystemAgents]);
}

#[test]
fn lru_evicts_least_recently_read_idle_entry() {
    let cache = CacheStore::with_capacity(2);
    cache.write(&models_key("a"), QueryData::Models(Vec::new()));
    cache.write(&models_key("b"), QueryData::Models(Vec::new()));

    // "a" becomes the most recently read entry.
    cache.read(&models_key("a"));
    cache.write(&models_key("c"), QueryData::Models(Vec::new()));

    assert_eq!(cache.len(), 2);
    assert!(cache.read(&models_key("a")).value.is_some());
    assert!(cache.read(&models_key("b")).value.is_none());
    assert!(cache.read(&models_key("c")).value.is_some());
}

#[test]
fn lru_spares_displayed_and_fetching_entries() {
    let cache = CacheStore::with_capacity(2);
    cache.write(&models_key("shown"), QueryData::Models(Vec::new()));
    cache.watch(&models_key("shown"));
    let ticket = cache.begin_fetch(&models_key("loading"));

    cache.write(&models_key("extra"), QueryData::Models(Vec::new()));

    // Every other entry is pinned, so the store runs over capacity rather
    // than dropping what was just written.
    assert_eq!(cache.len(), 3);
    assert!(cache.read(&models_key("shown")).value.is_some());
    assert!(cache.read(&models_key("loading")).is_fetching);
    assert!(cache.read(&models_key("extra")).value.is_some());

    // Releasing the display makes "shown" the oldest evictable entry.
    cache.unwatch(&models_key("shown"));
    assert_eq!(cache.len(), 2);
    assert!(cache.read(&models_key("shown")).value.is_none());
    assert!(cache.read(&models_key("extra")).value.is_some());

    cache.abort_fetch(ticket);
}

#[test]
fn completed_fetch_is_kept_when_everything_else_is_displayed() {
    let cache = CacheStore::with_capacity(1);
    cache.write(&models_key("shown"), QueryData::Models(Vec::new()));
    cache.watch(&models_key("shown"));

    let ticket = cache.begin_fetch(&models_key("next"));
    assert!(cache.complete_fetch(ticket, QueryData::Models(Vec::new())));

    assert!(cache.read(&models_key("next")).is_fresh());
    assert!(cache.read(&models_key("shown")).value.is_some());
}

#[test]
fn abort_keeps_previous_value() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;
    cache.write(&key, providers(&["OpenAI"]));
    cache.invalidate(&key);

    let ticket = cache.begin_fetch(&key);
    cache.abort_fetch(ticket);

    let read = cache.read(&key);
    assert_eq!(read.value, Some(providers(&["OpenAI"])));
    assert!(read.is_stale);
    assert!(!read.is_fetching);
}

#[test]
fn clear_discards_entries_and_late_fetch_results() {
    let cache = CacheStore::new();
    let key = QueryKey::ProviderConfigs;
    cache.write(&key, providers(&["OpenAI"]));
    let ticket = cache.begin_fetch(&QueryKey::SystemAgents);

    cache.clear();
    assert!(cache.is_empty());

    assert!(!cache.complete_fetch(ticket, QueryData::Agents(Vec::new())));
    assert!(cache.is_empty());
}
