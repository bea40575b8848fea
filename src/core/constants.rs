//! Shared constants used across the application

/// Longest provider name the backend accepts, counted in characters.
pub const PROVIDER_NAME_MAX_CHARS: usize = 50;

/// Longest model name the backend accepts, counted in characters.
pub const MODEL_NAME_MAX_CHARS: usize = 100;

/// How many conversations the sidebar listing asks for.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Entries kept by the query cache before idle ones are evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Page size used when listing system agents.
pub const AGENT_LIST_LIMIT: usize = 100;
