use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Persistent client settings. Every field is optional on disk; the
/// effective values (with defaults applied) live in `defaults.rs`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend base URL, e.g. `https://chat.example.com/api/v1`
    pub server_url: Option<String>,
    /// How many conversations `conversations` lists
    pub recent_limit: Option<usize>,
    /// Maximum number of cached query results
    pub cache_capacity: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    /// Agent preselected when starting a new conversation
    pub default_agent: Option<String>,
    /// `tracing` filter directive used when `CHATDECK_LOG` is unset
    pub log_filter: Option<String>,
}

/// Settings addressable from `chatdeck set` / `chatdeck unset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ServerUrl,
    RecentLimit,
    CacheCapacity,
    RequestTimeoutSecs,
    DefaultAgent,
    LogFilter,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 6] = [
        ConfigKey::ServerUrl,
        ConfigKey::RecentLimit,
        ConfigKey::CacheCapacity,
        ConfigKey::RequestTimeoutSecs,
        ConfigKey::DefaultAgent,
        ConfigKey::LogFilter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::ServerUrl => "server-url",
            ConfigKey::RecentLimit => "recent-limit",
            ConfigKey::CacheCapacity => "cache-capacity",
            ConfigKey::RequestTimeoutSecs => "request-timeout-secs",
            ConfigKey::DefaultAgent => "default-agent",
            ConfigKey::LogFilter => "log-filter",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace('_', "-");
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| raw.trim().to_string())
    }
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.config/chatdeck/config.toml` → `~/.config/chatdeck/config.toml`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
