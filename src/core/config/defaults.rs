use crate::core::app::AppSettings;
use crate::core::config::data::{Config, ConfigKey};
use crate::core::config::io::ConfigError;
use crate::core::constants::{
    DEFAULT_CACHE_CAPACITY, DEFAULT_RECENT_LIMIT, DEFAULT_REQUEST_TIMEOUT_SECS,
};
use crate::utils::url::normalize_base_url;
use std::str::FromStr;
use std::time::Duration;

pub const SERVER_URL_ENV: &str = "CHATDECK_SERVER_URL";

impl Config {
    /// Backend base URL, preferring `CHATDECK_SERVER_URL` over the file.
    pub fn server_url(&self) -> Option<String> {
        let from_env = std::env::var(SERVER_URL_ENV).ok();
        self.server_url_with_override(from_env.as_deref())
    }

    pub(crate) fn server_url_with_override(&self, env_value: Option<&str>) -> Option<String> {
        env_value
            .or(self.server_url.as_deref())
            .map(normalize_base_url)
            .filter(|url| !url.is_empty())
    }

    pub fn recent_limit(&self) -> usize {
        self.recent_limit.unwrap_or(DEFAULT_RECENT_LIMIT)
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(DEFAULT_CACHE_CAPACITY)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn app_settings(&self) -> AppSettings {
        AppSettings {
            cache_capacity: self.cache_capacity(),
            recent_limit: self.recent_limit(),
            default_agent: self.default_agent.clone(),
        }
    }

    pub fn set_value(&mut self, key: ConfigKey, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        if value.is_empty() {
            return Err(invalid(key, value, "value must not be empty"));
        }

        match key {
            ConfigKey::ServerUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(invalid(key, value, "expected an http:// or https:// URL"));
                }
                self.server_url = Some(normalize_base_url(value));
            }
            ConfigKey::RecentLimit => self.recent_limit = Some(parse_positive(key, value)?),
            ConfigKey::CacheCapacity => self.cache_capacity = Some(parse_positive(key, value)?),
            ConfigKey::RequestTimeoutSecs => {
                self.request_timeout_secs = Some(parse_positive(key, value)?)
            }
            ConfigKey::DefaultAgent => self.default_agent = Some(value.to_string()),
            ConfigKey::LogFilter => self.log_filter = Some(value.to_string()),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: ConfigKey) {
        match key {
            ConfigKey::ServerUrl => self.server_url = None,
            ConfigKey::RecentLimit => self.recent_limit = None,
            ConfigKey::CacheCapacity => self.cache_capacity = None,
            ConfigKey::RequestTimeoutSecs => self.request_timeout_secs = None,
            ConfigKey::DefaultAgent => self.default_agent = None,
            ConfigKey::LogFilter => self.log_filter = None,
        }
    }
}

fn invalid(key: ConfigKey, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_positive<T>(key: ConfigKey, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + PartialEq + Default,
{
    match value.parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        Ok(_) => Err(invalid(key, value, "must be greater than zero")),
        Err(_) => Err(invalid(key, value, "expected a whole number")),
    }
}
