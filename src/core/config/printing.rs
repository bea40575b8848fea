use crate::core::config::data::{Config, ConfigKey};

impl Config {
    /// Value of `key` as stored in the file, if set.
    pub fn display_value(&self, key: ConfigKey) -> Option<String> {
        match key {
            ConfigKey::ServerUrl => self.server_url.clone(),
            ConfigKey::RecentLimit => self.recent_limit.map(|value| value.to_string()),
            ConfigKey::CacheCapacity => self.cache_capacity.map(|value| value.to_string()),
            ConfigKey::RequestTimeoutSecs => {
                self.request_timeout_secs.map(|value| value.to_string())
            }
            ConfigKey::DefaultAgent => self.default_agent.clone(),
            ConfigKey::LogFilter => self.log_filter.clone(),
        }
    }

    pub fn format_all(&self) -> String {
        let mut out = String::from("Current configuration:\n");
        for key in ConfigKey::ALL {
            match self.display_value(key) {
                Some(value) => out.push_str(&format!("  {key}: {value}\n")),
                None => out.push_str(&format!("  {key}: (unset)\n")),
            }
        }
        out
    }

    pub fn print_all(&self) {
        print!("{}", self.format_all());
    }
}
