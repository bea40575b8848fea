//! Backend access token storage.
//!
//! Tokens live in the OS keyring under the `chatdeck` service, one entry
//! per backend (the normalized server URL is the account name). The
//! `CHATDECK_TOKEN` environment variable overrides whatever is stored.

pub mod ui;

use crate::core::keyring::KeyringAccessError;
use crate::utils::url::normalize_base_url;
use keyring::Entry;
use tracing::{debug, warn};

pub const KEYRING_SERVICE: &str = "chatdeck";
pub const TOKEN_ENV: &str = "CHATDECK_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Keyring,
}

pub struct TokenStore {
    use_keyring: bool,
}

impl TokenStore {
    pub fn new() -> Self {
        Self::new_with_keyring(true)
    }

    /// Construct a store, optionally disabling keyring access (useful for tests)
    pub fn new_with_keyring(use_keyring: bool) -> Self {
        Self { use_keyring }
    }

    fn entry(server_url: &str) -> Result<Entry, KeyringAccessError> {
        Ok(Entry::new(KEYRING_SERVICE, &normalize_base_url(server_url))?)
    }

    pub fn store(&self, server_url: &str, token: &str) -> Result<(), KeyringAccessError> {
        if !self.use_keyring {
            return Ok(());
        }
        Self::entry(server_url)?.set_password(token.trim())?;
        debug!(server = %normalize_base_url(server_url), "stored access token");
        Ok(())
    }

    /// Remove the stored token. Returns `false` when there was none.
    pub fn remove(&self, server_url: &str) -> Result<bool, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(false);
        }
        match Self::entry(server_url)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Token stored in the keyring for `server_url`, ignoring the environment.
    pub fn lookup(&self, server_url: &str) -> Result<Option<String>, KeyringAccessError> {
        if !self.use_keyring {
            return Ok(None);
        }
        match Self::entry(server_url)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Token to use for requests to `server_url`.
    ///
    /// A temporarily unavailable keyring is logged and treated as "no token"
    /// so read-only use keeps working.
    pub fn resolve(
        &self,
        server_url: &str,
    ) -> Result<Option<(String, TokenSource)>, KeyringAccessError> {
        let from_env = std::env::var(TOKEN_ENV).ok();
        self.resolve_with_env(server_url, from_env.as_deref())
    }

    pub(crate) fn resolve_with_env(
        &self,
        server_url: &str,
        env_value: Option<&str>,
    ) -> Result<Option<(String, TokenSource)>, KeyringAccessError> {
        if let Some(token) = env_value.map(str::trim).filter(|token| !token.is_empty()) {
            return Ok(Some((token.to_string(), TokenSource::Environment)));
        }

        match self.lookup(server_url) {
            Ok(token) => Ok(token.map(|token| (token, TokenSource::Keyring))),
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "continuing without a stored token");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}
