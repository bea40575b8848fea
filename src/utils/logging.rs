//! Diagnostic logging setup for the binary.
//!
//! Output goes to stderr so it never mixes with transcripts printed on
//! stdout. The filter comes from `CHATDECK_LOG`, then the `log-filter`
//! config key, then [`DEFAULT_LOG_FILTER`].

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_ENV: &str = "CHATDECK_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Pick the filter directive, first non-blank wins.
pub fn resolve_filter(env_value: Option<&str>, configured: Option<&str>) -> String {
    [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|directive| !directive.is_empty())
        .unwrap_or(DEFAULT_LOG_FILTER)
        .to_string()
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_tracing(configured: Option<&str>) {
    let from_env = std::env::var(LOG_ENV).ok();
    let directive = resolve_filter(from_env.as_deref(), configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log filter '{directive}': {err}");
        EnvFilter::new(DEFAULT_LOG_FILTER)
    });

    let subscriber = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
        .with(filter);

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::debug!(filter = %directive, "tracing initialized");
    }
}
