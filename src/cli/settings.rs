//! `set` and `unset` subcommands.

use std::error::Error;

use crate::core::config::data::path_display;
use crate::core::config::{ConfigError, ConfigKey, ConfigOrchestrator};

fn parse_key(raw: &str) -> Result<ConfigKey, ConfigError> {
    raw.parse::<ConfigKey>().map_err(ConfigError::UnknownKey)
}

/// `set` with no key prints the whole config; with a key but no value it
/// prints that key.
pub fn run_set(
    orchestrator: &ConfigOrchestrator,
    key: Option<String>,
    value: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let Some(raw_key) = key else {
        let config = orchestrator.load_with_cache()?;
        config.print_all();
        println!("\nConfig file: {}", path_display(orchestrator.path()));
        return Ok(());
    };

    let key = parse_key(&raw_key)?;

    if value.is_empty() {
        let config = orchestrator.load_with_cache()?;
        match config.display_value(key) {
            Some(current) => println!("{key}: {current}"),
            None => println!("{key}: (unset)"),
        }
        return Ok(());
    }

    let value = value.join(" ");
    orchestrator.mutate(|config| config.set_value(key, &value))?;
    let stored = orchestrator
        .load_with_cache()?
        .display_value(key)
        .unwrap_or(value);
    println!("✅ Set {key} to: {stored}");
    Ok(())
}

pub fn run_unset(orchestrator: &ConfigOrchestrator, raw_key: &str) -> Result<(), Box<dyn Error>> {
    let key = parse_key(raw_key)?;
    orchestrator.mutate(|config| {
        config.unset_value(key);
        Ok(())
    })?;
    println!("✅ Unset {key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::TempDir;

    #[test]
    fn set_then_unset_round_trips_through_the_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        let orchestrator = ConfigOrchestrator::new(path.clone());

        run_set(
            &orchestrator,
            Some("recent_limit".to_string()),
            vec!["20".to_string()],
        )
        .unwrap();
        assert_eq!(Config::load_from_path(&path).unwrap().recent_limit, Some(20));

        run_unset(&orchestrator, "recent-limit").unwrap();
        assert_eq!(Config::load_from_path(&path).unwrap().recent_limit, None);
    }

    #[test]
    fn unknown_key_is_rejected_without_writing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        let orchestrator = ConfigOrchestrator::new(path.clone());

        let err = run_set(
            &orchestrator,
            Some("theme".to_string()),
            vec!["dark".to_string()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("theme"));
        assert!(!path.exists());
    }

    #[test]
    fn multi_word_values_are_joined() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("config.toml");
        let orchestrator = ConfigOrchestrator::new(path.clone());

        run_set(
            &orchestrator,
            Some("log-filter".to_string()),
            vec!["chatdeck=debug,".to_string(), "reqwest=warn".to_string()],
        )
        .unwrap();
        assert_eq!(
            Config::load_from_path(&path).unwrap().log_filter.as_deref(),
            Some("chatdeck=debug, reqwest=warn")
        );
    }
}
