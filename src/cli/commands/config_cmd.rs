//! config command - Show effective configuration values

use anyhow::{bail, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::config::Config;

/// Keys understood by `config get`, in `config list` order.
const KEYS: &[&str] = &[
    "store.provider",
    "store.owner",
    "store.repo",
    "store.branch",
    "store.api_base",
    "store.root",
    "retry.max_retries",
    "retry.backoff_base_ms",
    "secrets.provider",
];

/// Print one effective value; unset keys print nothing.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = load_config(ctx)?;
    match lookup(&config, key) {
        Some(Some(value)) => println!("{}", value),
        Some(None) => {}
        None => bail!(
            "Unknown configuration key: {} (known: {})",
            key,
            KEYS.join(", ")
        ),
    }
    Ok(())
}

/// Print every effective value.
pub fn list(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    for key in KEYS {
        let value = lookup(&config, key)
            .flatten()
            .unwrap_or_else(|| "(not set)".to_string());
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// Print the configuration files that were loaded.
pub fn path(ctx: &Context) -> Result<()> {
    let config = load_config(ctx)?;
    let show = |p: Option<&std::path::Path>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string())
    };
    println!("global = {}", show(config.global_config_loaded_from()));
    println!("project = {}", show(config.project_config_loaded_from()));
    Ok(())
}

/// `None` for an unknown key, `Some(None)` for a known key with no value.
fn lookup(config: &Config, key: &str) -> Option<Option<String>> {
    let store = config.effective().store.clone().unwrap_or_default();
    let retry = config.retry_policy();
    let value = match key {
        "store.provider" => Some(config.store_provider().to_string()),
        "store.owner" => store.owner,
        "store.repo" => store.repo,
        "store.branch" => store.branch,
        "store.api_base" => store.api_base,
        "store.root" => store.root,
        "retry.max_retries" => Some(retry.max_retries.to_string()),
        "retry.backoff_base_ms" => Some(retry.backoff_base_ms.to_string()),
        "secrets.provider" => Some(config.secrets_provider().to_string()),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigFile;

    fn config(toml: &str) -> Config {
        let file: ConfigFile = toml::from_str(toml).unwrap();
        Config::from_file(file, None).unwrap()
    }

    #[test]
    fn defaults_are_reported() {
        let config = config("");
        assert_eq!(
            lookup(&config, "store.provider"),
            Some(Some("disabled".into()))
        );
        assert_eq!(
            lookup(&config, "retry.max_retries"),
            Some(Some("3".into()))
        );
        assert_eq!(lookup(&config, "store.owner"), Some(None));
    }

    #[test]
    fn configured_values_win() {
        let config = config("[store]\nprovider = \"local\"\nroot = \"data\"\n[retry]\nbackoff_base_ms = 5\n");
        assert_eq!(lookup(&config, "store.root"), Some(Some("data".into())));
        assert_eq!(
            lookup(&config, "retry.backoff_base_ms"),
            Some(Some("5".into()))
        );
    }

    #[test]
    fn unknown_key() {
        assert_eq!(lookup(&config(""), "trunk.branch"), None);
    }

    #[test]
    fn every_listed_key_resolves() {
        let config = config("");
        for key in KEYS {
            assert!(lookup(&config, key).is_some(), "{}", key);
        }
    }
}
