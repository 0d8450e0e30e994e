//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::Settings;
use anyhow::{anyhow, bail, Result};
use std::path::PathBuf;

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: PathBuf) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut shown = settings;
            if let Some(key) = shown.api.api_key.as_mut() {
                *key = mask(key);
            }
            let toml_str = toml::to_string_pretty(&shown)
                .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path)?;
            Output::success(&format!("Set {} in {}", key, config_path.display()));
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Return a copy of `settings` with `key` (`section.field`) set to `value`.
///
/// `value` is read as a TOML literal when it parses as one, otherwise as a
/// plain string.
fn set_value(settings: &Settings, key: &str, value: &str) -> Result<Settings> {
    let (section, field) = key
        .split_once('.')
        .ok_or_else(|| anyhow!("Key must look like section.field, got '{}'", key))?;

    let mut root = toml::Value::try_from(settings)?;
    let table = root
        .get_mut(section)
        .and_then(|v| v.as_table_mut())
        .ok_or_else(|| anyhow!("Unknown config section '{}'", section))?;

    let parsed = toml::from_str::<toml::Table>(&format!("v = {}", value))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(value.to_string()));
    table.insert(field.to_string(), parsed);

    let updated: Settings = root
        .try_into()
        .map_err(|e| anyhow!("Invalid value for {}: {}", key, e))?;

    // Unknown fields are dropped on deserialization; catch typos here.
    let check = toml::Value::try_from(&updated)?;
    let known = check
        .get(section)
        .and_then(|v| v.as_table())
        .is_some_and(|t| t.contains_key(field));
    if !known {
        bail!("Unknown config key '{}'", key);
    }

    Ok(updated)
}

fn mask(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
