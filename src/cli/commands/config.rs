//! Config command implementation.

use crate::cli::{ConfigAction, Output};
use crate::config::{mask, Settings};
use anyhow::{bail, Context, Result};
use std::path::Path;
use toml::{Table, Value};

/// Run the config command against the file at `config_path`.
pub fn run_config(action: &ConfigAction, settings: Settings, config_path: &Path) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&masked(settings))
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Set { key, value } => {
            let updated = set_value(&settings, key, value)?;
            updated.save_to(&config_path.to_path_buf())?;
            Output::success(&format!("Set {} in {}", key, config_path.display()));
        }

        ConfigAction::Edit => {
            // Create default config if it doesn't exist
            if !config_path.exists() {
                settings.save_to(&config_path.to_path_buf())?;
                Output::info(&format!("Created default config at {:?}", config_path));
            }

            let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vim".to_string());

            Output::info(&format!("Opening config in {}...", editor));

            let status = std::process::Command::new(&editor)
                .arg(config_path)
                .status();

            match status {
                Ok(s) if s.success() => {
                    Output::success("Config saved.");
                }
                Ok(_) => {
                    Output::warning("Editor exited with non-zero status.");
                }
                Err(e) => {
                    Output::error(&format!("Failed to open editor: {}", e));
                    Output::info(&format!("Config file is at: {:?}", config_path));
                }
            }
        }

        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}

/// Replace secret values with their masked form for display.
fn masked(mut settings: Settings) -> Settings {
    settings.openai.api_key = settings.openai.api_key.as_deref().map(mask);
    settings.pinecone.api_key = settings.pinecone.api_key.as_deref().map(mask);
    settings
}

/// Set a dotted key such as `retrieval.top_k` and return the validated result.
///
/// The value is read as a TOML literal when possible (`5`, `true`, `0.2`),
/// otherwise as a plain string.
fn set_value(settings: &Settings, key: &str, raw: &str) -> Result<Settings> {
    let mut root = match Value::try_from(settings).context("Failed to serialize config")? {
        Value::Table(table) => table,
        _ => bail!("Config did not serialize to a table"),
    };

    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.trim().is_empty()) {
        bail!("Invalid config key: {:?}", key);
    }
    let (field, sections) = match segments.split_last() {
        Some(split) => split,
        None => bail!("Invalid config key: {:?}", key),
    };

    let mut table = &mut root;
    for section in sections {
        table = match table.get_mut(*section) {
            Some(Value::Table(inner)) => inner,
            _ => bail!("Unknown config section: {}", section),
        };
    }

    table.insert(field.to_string(), parse_value(raw));

    let updated: Settings = Value::Table(root)
        .try_into()
        .with_context(|| format!("Invalid value for {}: {}", key, raw))?;
    Ok(updated)
}

fn parse_value(raw: &str) -> Value {
    format!("v = {}", raw)
        .parse::<Table>()
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| Value::String(raw.to_string()))
}
