//! Doctor command - verify secrets and configuration.

use crate::cli::Output;
use crate::config::{mask, Settings, OPENAI_API_KEY, PINECONE_API_ENV, PINECONE_API_KEY};
use crate::rag::MAX_TOP_K;
use console::style;
use std::path::Path;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Mort Doctor");
    println!();
    println!("Checking secrets and configuration...\n");

    let lookup = |name: &str| std::env::var(name).ok();
    let mut checks = Vec::new();

    println!("{}", style("Secrets").bold());
    let secret_checks = check_secrets(settings, lookup);
    for check in &secret_checks {
        check.print();
    }
    checks.extend(secret_checks);

    println!();

    println!("{}", style("Knowledge Base").bold());
    let index_checks = check_index(settings);
    for check in &index_checks {
        check.print();
    }
    checks.extend(index_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(config_path), check_prompts_dir(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Mort.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Mort is ready to use.");
    }

    Ok(())
}

/// Check each secret, reporting where it was found.
fn check_secrets<F>(settings: &Settings, lookup: F) -> Vec<CheckResult>
where
    F: Fn(&str) -> Option<String>,
{
    let sources = [
        (OPENAI_API_KEY, settings.openai.api_key.as_deref(), "openai.api_key", true),
        (PINECONE_API_KEY, settings.pinecone.api_key.as_deref(), "pinecone.api_key", true),
        (PINECONE_API_ENV, settings.pinecone.environment.as_deref(), "pinecone.environment", false),
    ];

    sources
        .iter()
        .map(|&(name, from_config, key, secret)| {
            let shown = |v: &str| if secret { mask(v) } else { v.to_string() };
            match lookup(name).filter(|v| !v.trim().is_empty()) {
                Some(value) => CheckResult::ok(name, &format!("set in environment ({})", shown(&value))),
                None => match from_config.filter(|v| !v.trim().is_empty()) {
                    Some(value) => CheckResult::ok(name, &format!("set in config as {} ({})", key, shown(value))),
                    None => CheckResult::error(
                        name,
                        "not set",
                        &format!("Set with: export {}='...' (or mort config set {} ...)", name, key),
                    ),
                },
            }
        })
        .collect()
}

/// Check the index and retrieval settings.
fn check_index(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let index_name = settings.pinecone.index_name.trim();
    if index_name.is_empty() {
        results.push(CheckResult::error(
            "Index",
            "pinecone.index_name is empty",
            "Set with: mort config set pinecone.index_name <name>",
        ));
    } else {
        results.push(CheckResult::ok("Index", index_name));
    }

    match settings.pinecone.host.as_deref().filter(|h| !h.trim().is_empty()) {
        Some(host) => results.push(CheckResult::ok("Index host", host)),
        None => results.push(CheckResult::ok("Index host", "resolved from the controller at startup")),
    }

    if settings.retrieval.top_k == 0 || settings.retrieval.top_k > MAX_TOP_K {
        results.push(CheckResult::error(
            "top_k",
            &format!("must be between 1 and {}", MAX_TOP_K),
            "Set with: mort config set retrieval.top_k 10",
        ));
    } else {
        results.push(CheckResult::ok("top_k", &settings.retrieval.top_k.to_string()));
    }

    if settings.retry.max_attempts == 0 {
        results.push(CheckResult::warning(
            "Retries",
            "max_attempts is 0, treated as 1",
            "Set with: mort config set retry.max_attempts 3",
        ));
    } else {
        results.push(CheckResult::ok(
            "Retries",
            &format!(
                "{} attempt(s), {} backoff from {} ms",
                settings.retry.max_attempts, settings.retry.backoff, settings.retry.delay_ms
            ),
        ));
    }

    results
}

/// Check if the config file exists.
fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: mort config edit",
        )
    }
}

/// Check the custom prompts directory, if one is configured.
fn check_prompts_dir(settings: &Settings) -> CheckResult {
    match settings.prompts.custom_dir.as_deref() {
        None => CheckResult::ok("Prompts", "built-in"),
        Some(dir) => {
            let path = Settings::expand_path(dir);
            if path.join("qa.toml").exists() {
                CheckResult::ok("Prompts", &format!("{}", path.display()))
            } else {
                CheckResult::warning(
                    "Prompts",
                    &format!("{} has no qa.toml", path.display()),
                    "Built-in prompts will be used",
                )
            }
        }
    }
}
