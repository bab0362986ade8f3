use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use procura_core::config::AppConfig;
use secrecy::ExposeSecret;
use toml::Value;

use crate::commands::{load_config, CommandResult};

const UNSET: &str = "<unset>";

/// Prints each effective setting with where it came from. Secrets are masked.
pub fn run() -> CommandResult {
    let config = match load_config() {
        Ok(config) => config,
        Err(failure) => return CommandResult::from_failure("config", failure),
    };

    let file_path = detect_config_path();
    let file_doc = file_path.as_deref().and_then(load_config_file_doc);
    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];

    for (key, value) in effective_values(&config) {
        let source = field_source(key, file_doc.as_ref(), file_path.as_deref());
        lines.push(format!("- {key} = {value} (source: {source})"));
    }

    CommandResult { exit_code: 0, output: lines.join("\n") }
}

fn effective_values(config: &AppConfig) -> Vec<(&'static str, String)> {
    let optional = |value: Option<&String>| value.cloned().unwrap_or_else(|| UNSET.to_string());
    let api_key = config
        .llm
        .api_key
        .as_ref()
        .map(|key| redact_token(key.expose_secret()))
        .unwrap_or_else(|| UNSET.to_string());

    vec![
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("llm.api_key", api_key),
        ("llm.base_url", optional(config.llm.base_url.as_ref())),
        ("llm.model", config.llm.model.clone()),
        ("llm.compare_model", optional(config.llm.compare_model.as_ref())),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string()),
        ("mail.relay_url", optional(config.mail.relay_url.as_ref())),
        ("mail.simulate_replies", config.mail.simulate_replies.to_string()),
        ("mail.timeout_secs", config.mail.timeout_secs.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format).to_lowercase()),
    ]
}

fn detect_config_path() -> Option<PathBuf> {
    [PathBuf::from("procura.toml"), PathBuf::from("config/procura.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn load_config_file_doc(path: &Path) -> Option<Value> {
    fs::read_to_string(path).ok()?.parse::<Value>().ok()
}

/// `llm.model` reads `PROCURA_LLM_MODEL`; logging also accepts the short `PROCURA_LOG_*` names.
fn env_keys(key_path: &str) -> Vec<String> {
    let primary = format!("PROCURA_{}", key_path.replace('.', "_").to_uppercase());
    match key_path {
        "logging.level" => vec![primary, "PROCURA_LOG_LEVEL".to_string()],
        "logging.format" => vec![primary, "PROCURA_LOG_FORMAT".to_string()],
        _ => vec![primary],
    }
}

fn field_source(key_path: &str, file_doc: Option<&Value>, file_path: Option<&Path>) -> String {
    if let Some(env_key) = env_keys(key_path).into_iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if file_doc.is_some_and(|doc| contains_path(doc, key_path)) {
        let file_path = file_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "config file".to_string());
        return format!("file ({file_path})");
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
