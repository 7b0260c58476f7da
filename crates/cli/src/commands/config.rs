use std::env;
use std::fs;
use std::path::Path;

use folio_core::config::{resolve_config_path, AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let api_key =
        config.llm.api_key.as_ref().map(|key| redact_secret(key.expose_secret())).unwrap_or_else(
            || "<unset>".to_string(),
        );

    let entries: Vec<(&str, String, Vec<&str>)> = vec![
        ("database.url", config.database.url.clone(), vec!["FOLIO_DATABASE_URL"]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            vec!["FOLIO_DATABASE_MAX_CONNECTIONS"],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            vec!["FOLIO_DATABASE_TIMEOUT_SECS"],
        ),
        ("llm.api_key", api_key, vec!["FOLIO_LLM_API_KEY", "GEMINI_API_KEY"]),
        ("llm.base_url", config.llm.base_url.clone(), vec!["FOLIO_LLM_BASE_URL"]),
        ("llm.model", config.llm.model.clone(), vec!["FOLIO_LLM_MODEL"]),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), vec!["FOLIO_LLM_TIMEOUT_SECS"]),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            vec!["FOLIO_SERVER_BIND_ADDRESS"],
        ),
        ("server.port", config.server.port.to_string(), vec!["FOLIO_SERVER_PORT"]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            vec!["FOLIO_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        (
            "auth.session_ttl_hours",
            config.auth.session_ttl_hours.to_string(),
            vec!["FOLIO_AUTH_SESSION_TTL_HOURS"],
        ),
        ("auth.cookie_name", config.auth.cookie_name.clone(), vec!["FOLIO_AUTH_COOKIE_NAME"]),
        (
            "auth.secure_cookies",
            config.auth.secure_cookies.to_string(),
            vec!["FOLIO_AUTH_SECURE_COOKIES"],
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            vec!["FOLIO_LOGGING_LEVEL", "FOLIO_LOG_LEVEL"],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            vec!["FOLIO_LOGGING_FORMAT", "FOLIO_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(entries.iter().map(|(key, value, env_keys)| {
        let source = field_source(
            key,
            env_keys,
            config_file_doc.as_ref(),
            config_file_path.as_deref(),
        );
        render_line(key, value, source)
    }));
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps the last four characters so operators can tell keys apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() <= 8 {
        return "<redacted>".to_string();
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("***{tail}")
}
