use std::env;
use std::sync::{Mutex, OnceLock};

use folio_cli::commands::{config, doctor, migrate, user};
use serde_json::Value;

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[("FOLIO_DATABASE_URL", "sqlite::memory:")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn migrate_returns_config_failure_for_non_sqlite_url() {
    with_env(&[("FOLIO_DATABASE_URL", "postgres://localhost/folio")], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn user_add_creates_account_once() {
    let dir = tempfile::tempdir().expect("temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("folio.db").display());

    with_env(&[("FOLIO_DATABASE_URL", url.as_str())], || {
        let created = user::add("Ada@Example.com", "Ada", "correct horse");
        assert_eq!(created.exit_code, 0, "unexpected output: {}", created.output);
        let payload = parse_payload(&created.output);
        assert_eq!(payload["command"], "user.add");
        assert!(payload["message"].as_str().unwrap_or_default().contains("ada@example.com"));

        let duplicate = user::add("ada@example.com", "Ada again", "another password");
        assert_eq!(duplicate.exit_code, 7);
        assert_eq!(parse_payload(&duplicate.output)["error_class"], "email_taken");
    });
}

#[test]
fn user_add_rejects_short_password_before_touching_the_database() {
    with_env(&[("FOLIO_DATABASE_URL", "postgres://not-used")], || {
        let result = user::add("ada@example.com", "Ada", "short");
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "input_validation");
    });
}

#[test]
fn user_add_counts_password_characters_not_bytes() {
    with_env(&[("FOLIO_DATABASE_URL", "postgres://not-used")], || {
        let seven_chars = "pässwö!";
        assert!(seven_chars.len() >= 8);

        let result = user::add("ada@example.com", "Ada", seven_chars);
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "input_validation");
    });
}

#[test]
fn doctor_warns_without_generation_key() {
    with_env(&[("FOLIO_DATABASE_URL", "sqlite::memory:")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 0, "warnings are not failures");

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "warn");
        let checks = report["checks"].as_array().expect("checks array");
        let credential = checks
            .iter()
            .find(|check| check["name"] == "generation_credential")
            .expect("credential check");
        assert_eq!(credential["status"], "warn");
        let database = checks
            .iter()
            .find(|check| check["name"] == "database_connectivity")
            .expect("database check");
        assert_eq!(database["status"], "pass");
    });
}

#[test]
fn doctor_fails_on_invalid_config() {
    with_env(&[("FOLIO_LLM_TIMEOUT_SECS", "0")], || {
        let result = doctor::run(true);
        assert_eq!(result.exit_code, 1);

        let report = parse_payload(&result.output);
        assert_eq!(report["overall_status"], "fail");
        assert_eq!(report["checks"][0]["name"], "config_validation");
        assert_eq!(report["checks"][0]["status"], "fail");
    });
}

#[test]
fn config_redacts_api_key_and_names_its_source() {
    with_env(&[("GEMINI_API_KEY", "AIzaSyExampleSecretKey9876")], || {
        let output = config::run();
        assert!(!output.contains("AIzaSyExampleSecretKey9876"));
        assert!(output.contains("- llm.api_key = ***9876 (source: env (GEMINI_API_KEY))"));
        assert!(output.contains("- llm.model = gemini-1.5-flash (source: default)"));
    });
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid JSON")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "FOLIO_DATABASE_URL",
        "FOLIO_DATABASE_MAX_CONNECTIONS",
        "FOLIO_DATABASE_TIMEOUT_SECS",
        "FOLIO_LLM_API_KEY",
        "GEMINI_API_KEY",
        "FOLIO_LLM_BASE_URL",
        "FOLIO_LLM_MODEL",
        "FOLIO_LLM_TIMEOUT_SECS",
        "FOLIO_SERVER_BIND_ADDRESS",
        "FOLIO_SERVER_PORT",
        "FOLIO_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "FOLIO_AUTH_SESSION_TTL_HOURS",
        "FOLIO_AUTH_COOKIE_NAME",
        "FOLIO_AUTH_SECURE_COOKIES",
        "FOLIO_LOGGING_LEVEL",
        "FOLIO_LOGGING_FORMAT",
        "FOLIO_LOG_LEVEL",
        "FOLIO_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
