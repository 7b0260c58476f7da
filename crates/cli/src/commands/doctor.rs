use folio_core::config::{AppConfig, LoadOptions};
use folio_db::{connect_with_settings, migrations::MIGRATOR};
use serde::Serialize;

use crate::commands::CommandResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Fail { 1 } else { 0 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_generation_credential(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["generation_credential", "database_connectivity", "database_schema"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let any_warn = checks.iter().any(|check| check.status == CheckStatus::Warn);
    let (overall_status, summary) = match (any_fail, any_warn) {
        (true, _) => (CheckStatus::Fail, "doctor: one or more readiness checks failed"),
        (false, true) => (CheckStatus::Warn, "doctor: ready with warnings"),
        (false, false) => (CheckStatus::Pass, "doctor: all readiness checks passed"),
    };

    DoctorReport { overall_status, summary: summary.to_string(), checks }
}

fn check_generation_credential(config: &AppConfig) -> DoctorCheck {
    if config.llm.has_api_key() {
        DoctorCheck {
            name: "generation_credential",
            status: CheckStatus::Pass,
            details: format!("api key configured for model `{}`", config.llm.model),
        }
    } else {
        DoctorCheck {
            name: "generation_credential",
            status: CheckStatus::Warn,
            details: "no api key; set FOLIO_LLM_API_KEY or GEMINI_API_KEY before generating"
                .to_string(),
        }
    }
}

fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            }];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck {
                        name: "database_schema",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database is unreachable".to_string(),
                    },
                ];
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        };
        let schema = check_schema(&pool).await;
        pool.close().await;
        vec![connectivity, schema]
    })
}

async fn check_schema(pool: &folio_db::DbPool) -> DoctorCheck {
    let known = MIGRATOR.iter().count() as i64;
    let applied = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = 1",
    )
    .fetch_one(pool)
    .await;

    match applied {
        Ok(applied) if applied >= known => DoctorCheck {
            name: "database_schema",
            status: CheckStatus::Pass,
            details: format!("{applied} of {known} migrations applied"),
        },
        Ok(applied) => DoctorCheck {
            name: "database_schema",
            status: CheckStatus::Warn,
            details: format!("{applied} of {known} migrations applied; run `folio migrate`"),
        },
        Err(_) => DoctorCheck {
            name: "database_schema",
            status: CheckStatus::Warn,
            details: "no migrations applied yet; run `folio migrate`".to_string(),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
