use procura_agent::ExtractionBackend;
use procura_core::config::AppConfig;
use procura_db::{connect_with_settings, ping};
use serde::Serialize;

use crate::commands::{load_config, runtime, CommandResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
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

const CHECKS_AFTER_CONFIG: [&str; 3] = ["extraction_backend", "mail_transport", "database_connectivity"];

pub fn run(json_output: bool) -> CommandResult {
    let report = build_report();
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match load_config() {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_extraction_backend(&config));
            checks.push(check_mail_transport(&config));
            checks.push(check_database_connectivity(&config));
        }
        Err((_, message, _)) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: message,
            });
            checks.extend(CHECKS_AFTER_CONFIG.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_extraction_backend(config: &AppConfig) -> DoctorCheck {
    match ExtractionBackend::from_config(&config.llm) {
        Ok(ExtractionBackend::Mock) => DoctorCheck {
            name: "extraction_backend",
            status: CheckStatus::Pass,
            details: "mock backend (no llm.api_key configured)".to_string(),
        },
        Ok(backend @ ExtractionBackend::Model { .. }) => DoctorCheck {
            name: "extraction_backend",
            status: CheckStatus::Pass,
            details: format!("{} backend using `{}`", backend.label(), config.llm.model),
        },
        Err(error) => DoctorCheck {
            name: "extraction_backend",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_mail_transport(config: &AppConfig) -> DoctorCheck {
    match procura_mail::transport_from_config(&config.mail) {
        Ok((_, label)) => DoctorCheck {
            name: "mail_transport",
            status: CheckStatus::Pass,
            details: format!("{label} transport selected"),
        },
        Err(error) => DoctorCheck {
            name: "mail_transport",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

fn check_database_connectivity(config: &AppConfig) -> DoctorCheck {
    let result = runtime().map_err(|(_, message, _)| message).and_then(|runtime| {
        runtime.block_on(async {
            let pool = connect_with_settings(
                &config.database.url,
                config.database.max_connections,
                config.database.timeout_secs,
            )
            .await
            .map_err(|error| format!("failed to connect to database: {error}"))?;
            let probe = ping(&pool).await.map_err(|error| format!("database probe failed: {error}"));
            pool.close().await;
            probe
        })
    });

    match result {
        Ok(()) => DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: format!("connected using `{}`", config.database.url),
        },
        Err(error) => {
            DoctorCheck { name: "database_connectivity", status: CheckStatus::Fail, details: error }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}
