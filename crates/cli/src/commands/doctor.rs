use serde::Serialize;
use storefront_artifacts::{load_all, ArtifactKind, ArtifactOutcome, ArtifactStatus};
use storefront_core::config::{AppConfig, LoadOptions};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(options: &LoadOptions, json_output: bool) -> String {
    let report = build_report(options);

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation".to_string(),
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let (_, report) = load_all(&config.artifacts);
            checks.extend(report.outcomes.iter().map(artifact_check));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation".to_string(),
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(ArtifactKind::ALL.iter().map(|kind| DoctorCheck {
                name: check_name(*kind),
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

fn check_name(kind: ArtifactKind) -> String {
    format!("artifact_{}", kind.as_str())
}

fn artifact_check(outcome: &ArtifactOutcome) -> DoctorCheck {
    let path = outcome.path.display();
    let (status, details) = match &outcome.status {
        ArtifactStatus::Loaded { records } => {
            (CheckStatus::Pass, format!("loaded {records} records from `{path}`"))
        }
        ArtifactStatus::Missing => {
            (CheckStatus::Fail, format!("`{path}` not found; serving an empty table"))
        }
        ArtifactStatus::Failed { error } => (CheckStatus::Fail, error.clone()),
    };

    DoctorCheck { name: check_name(outcome.kind), status, details }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

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

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
