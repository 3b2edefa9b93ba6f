use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::commands::{CommandResult, EXIT_CONFIG, EXIT_FAILURE};
use serde::Serialize;
use storefront_artifacts::SharedArtifacts;
use storefront_core::config::{AppConfig, LoadOptions};
use storefront_core::ids::ItemId;
use storefront_core::RecommendationContext;

const SMOKE_USER: &str = "storefront-smoke-user";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum SmokeStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct SmokeCheck {
    name: &'static str,
    status: SmokeStatus,
    elapsed_ms: u64,
    message: String,
}

#[derive(Debug, Serialize)]
struct SmokeReport {
    command: &'static str,
    status: SmokeStatus,
    summary: String,
    total_elapsed_ms: u64,
    checks: Vec<SmokeCheck>,
}

pub fn run(options: &LoadOptions) -> CommandResult {
    let started = Instant::now();
    let mut checks = Vec::new();

    let config = match timed_check(|| AppConfig::load(options.clone())) {
        Ok((elapsed_ms, config)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Pass,
                elapsed_ms,
                message: "configuration loaded and validated".to_string(),
            });
            config
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "config_validation",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            for name in ["artifact_load", "recommend", "also_bought", "search"] {
                checks.push(skipped(name));
            }
            return finalize_report(checks, elapsed_since(started), EXIT_CONFIG);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            checks.push(SmokeCheck {
                name: "artifact_load",
                status: SmokeStatus::Fail,
                elapsed_ms: 0,
                message: format!("failed to initialize async runtime: {error}"),
            });
            for name in ["recommend", "also_bought", "search"] {
                checks.push(skipped(name));
            }
            return finalize_report(checks, elapsed_since(started), EXIT_FAILURE);
        }
    };

    let shared = SharedArtifacts::new(config.artifacts.clone());
    let loaded = match timed_check(|| runtime.block_on(shared.get())) {
        Ok((elapsed_ms, loaded)) => {
            let degraded: Vec<&str> =
                loaded.report.degraded().map(|outcome| outcome.kind.as_str()).collect();
            checks.push(SmokeCheck {
                name: "artifact_load",
                status: if loaded.artifacts.catalog.is_empty() {
                    SmokeStatus::Fail
                } else {
                    SmokeStatus::Pass
                },
                elapsed_ms,
                message: if degraded.is_empty() {
                    "all artifacts loaded".to_string()
                } else {
                    format!("serving empty tables for: {}", degraded.join(", "))
                },
            });
            loaded
        }
        Err((elapsed_ms, error)) => {
            checks.push(SmokeCheck {
                name: "artifact_load",
                status: SmokeStatus::Fail,
                elapsed_ms,
                message: error.to_string(),
            });
            for name in ["recommend", "also_bought", "search"] {
                checks.push(skipped(name));
            }
            return finalize_report(checks, elapsed_since(started), EXIT_FAILURE);
        }
    };

    let context = RecommendationContext::new(Arc::clone(&loaded.artifacts), config.recommend);
    let settings = context.settings().clone();

    let recommend_started = Instant::now();
    let recommended = context.recommend(SMOKE_USER, settings.default_limit);
    checks.push(list_check(
        "recommend",
        &recommended.items,
        settings.default_limit,
        recommend_started,
        recommended.source.as_str(),
    ));

    let also_bought_started = Instant::now();
    let expanded = context.also_bought(SMOKE_USER, settings.also_bought_limit);
    checks.push(list_check(
        "also_bought",
        &expanded.items,
        settings.also_bought_limit,
        also_bought_started,
        expanded.source.as_str(),
    ));

    let sample_query = context
        .artifacts()
        .catalog
        .iter()
        .find_map(|product| product.search_text().split_whitespace().next().map(str::to_owned));
    match sample_query {
        Some(query) => {
            let search_started = Instant::now();
            let matches = context.search(&query, settings.search_limit);
            checks.push(SmokeCheck {
                name: "search",
                status: if matches.is_empty() { SmokeStatus::Fail } else { SmokeStatus::Pass },
                elapsed_ms: elapsed_since(search_started),
                message: format!("query `{query}` matched {} items", matches.len()),
            });
        }
        None => checks.push(skipped("search")),
    }

    finalize_report(checks, elapsed_since(started), EXIT_FAILURE)
}

fn list_check(
    name: &'static str,
    items: &[ItemId],
    limit: usize,
    started: Instant,
    source: &str,
) -> SmokeCheck {
    let unique = items.iter().collect::<HashSet<_>>().len() == items.len();
    let bounded = items.len() <= limit;
    let passed = unique && bounded && !items.is_empty();

    SmokeCheck {
        name,
        status: if passed { SmokeStatus::Pass } else { SmokeStatus::Fail },
        elapsed_ms: elapsed_since(started),
        message: format!("{} items from {source} (limit {limit})", items.len()),
    }
}

fn timed_check<T, E>(check: impl FnOnce() -> Result<T, E>) -> Result<(u64, T), (u64, E)> {
    let started = Instant::now();
    match check() {
        Ok(value) => Ok((elapsed_since(started), value)),
        Err(error) => Err((elapsed_since(started), error)),
    }
}

fn elapsed_since(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn skipped(name: &'static str) -> SmokeCheck {
    SmokeCheck {
        name,
        status: SmokeStatus::Skipped,
        elapsed_ms: 0,
        message: "skipped due previous failure".to_string(),
    }
}

fn finalize_report(checks: Vec<SmokeCheck>, total_elapsed_ms: u64, failure_code: u8) -> CommandResult {
    let passed = checks.iter().filter(|check| check.status == SmokeStatus::Pass).count();
    let total = checks.len();
    let failed = checks.iter().any(|check| check.status == SmokeStatus::Fail);

    let report = SmokeReport {
        command: "smoke",
        status: if failed { SmokeStatus::Fail } else { SmokeStatus::Pass },
        summary: format!("smoke: {passed}/{total} checks passed in {total_elapsed_ms}ms"),
        total_elapsed_ms,
        checks,
    };

    let human = report.summary.clone();
    let machine = serde_json::to_string(&report).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"smoke\",\"status\":\"fail\",\"summary\":\"serialization failed\",\"error\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    });

    CommandResult {
        exit_code: if failed { failure_code } else { 0 },
        output: format!("{human}\n{machine}"),
    }
}
