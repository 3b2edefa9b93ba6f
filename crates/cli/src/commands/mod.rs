pub mod also_bought;
pub mod config;
pub mod doctor;
pub mod recommend;
pub mod search;
pub mod smoke;

use serde::Serialize;
use serde_json::Value;
use storefront_artifacts::load_all;
use storefront_core::config::{AppConfig, LoadOptions};
use storefront_core::errors::DomainError;
use storefront_core::ids::ItemId;
use storefront_core::RecommendationContext;

pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG: u8 = 2;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, Value::Null)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: impl Serialize) -> Self {
        let data = serde_json::to_value(data).ok().filter(|value| !value.is_null());
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    fn invalid_input(command: &str, error: DomainError) -> Self {
        Self::failure(command, "invalid_input", error.to_string(), EXIT_FAILURE)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// A loaded context plus the artifacts that failed to load or were missing.
struct Prepared {
    context: RecommendationContext,
    degraded: Vec<&'static str>,
}

impl Prepared {
    /// Append the degraded artifacts so a wrong artifact dir is visible on success.
    fn annotate(&self, message: String) -> String {
        if self.degraded.is_empty() {
            message
        } else {
            format!("{message} (serving empty tables for: {})", self.degraded.join(", "))
        }
    }
}

/// Load config and artifacts for a query command.
fn prepare(command: &str, options: &LoadOptions) -> Result<Prepared, CommandResult> {
    let config = AppConfig::load(options.clone()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            EXIT_CONFIG,
        )
    })?;

    let (artifacts, report) = load_all(&config.artifacts);
    let degraded = report.degraded().map(|outcome| outcome.kind.as_str()).collect();
    Ok(Prepared { context: RecommendationContext::new(artifacts.into(), config.recommend), degraded })
}

#[derive(Debug, Serialize)]
struct ItemView {
    item_id: String,
    name: Option<String>,
}

fn item_views(context: &RecommendationContext, items: &[ItemId]) -> Vec<ItemView> {
    items
        .iter()
        .map(|item| ItemView {
            item_id: item.to_string(),
            name: context.product(item).map(|product| product.display_name()),
        })
        .collect()
}
