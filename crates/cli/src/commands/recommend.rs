use serde::Serialize;
use storefront_core::config::LoadOptions;
use storefront_core::validate_user_id;

use super::{item_views, prepare, CommandResult, ItemView};

#[derive(Debug, Serialize)]
struct RecommendOutput<'a> {
    user_id: &'a str,
    source: &'static str,
    items: Vec<ItemView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<&'static str>,
}

pub fn run(options: &LoadOptions, user_id: &str, limit: Option<usize>) -> CommandResult {
    let prepared = match prepare("recommend", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let context = &prepared.context;

    let user_id = match validate_user_id(user_id) {
        Ok(user_id) => user_id,
        Err(error) => return CommandResult::invalid_input("recommend", error),
    };
    let limit = match context.resolve_limit(limit, context.settings().default_limit) {
        Ok(limit) => limit,
        Err(error) => return CommandResult::invalid_input("recommend", error),
    };

    let resolved = context.recommend(user_id, limit);
    CommandResult::success_with(
        "recommend",
        prepared.annotate(format!(
            "{} recommendations from {}",
            resolved.items.len(),
            resolved.source.as_str()
        )),
        RecommendOutput {
            user_id,
            source: resolved.source.as_str(),
            items: item_views(context, &resolved.items),
            degraded: prepared.degraded.clone(),
        },
    )
}
