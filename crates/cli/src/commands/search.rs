use serde::Serialize;
use storefront_core::config::LoadOptions;

use super::{item_views, prepare, CommandResult, ItemView};

#[derive(Debug, Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    items: Vec<ItemView>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    degraded: Vec<&'static str>,
}

pub fn run(options: &LoadOptions, query: &str, limit: Option<usize>) -> CommandResult {
    let prepared = match prepare("search", options) {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };
    let context = &prepared.context;

    let limit = match context.resolve_limit(limit, context.settings().search_limit) {
        Ok(limit) => limit,
        Err(error) => return CommandResult::invalid_input("search", error),
    };

    let items = context.search(query, limit);
    CommandResult::success_with(
        "search",
        prepared.annotate(format!("{} matches", items.len())),
        SearchOutput {
            query,
            items: item_views(context, &items),
            degraded: prepared.degraded.clone(),
        },
    )
}
