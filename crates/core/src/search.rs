use crate::catalog::Catalog;
use crate::ids::ItemId;

/// Catalog items whose search text contains `query` (case-insensitive), in stored
/// order. A blank query matches nothing.
pub fn search(catalog: &Catalog, query: &str, limit: usize) -> Vec<ItemId> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    catalog
        .iter_with_search_text()
        .filter(|(_, text)| text.contains(&needle))
        .take(limit)
        .map(|(product, _)| product.id.clone())
        .collect()
}
