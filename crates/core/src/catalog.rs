use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// Catalog attributes for a single article.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ItemId,
    pub product_name: String,
    pub prod_name: String,
    pub product_type_name: String,
    pub product_group_name: String,
    pub perceived_colour_master_name: String,
    pub colour: String,
    pub detail_desc: String,
    pub garment_group_name: String,
    pub price: Option<Decimal>,
}

impl Product {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            product_name: String::new(),
            prod_name: String::new(),
            product_type_name: String::new(),
            product_group_name: String::new(),
            perceived_colour_master_name: String::new(),
            colour: String::new(),
            detail_desc: String::new(),
            garment_group_name: String::new(),
            price: None,
        }
    }

    /// First non-empty of `product_name`, `prod_name`, else `Article {id}`.
    pub fn display_name(&self) -> String {
        [&self.product_name, &self.prod_name]
            .into_iter()
            .map(|name| name.trim())
            .find(|name| !name.is_empty())
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Article {}", self.id))
    }

    pub fn colour_name(&self) -> Option<&str> {
        let colour = self.perceived_colour_master_name.trim();
        (!colour.is_empty()).then_some(colour)
    }

    /// Lowercase concatenation of every text attribute, used for substring search.
    pub fn search_text(&self) -> String {
        [
            self.product_name.as_str(),
            self.prod_name.as_str(),
            self.product_type_name.as_str(),
            self.product_group_name.as_str(),
            self.perceived_colour_master_name.as_str(),
            self.colour.as_str(),
            self.detail_desc.as_str(),
            self.garment_group_name.as_str(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

#[derive(Clone, Debug)]
struct CatalogEntry {
    product: Product,
    search_text: String,
}

/// The product catalog in stored order. Stored order doubles as the popularity ranking.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<ItemId, usize>,
}

impl Catalog {
    /// Build a catalog, keeping the first row for any repeated id.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let mut catalog = Self::default();
        for product in products {
            if catalog.index.contains_key(&product.id) {
                continue;
            }
            catalog.index.insert(product.id.clone(), catalog.entries.len());
            let search_text = product.search_text();
            catalog.entries.push(CatalogEntry { product, search_text });
        }
        catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &ItemId) -> Option<&Product> {
        self.index.get(id).map(|&position| &self.entries[position].product)
    }

    pub fn contains(&self, id: &ItemId) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.entries.iter().map(|entry| &entry.product)
    }

    /// The first `limit` ids in stored order.
    pub fn head(&self, limit: usize) -> Vec<ItemId> {
        self.entries.iter().take(limit).map(|entry| entry.product.id.clone()).collect()
    }

    /// Like [`Catalog::head`], skipping any id in `excluded`.
    pub fn head_excluding(&self, limit: usize, excluded: &[ItemId]) -> Vec<ItemId> {
        self.entries
            .iter()
            .map(|entry| &entry.product.id)
            .filter(|id| !excluded.contains(id))
            .take(limit)
            .cloned()
            .collect()
    }

    pub(crate) fn iter_with_search_text(&self) -> impl Iterator<Item = (&Product, &str)> {
        self.entries.iter().map(|entry| (&entry.product, entry.search_text.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{Catalog, Product};
    use crate::ids::normalize;

    fn product(id: &str, name: &str) -> Product {
        Product { product_name: name.to_owned(), ..Product::new(normalize(id)) }
    }

    #[test]
    fn head_excluding_skips_listed_ids_and_keeps_order() {
        let catalog =
            Catalog::from_products(["1", "2", "3", "4"].map(|id| Product::new(normalize(id))));

        assert_eq!(
            catalog.head_excluding(2, &[normalize("1"), normalize("3")]),
            vec![normalize("2"), normalize("4")]
        );
        assert_eq!(catalog.head_excluding(5, &[]), catalog.head(5));
    }

    #[test]
    fn duplicate_ids_keep_first_row() {
        let catalog = Catalog::from_products([
            product("1", "first"),
            product("0000000001", "second"),
            product("2", "other"),
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(&normalize("1")).map(|p| p.product_name.as_str()), Some("first"));
        assert_eq!(catalog.head(5), vec![normalize("1"), normalize("2")]);
    }

    #[test]
    fn display_name_falls_back_through_name_columns() {
        let mut item = Product::new(normalize("7"));
        assert_eq!(item.display_name(), "Article 0000000007");

        item.prod_name = "Strap top".to_owned();
        assert_eq!(item.display_name(), "Strap top");

        item.product_name = "Strap top (2)".to_owned();
        assert_eq!(item.display_name(), "Strap top (2)");
    }

    #[test]
    fn search_text_is_lowercase_join_of_text_columns() {
        let item = Product {
            product_name: "Slim Jeans".to_owned(),
            perceived_colour_master_name: "Blue".to_owned(),
            detail_desc: "Five-pocket JEANS".to_owned(),
            price: Some(Decimal::new(2999, 2)),
            ..Product::new(normalize("3"))
        };

        let text = item.search_text();
        assert!(text.contains("slim jeans"));
        assert!(text.contains("blue"));
        assert!(text.contains("five-pocket jeans"));
        assert_eq!(text, text.to_lowercase());
    }
}
