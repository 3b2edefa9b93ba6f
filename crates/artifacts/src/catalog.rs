use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use csv::{ByteRecord, ReaderBuilder};
use rust_decimal::Decimal;
use storefront_core::catalog::{Catalog, Product};
use storefront_core::ids::normalize;

use crate::error::ArtifactError;

const ARTICLE_ID: &str = "article_id";

/// Column positions resolved from the header row. Text columns that are absent
/// read as empty strings.
#[derive(Debug)]
struct Columns {
    article_id: usize,
    product_name: Option<usize>,
    prod_name: Option<usize>,
    product_type_name: Option<usize>,
    product_group_name: Option<usize>,
    perceived_colour_master_name: Option<usize>,
    colour: Option<usize>,
    detail_desc: Option<usize>,
    garment_group_name: Option<usize>,
    price: Option<usize>,
}

impl Columns {
    fn resolve(headers: &ByteRecord) -> Option<Self> {
        let position = |name: &str| {
            headers.iter().position(|header| String::from_utf8_lossy(header).trim() == name)
        };

        Some(Self {
            article_id: position(ARTICLE_ID)?,
            product_name: position("product_name"),
            prod_name: position("prod_name"),
            product_type_name: position("product_type_name"),
            product_group_name: position("product_group_name"),
            perceived_colour_master_name: position("perceived_colour_master_name"),
            colour: position("colour"),
            detail_desc: position("detail_desc"),
            garment_group_name: position("garment_group_name"),
            price: position("price"),
        })
    }

    fn product(&self, record: &ByteRecord) -> Option<Product> {
        let raw_id = text(record, Some(self.article_id));
        if raw_id.trim().is_empty() {
            return None;
        }

        Some(Product {
            product_name: text(record, self.product_name),
            prod_name: text(record, self.prod_name),
            product_type_name: text(record, self.product_type_name),
            product_group_name: text(record, self.product_group_name),
            perceived_colour_master_name: text(record, self.perceived_colour_master_name),
            colour: text(record, self.colour),
            detail_desc: text(record, self.detail_desc),
            garment_group_name: text(record, self.garment_group_name),
            price: parse_price(&text(record, self.price)),
            ..Product::new(normalize(&raw_id))
        })
    }
}

fn text(record: &ByteRecord, column: Option<usize>) -> String {
    column
        .and_then(|index| record.get(index))
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default()
}

fn parse_price(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)).ok()
}

/// Read the product catalog CSV at `path`.
pub fn load_catalog(path: &Path) -> Result<Catalog, ArtifactError> {
    let file =
        File::open(path).map_err(|source| ArtifactError::Io { path: path.to_path_buf(), source })?;
    read_catalog(file, path)
}

/// Parse a catalog from any reader; `path` only labels errors. Rows without an
/// `article_id` are skipped and duplicate ids keep their first row.
pub fn read_catalog<R: Read>(reader: R, path: &Path) -> Result<Catalog, ArtifactError> {
    let mut csv = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv
        .byte_headers()
        .map_err(|source| ArtifactError::Csv { path: path.to_path_buf(), source })?
        .clone();
    let columns = Columns::resolve(&headers).ok_or_else(|| ArtifactError::MissingColumn {
        path: path.to_path_buf(),
        column: ARTICLE_ID,
    })?;

    let mut products = Vec::new();
    for record in csv.byte_records() {
        let record =
            record.map_err(|source| ArtifactError::Csv { path: path.to_path_buf(), source })?;
        if let Some(product) = columns.product(&record) {
            products.push(product);
        }
    }

    Ok(Catalog::from_products(products))
}
