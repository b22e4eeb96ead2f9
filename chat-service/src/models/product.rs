//! Read-only product catalog records.

use mongodb::bson::{Bson, Document};

pub const BRAND_FIELD: &str = "Brand";
pub const PRODUCT_FIELD: &str = "Product";
const ID_FIELD: &str = "_id";

/// A catalog entry with every attribute rendered as text, in stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    pub brand: String,
    pub product: String,
    /// All fields except `_id`, including `Brand` and `Product`.
    pub attributes: Vec<(String, String)>,
}

impl ProductRecord {
    /// Build from a stored document. Returns `None` when `Brand` or
    /// `Product` is missing or not a string.
    pub fn from_document(document: &Document) -> Option<Self> {
        let brand = document.get_str(BRAND_FIELD).ok()?.to_string();
        let product = document.get_str(PRODUCT_FIELD).ok()?.to_string();

        let attributes = document
            .iter()
            .filter(|(key, _)| key.as_str() != ID_FIELD)
            .map(|(key, value)| (key.clone(), render_value(value)))
            .collect();

        Some(Self {
            brand,
            product,
            attributes,
        })
    }

    /// Convenience constructor; `Brand` and `Product` lead the attribute list.
    pub fn new<K, V>(
        brand: impl Into<String>,
        product: impl Into<String>,
        extra: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let brand = brand.into();
        let product = product.into();
        let mut attributes = vec![
            (BRAND_FIELD.to_string(), brand.clone()),
            (PRODUCT_FIELD.to_string(), product.clone()),
        ];
        attributes.extend(extra.into_iter().map(|(k, v)| (k.into(), v.into())));
        Self {
            brand,
            product,
            attributes,
        }
    }
}

fn render_value(value: &Bson) -> String {
    match value {
        Bson::String(s) => s.clone(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        Bson::Double(f) => render_float(*f),
        Bson::Boolean(b) => b.to_string(),
        Bson::Null => String::new(),
        other => other.to_string(),
    }
}

/// Whole numbers keep their `.0` so imported float columns read as floats.
fn render_float(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else {
        format!("{:?}", value)
    }
}
