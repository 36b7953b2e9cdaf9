//! Shop products.

use super::record::require;
use super::{Draft, OrderedRecord, Record, RecordId, ResourceKind};
use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

const fn default_active() -> bool {
    true
}

/// Accepts prices sent either as numbers or numeric strings.
fn price_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected price as number or string, got {other}"
        ))),
    }
}

/// An item in a creator's shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Server-assigned identifier.
    #[serde(rename = "_id")]
    pub id: RecordId,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Price in the creator's currency.
    #[serde(
        default,
        deserialize_with = "price_from_number_or_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    /// Where the product is sold.
    #[serde(default)]
    pub product_url: String,
    /// Product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Zero-based display position.
    #[serde(default)]
    pub sort_order: u32,
    /// Whether the product is listed on the public page.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Fields the editor does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Record for Product {
    const KIND: ResourceKind = ResourceKind::Products;

    fn id(&self) -> &RecordId {
        &self.id
    }
}

impl OrderedRecord for Product {
    type Draft = ProductDraft;

    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn set_sort_order(&mut self, sort_order: u32) {
        self.sort_order = sort_order;
    }

    fn provisional(draft: &ProductDraft, sort_order: u32) -> Self {
        Self {
            id: RecordId::provisional(),
            title: draft.title.clone(),
            price: draft.price,
            product_url: draft.product_url.clone(),
            image_url: draft.image_url.clone(),
            sort_order,
            is_active: true,
            extra: Map::new(),
        }
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Display title (required).
    pub title: String,
    /// Price, if shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    /// Where the product is sold (required).
    pub product_url: String,
    /// Product image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ProductDraft {
    /// Creates a product draft without price or image.
    #[must_use]
    pub fn new(title: impl Into<String>, product_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: None,
            product_url: product_url.into(),
            image_url: None,
        }
    }

    /// Sets the price.
    #[must_use]
    pub const fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the image URL.
    #[must_use]
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

impl Draft for ProductDraft {
    fn validate(&self) -> Result<()> {
        require("title", &self.title)?;
        require("product_url", &self.product_url)?;
        if self.price.is_some_and(|p| !p.is_finite() || p < 0.0) {
            return Err(crate::Error::Validation(
                "price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }
}
