//! Sale Order Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type SaleOrderId = RecordId;

/// Order line (embedded in the order record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    /// Per-order line id, sequential, assigned on write
    pub id: i64,
    pub product_name: String,
    pub quantity: f64,
    /// Current unit price in currency unit (reflects any staged discount)
    pub unit_price: f64,
    /// Catalog list price, basis for discount recomputation
    pub list_price: f64,
    /// Category reference ("category:key" string) when the product is categorized
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub category_name: Option<String>,
}

/// Sale order entity
///
/// The three statistics fields are cached values; callers recompute them via
/// `order_stats::recalculate_stats` whenever lines, prices or category links
/// change. The repository does this on every write path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrder {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<SaleOrderId>,
    pub reference: String,
    #[serde(default)]
    pub lines: Vec<OrderLine>,
    /// Order-level discount (%), staged onto line prices when committed
    #[serde(default)]
    pub discount_percentage: f64,
    /// Quantity-weighted product count (not line count)
    #[serde(default)]
    pub total_products_count: f64,
    /// Distinct category count; uncategorized lines are excluded
    #[serde(default)]
    pub categories_count: i64,
    /// Line id of the highest-subtotal line
    #[serde(default)]
    pub most_expensive_line_id: Option<i64>,
    pub created_at: Option<i64>,
    pub updated_at: Option<i64>,
}

/// Line input for order create / line replacement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLineInput {
    pub product_name: String,
    pub quantity: f64,
    pub unit_price: f64,
    /// Defaults to `unit_price` when absent
    pub list_price: Option<f64>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleOrderCreate {
    pub reference: String,
    #[serde(default)]
    pub lines: Vec<OrderLineInput>,
}
