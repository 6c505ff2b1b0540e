//! Category Report Model

use super::serde_helpers;
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

pub type CategoryReportRowId = RecordId;

/// One per-category aggregate row for a single order
///
/// The full row set for an order is deleted and regenerated on every report
/// invocation; rows are never updated individually.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReportRow {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<CategoryReportRowId>,
    /// Owning order reference ("sale_order:key" string)
    pub order_id: String,
    /// Resolved category reference; none for the "No Category" bucket and
    /// for labels with no match in the category store
    #[serde(default)]
    pub category_id: Option<String>,
    /// Grouping label (category name or "No Category")
    pub category_name: String,
    /// Number of lines in this bucket
    pub products_count: i64,
    /// Summed line quantities in this bucket
    pub total_qty: f64,
    /// Summed line subtotals in this bucket
    pub total_amount: f64,
    /// Top product names joined with ", " (empty when none)
    pub top_product: String,
    pub created_at: Option<i64>,
}

/// Listing handle returned by the report action: the regenerated rows,
/// filtered to one order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryReportListing {
    pub order_id: String,
    pub rows: Vec<CategoryReportRow>,
}
