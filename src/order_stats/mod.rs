//! Order statistics and category groupings
//!
//! Pure functions over one sale order's line collection; no side effects,
//! no persistence. All monetary calculations are done using `Decimal`
//! internally, then converted to `f64` for storage/serialization.
//!
//! Every grouping derives its key through `category_label`, so category
//! totals, grouped products, top products and the generated report rows all
//! partition the lines identically.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::prelude::*;

use crate::error::{AppError, AppResult};
use crate::models::{OrderLine, SaleOrder};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Grouping label for lines whose product has no category
pub const NO_CATEGORY: &str = "No Category";

/// Default number of product names kept per category in report rows
pub const DEFAULT_TOP_LIMIT: usize = 2;

/// Convert f64 to Decimal for calculation
///
/// Inputs are expected to be finite; a non-finite value logs an error and
/// falls back to zero rather than corrupting a monetary calculation.
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary calculation, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .expect("Decimal rounded to 2dp is representable as f64")
}

/// Line subtotal (unit price × quantity)
pub fn line_subtotal(line: &OrderLine) -> Decimal {
    (to_decimal(line.unit_price) * to_decimal(line.quantity))
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Grouping label for a line: its category name, or "No Category"
pub fn category_label(line: &OrderLine) -> &str {
    line.category_name.as_deref().unwrap_or(NO_CATEGORY)
}

/// Product names grouped by category label, in line order
pub fn products_by_category(order: &SaleOrder) -> BTreeMap<String, Vec<String>> {
    let mut result: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for line in &order.lines {
        result
            .entry(category_label(line).to_string())
            .or_default()
            .push(line.product_name.clone());
    }
    result
}

/// Summed line subtotals per category label
pub fn category_totals(order: &SaleOrder) -> BTreeMap<String, f64> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for line in &order.lines {
        *totals
            .entry(category_label(line).to_string())
            .or_insert(Decimal::ZERO) += line_subtotal(line);
    }
    totals
        .into_iter()
        .map(|(label, total)| (label, to_f64(total)))
        .collect()
}

/// Summed line quantities per category label
pub fn qty_by_category(order: &SaleOrder) -> BTreeMap<String, f64> {
    let mut quantities: BTreeMap<String, Decimal> = BTreeMap::new();
    for line in &order.lines {
        *quantities
            .entry(category_label(line).to_string())
            .or_insert(Decimal::ZERO) += to_decimal(line.quantity);
    }
    quantities
        .into_iter()
        .map(|(label, qty)| (label, to_f64(qty)))
        .collect()
}

/// Up to `limit` product names per category label, by descending subtotal
///
/// The sort is stable, so equal subtotals keep their original line order.
pub fn top_products_by_category(
    order: &SaleOrder,
    limit: usize,
) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, Vec<&OrderLine>> = BTreeMap::new();
    for line in &order.lines {
        grouped
            .entry(category_label(line).to_string())
            .or_default()
            .push(line);
    }

    grouped
        .into_iter()
        .map(|(label, mut lines)| {
            lines.sort_by_key(|line| std::cmp::Reverse(line_subtotal(line)));
            let top = lines
                .iter()
                .take(limit)
                .map(|line| line.product_name.clone())
                .collect();
            (label, top)
        })
        .collect()
}

/// Quantity-weighted product count (sum of line quantities, not line count)
pub fn total_products_count(order: &SaleOrder) -> f64 {
    let total: Decimal = order
        .lines
        .iter()
        .map(|line| to_decimal(line.quantity))
        .sum();
    to_f64(total)
}

/// Count of distinct category identities among categorized lines
///
/// Lines without a category are excluded here, unlike the "No Category"
/// bucket used by the grouping operations.
pub fn distinct_categories_count(order: &SaleOrder) -> usize {
    order
        .lines
        .iter()
        .filter_map(|line| line.category_id.as_deref())
        .collect::<HashSet<_>>()
        .len()
}

/// The line with the highest subtotal; first occurrence wins ties
pub fn most_expensive_line(order: &SaleOrder) -> Option<&OrderLine> {
    let mut best: Option<(&OrderLine, Decimal)> = None;
    for line in &order.lines {
        let subtotal = line_subtotal(line);
        match &best {
            Some((_, current)) if subtotal <= *current => {}
            _ => best = Some((line, subtotal)),
        }
    }
    best.map(|(line, _)| line)
}

/// Reject discount percentages outside [0, 100]
pub fn validate_discount_percentage(percentage: f64) -> AppResult<()> {
    if !percentage.is_finite() {
        return Err(AppError::Validation(format!(
            "Discount percentage must be a finite number, got {}",
            percentage
        )));
    }
    if !(0.0..=100.0).contains(&percentage) {
        return Err(AppError::Validation(
            "Discount percentage must be between 0 and 100!".to_string(),
        ));
    }
    Ok(())
}

/// Stage a discount onto every line: the unit price becomes the list price
/// reduced by `percentage`
///
/// The percentage is NOT range-checked here; callers validate via
/// `validate_discount_percentage` before committing, and out-of-range values
/// pass through unchanged.
pub fn apply_discount(order: &mut SaleOrder, percentage: f64) {
    let factor = Decimal::ONE - to_decimal(percentage) / Decimal::ONE_HUNDRED;
    for line in &mut order.lines {
        line.unit_price = to_f64(to_decimal(line.list_price) * factor);
    }
}

/// Recompute the cached order statistics from the current line collection
///
/// Callers invoke this after any change to lines, quantities, prices or
/// category links; nothing recomputes implicitly.
pub fn recalculate_stats(order: &mut SaleOrder) {
    order.total_products_count = total_products_count(order);
    order.categories_count = distinct_categories_count(order) as i64;
    order.most_expensive_line_id = most_expensive_line(order).map(|line| line.id);
}
