//! Category Report Repository
//!
//! Regenerates the per-category aggregate rows for one order. Each
//! invocation replaces the order's full row set (delete-then-insert);
//! regeneration is serialized per order so concurrent triggers cannot
//! interleave the delete and insert steps.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use super::{BaseRepository, CategoryRepository, OrderRepository, record_id, sale_order};
use crate::error::{AppError, AppResult};
use crate::models::{CategoryReportListing, CategoryReportRow};
use crate::order_stats;
use crate::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "category_report";

#[derive(Clone)]
pub struct CategoryReportRepository {
    base: BaseRepository,
    /// Per-order regeneration locks; clones of the repository share the map
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl CategoryReportRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
            locks: Arc::new(DashMap::new()),
        }
    }

    fn order_lock(&self, order_ref: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(order_ref.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Regenerate the report rows for an order
    ///
    /// Deletes any previously stored rows for the order (deleting zero rows
    /// is not an error), then inserts one row per category label present in
    /// the order's lines. An order with no lines ends up with no rows.
    pub async fn generate(&self, order_id: &str) -> AppResult<Vec<CategoryReportRow>> {
        let order_ref = record_id(sale_order::TABLE, order_id).to_string();
        let lock = self.order_lock(&order_ref);
        let _guard = lock.lock().await;

        let orders = OrderRepository::new(self.base.db().clone());
        let order = orders.get(order_id).await?;

        self.base
            .db()
            .query("DELETE category_report WHERE order_id = $order")
            .bind(("order", order_ref.clone()))
            .await?;

        if order.lines.is_empty() {
            tracing::info!(order = %order_ref, "Category report cleared (order has no lines)");
            return Ok(Vec::new());
        }

        let products = order_stats::products_by_category(&order);
        let totals = order_stats::category_totals(&order);
        let quantities = order_stats::qty_by_category(&order);
        let top = order_stats::top_products_by_category(&order, order_stats::DEFAULT_TOP_LIMIT);

        // Resolve labels to category ids by name; "No Category" and unknown
        // labels stay unresolved
        let labels: Vec<String> = products.keys().cloned().collect();
        let categories = CategoryRepository::new(self.base.db().clone());
        let category_map: HashMap<String, String> = categories
            .find_by_names(&labels)
            .await?
            .into_iter()
            .filter_map(|category| category.id.map(|id| (category.name, id.to_string())))
            .collect();

        let mut rows = Vec::with_capacity(products.len());
        for (label, product_names) in &products {
            let row = CategoryReportRow {
                id: None,
                order_id: order_ref.clone(),
                category_id: category_map.get(label).cloned(),
                category_name: label.clone(),
                products_count: product_names.len() as i64,
                total_qty: quantities.get(label).copied().unwrap_or(0.0),
                total_amount: totals.get(label).copied().unwrap_or(0.0),
                top_product: top
                    .get(label)
                    .map(|names| names.join(", "))
                    .unwrap_or_default(),
                created_at: Some(now_millis()),
            };

            let created: Option<CategoryReportRow> =
                self.base.db().create(TABLE).content(row).await?;
            rows.push(created.ok_or_else(|| {
                AppError::Database("Failed to create category report row".to_string())
            })?);
        }

        tracing::info!(order = %order_ref, rows = rows.len(), "Category report regenerated");
        Ok(rows)
    }

    /// Stored rows for an order, label-ordered
    pub async fn find_by_order(&self, order_id: &str) -> AppResult<Vec<CategoryReportRow>> {
        let order_ref = record_id(sale_order::TABLE, order_id).to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM category_report WHERE order_id = $order ORDER BY category_name")
            .bind(("order", order_ref))
            .await?;
        let rows: Vec<CategoryReportRow> = result.take(0)?;
        Ok(rows)
    }

    /// User-triggered action: regenerate the report, then hand back the
    /// listing filtered to this order's rows
    pub async fn open_category_report(&self, order_id: &str) -> AppResult<CategoryReportListing> {
        let rows = self.generate(order_id).await?;
        Ok(CategoryReportListing {
            order_id: record_id(sale_order::TABLE, order_id).to_string(),
            rows,
        })
    }
}
