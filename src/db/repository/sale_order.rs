//! Sale Order Repository

use super::{BaseRepository, record_id};
use crate::error::{AppError, AppResult};
use crate::models::{OrderLine, OrderLineInput, SaleOrder, SaleOrderCreate};
use crate::order_stats;
use crate::util::now_millis;
use serde::Serialize;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

pub(crate) const TABLE: &str = "sale_order";

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn build_lines(inputs: Vec<OrderLineInput>) -> Vec<OrderLine> {
        inputs
            .into_iter()
            .enumerate()
            .map(|(idx, input)| OrderLine {
                id: idx as i64 + 1,
                product_name: input.product_name,
                quantity: input.quantity,
                unit_price: input.unit_price,
                list_price: input.list_price.unwrap_or(input.unit_price),
                category_id: input.category_id,
                category_name: input.category_name,
            })
            .collect()
    }

    /// Create a new order with its cached statistics precomputed
    pub async fn create(&self, data: SaleOrderCreate) -> AppResult<SaleOrder> {
        let now = now_millis();
        let mut order = SaleOrder {
            id: None,
            reference: data.reference,
            lines: Self::build_lines(data.lines),
            discount_percentage: 0.0,
            total_products_count: 0.0,
            categories_count: 0,
            most_expensive_line_id: None,
            created_at: Some(now),
            updated_at: Some(now),
        };
        order_stats::recalculate_stats(&mut order);

        let created: Option<SaleOrder> = self.base.db().create(TABLE).content(order).await?;
        created.ok_or_else(|| AppError::Database("Failed to create sale order".to_string()))
    }

    /// Find order by id (bare key or "sale_order:key" form)
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<SaleOrder>> {
        let order: Option<SaleOrder> = self.base.db().select(record_id(TABLE, id)).await?;
        Ok(order)
    }

    /// Resolve an order or fail with NotFound
    pub async fn get(&self, id: &str) -> AppResult<SaleOrder> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Sale order {} not found", id)))
    }

    /// Replace the line collection and recompute the cached statistics
    pub async fn update_lines(
        &self,
        id: &str,
        lines: Vec<OrderLineInput>,
    ) -> AppResult<SaleOrder> {
        let mut order = self.get(id).await?;
        order.lines = Self::build_lines(lines);
        // A committed discount stays staged onto the replacement lines
        let discount_percentage = order.discount_percentage;
        if discount_percentage != 0.0 {
            order_stats::apply_discount(&mut order, discount_percentage);
        }
        order_stats::recalculate_stats(&mut order);
        self.persist(id, order).await
    }

    /// Committed discount workflow: validate, stage onto line prices, persist
    ///
    /// Validation failure blocks persistence; nothing is written.
    pub async fn set_discount(&self, id: &str, percentage: f64) -> AppResult<SaleOrder> {
        order_stats::validate_discount_percentage(percentage)?;

        let mut order = self.get(id).await?;
        order.discount_percentage = percentage;
        order_stats::apply_discount(&mut order, percentage);
        order_stats::recalculate_stats(&mut order);
        self.persist(id, order).await
    }

    async fn persist(&self, id: &str, order: SaleOrder) -> AppResult<SaleOrder> {
        #[derive(Serialize)]
        struct OrderMergeDb {
            lines: Vec<OrderLine>,
            discount_percentage: f64,
            total_products_count: f64,
            categories_count: i64,
            most_expensive_line_id: Option<i64>,
            updated_at: i64,
        }

        let data = OrderMergeDb {
            lines: order.lines,
            discount_percentage: order.discount_percentage,
            total_products_count: order.total_products_count,
            categories_count: order.categories_count,
            most_expensive_line_id: order.most_expensive_line_id,
            updated_at: now_millis(),
        };

        let updated: Option<SaleOrder> = self
            .base
            .db()
            .update(record_id(TABLE, id))
            .merge(data)
            .await?;
        updated.ok_or_else(|| AppError::NotFound(format!("Sale order {} not found", id)))
    }
}
