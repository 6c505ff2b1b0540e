//! End-to-end report regeneration tests against the in-memory engine
//!
//! Covers the full flow: category store setup, order creation with cached
//! statistics, report regeneration (delete-then-insert), the discount
//! workflow, and concurrent regeneration for one order.

use sale_analytics::db::DbService;
use sale_analytics::db::repository::{
    CategoryReportRepository, CategoryRepository, OrderRepository,
};
use sale_analytics::error::AppError;
use sale_analytics::models::{CategoryCreate, OrderLineInput, SaleOrder, SaleOrderCreate};
use sale_analytics::order_stats;

struct TestEnv {
    orders: OrderRepository,
    categories: CategoryRepository,
    reports: CategoryReportRepository,
}

async fn setup() -> TestEnv {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init()
        .ok();

    let service = DbService::memory().await.expect("in-memory db");
    TestEnv {
        orders: OrderRepository::new(service.db.clone()),
        categories: CategoryRepository::new(service.db.clone()),
        reports: CategoryReportRepository::new(service.db.clone()),
    }
}

fn line_input(
    name: &str,
    quantity: f64,
    unit_price: f64,
    category: Option<(&str, &str)>,
) -> OrderLineInput {
    OrderLineInput {
        product_name: name.to_string(),
        quantity,
        unit_price,
        list_price: None,
        category_id: category.map(|(id, _)| id.to_string()),
        category_name: category.map(|(_, name)| name.to_string()),
    }
}

fn order_key(order: &SaleOrder) -> String {
    order.id.as_ref().expect("persisted order has an id").to_string()
}

/// ProductA (qty 2, subtotal 50) and ProductB (qty 1, subtotal 30) in
/// Widgets, ProductC (qty 5, subtotal 10) uncategorized
async fn widget_order(env: &TestEnv) -> (SaleOrder, String) {
    let widgets = env
        .categories
        .create(CategoryCreate {
            name: "Widgets".to_string(),
        })
        .await
        .expect("create category");
    let widgets_id = widgets.id.as_ref().expect("category id").to_string();

    let widgets_ref = Some((widgets_id.as_str(), "Widgets"));
    let order = env
        .orders
        .create(SaleOrderCreate {
            reference: "SO-1001".to_string(),
            lines: vec![
                line_input("ProductA", 2.0, 25.0, widgets_ref),
                line_input("ProductB", 1.0, 30.0, widgets_ref),
                line_input("ProductC", 5.0, 2.0, None),
            ],
        })
        .await
        .expect("create order");

    (order, widgets_id)
}

#[tokio::test]
async fn test_order_create_precomputes_stats() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;

    assert_eq!(order.total_products_count, 8.0);
    assert_eq!(order.categories_count, 1);
    assert_eq!(order.most_expensive_line_id, Some(1));
}

#[tokio::test]
async fn test_generate_report_rows() {
    let env = setup().await;
    let (order, widgets_id) = widget_order(&env).await;

    let rows = env.reports.generate(&order_key(&order)).await.expect("generate");
    assert_eq!(rows.len(), 2);

    // Label-ordered: "No Category" sorts before "Widgets"
    let no_category = &rows[0];
    assert_eq!(no_category.category_name, "No Category");
    assert_eq!(no_category.category_id, None);
    assert_eq!(no_category.products_count, 1);
    assert_eq!(no_category.total_qty, 5.0);
    assert_eq!(no_category.total_amount, 10.0);
    assert_eq!(no_category.top_product, "ProductC");

    let widgets = &rows[1];
    assert_eq!(widgets.category_name, "Widgets");
    assert_eq!(widgets.category_id.as_deref(), Some(widgets_id.as_str()));
    assert_eq!(widgets.products_count, 2);
    assert_eq!(widgets.total_qty, 3.0);
    assert_eq!(widgets.total_amount, 80.0);
    assert_eq!(widgets.top_product, "ProductA, ProductB");
}

#[tokio::test]
async fn test_report_rows_partition_the_order_lines() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;

    let rows = env.reports.generate(&order_key(&order)).await.expect("generate");

    let counted: i64 = rows.iter().map(|row| row.products_count).sum();
    assert_eq!(counted, order.lines.len() as i64);

    let amount: f64 = rows.iter().map(|row| row.total_amount).sum();
    let subtotals: f64 = order
        .lines
        .iter()
        .map(|line| order_stats::to_f64(order_stats::line_subtotal(line)))
        .sum();
    assert!((amount - subtotals).abs() < 1e-9);
}

#[tokio::test]
async fn test_regenerate_replaces_previous_rows() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;
    let key = order_key(&order);

    env.reports.generate(&key).await.expect("first run");
    env.reports.generate(&key).await.expect("second run");

    let stored = env.reports.find_by_order(&key).await.expect("find rows");
    assert_eq!(stored.len(), 2, "regeneration must not accumulate rows");
}

#[tokio::test]
async fn test_generate_for_empty_order_clears_rows() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;
    let key = order_key(&order);

    let rows = env.reports.generate(&key).await.expect("generate");
    assert_eq!(rows.len(), 2);

    env.orders
        .update_lines(&key, Vec::new())
        .await
        .expect("clear lines");
    let rows = env.reports.generate(&key).await.expect("regenerate");
    assert!(rows.is_empty());

    let stored = env.reports.find_by_order(&key).await.expect("find rows");
    assert!(stored.is_empty(), "prior rows must be cleared");
}

#[tokio::test]
async fn test_generate_unknown_order_is_not_found() {
    let env = setup().await;
    let err = env.reports.generate("missing").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_update_lines_recomputes_stats() {
    let env = setup().await;
    let (order, widgets_id) = widget_order(&env).await;
    let key = order_key(&order);

    let updated = env
        .orders
        .update_lines(
            &key,
            vec![
                line_input("ProductB", 4.0, 30.0, Some((widgets_id.as_str(), "Widgets"))),
                line_input("ProductC", 1.0, 2.0, None),
            ],
        )
        .await
        .expect("update lines");

    assert_eq!(updated.total_products_count, 5.0);
    assert_eq!(updated.categories_count, 1);
    assert_eq!(updated.most_expensive_line_id, Some(1));
}

#[tokio::test]
async fn test_set_discount_out_of_range_is_rejected() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;
    let key = order_key(&order);

    let err = env.orders.set_discount(&key, 150.0).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    // Nothing was persisted
    let stored = env.orders.get(&key).await.expect("reload order");
    assert_eq!(stored.discount_percentage, 0.0);
    assert_eq!(stored.lines[0].unit_price, 25.0);
}

#[tokio::test]
async fn test_set_discount_stages_line_prices() {
    let env = setup().await;
    let order = env
        .orders
        .create(SaleOrderCreate {
            reference: "SO-1002".to_string(),
            lines: vec![line_input("ProductA", 1.0, 100.0, None)],
        })
        .await
        .expect("create order");
    let key = order_key(&order);

    let updated = env.orders.set_discount(&key, 10.0).await.expect("set discount");
    assert_eq!(updated.discount_percentage, 10.0);
    assert_eq!(updated.lines[0].unit_price, 90.0);
    // list price stays the recomputation basis
    assert_eq!(updated.lines[0].list_price, 100.0);

    let stored = env.orders.get(&key).await.expect("reload order");
    assert_eq!(stored.discount_percentage, 10.0);
    assert_eq!(stored.lines[0].unit_price, 90.0);
}

#[tokio::test]
async fn test_discounted_prices_flow_into_report_amounts() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;
    let key = order_key(&order);

    env.orders.set_discount(&key, 50.0).await.expect("set discount");
    let rows = env.reports.generate(&key).await.expect("generate");

    let amount: f64 = rows.iter().map(|row| row.total_amount).sum();
    assert!((amount - 45.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_concurrent_generate_leaves_one_complete_row_set() {
    let env = setup().await;
    let (order, _) = widget_order(&env).await;
    let key = order_key(&order);

    let first = env.reports.clone();
    let second = env.reports.clone();
    let (a, b) = tokio::join!(first.generate(&key), second.generate(&key));
    a.expect("first generate");
    b.expect("second generate");

    let stored = env.reports.find_by_order(&key).await.expect("find rows");
    assert_eq!(stored.len(), 2);
    let counted: i64 = stored.iter().map(|row| row.products_count).sum();
    assert_eq!(counted, 3);
}

#[tokio::test]
async fn test_open_category_report_lists_only_this_order() {
    let env = setup().await;
    let (first_order, widgets_id) = widget_order(&env).await;

    let second_order = env
        .orders
        .create(SaleOrderCreate {
            reference: "SO-2001".to_string(),
            lines: vec![line_input(
                "ProductZ",
                1.0,
                7.0,
                Some((widgets_id.as_str(), "Widgets")),
            )],
        })
        .await
        .expect("create second order");

    let first_key = order_key(&first_order);
    let second_key = order_key(&second_order);

    let listing = env
        .reports
        .open_category_report(&first_key)
        .await
        .expect("open report");
    assert_eq!(listing.order_id, first_key);
    assert_eq!(listing.rows.len(), 2);
    assert!(listing.rows.iter().all(|row| row.order_id == first_key));

    let listing = env
        .reports
        .open_category_report(&second_key)
        .await
        .expect("open second report");
    assert_eq!(listing.rows.len(), 1);
    assert_eq!(listing.rows[0].category_name, "Widgets");
    assert_eq!(listing.rows[0].total_amount, 7.0);

    // The first order's rows are untouched by the second regeneration
    let stored = env.reports.find_by_order(&first_key).await.expect("find rows");
    assert_eq!(stored.len(), 2);
}

#[tokio::test]
async fn test_duplicate_category_name_is_rejected() {
    let env = setup().await;
    env.categories
        .create(CategoryCreate {
            name: "Widgets".to_string(),
        })
        .await
        .expect("create category");

    let err = env
        .categories
        .create(CategoryCreate {
            name: "Widgets".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Duplicate(_)));
}
