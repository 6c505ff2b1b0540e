//! Data Models

pub mod category;
pub mod category_report;
pub mod sale_order;
pub mod serde_helpers;

// Re-exports
pub use category::{Category, CategoryCreate, CategoryId};
pub use category_report::{CategoryReportListing, CategoryReportRow, CategoryReportRowId};
pub use sale_order::{OrderLine, OrderLineInput, SaleOrder, SaleOrderCreate, SaleOrderId};
