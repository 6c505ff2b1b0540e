//! Repository Module
//!
//! Store access for sale orders, categories and category report rows.

pub mod category;
pub mod category_report;
pub mod sale_order;

// Re-exports
pub use category::CategoryRepository;
pub use category_report::CategoryReportRepository;
pub use sale_order::OrderRepository;

use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};

/// Base repository with database reference
#[derive(Clone)]
pub struct BaseRepository {
    db: Surreal<Db>,
}

impl BaseRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &Surreal<Db> {
        &self.db
    }
}

/// Build a record id from a key that may carry its table prefix
/// (e.g. "sale_order:xxx" -> table "sale_order", key "xxx")
pub(crate) fn record_id(table: &str, id: &str) -> RecordId {
    match id.split_once(':') {
        Some((prefix, key)) if prefix == table => RecordId::from_table_key(table, key),
        _ => RecordId::from_table_key(table, id),
    }
}
