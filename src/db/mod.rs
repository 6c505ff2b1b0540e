//! Database Module
//!
//! Owns the embedded SurrealDB handle. Report rows are derived,
//! recomputable data; the store runs on the in-memory engine and the host
//! application remains the system of record.

pub mod repository;

use crate::error::AppResult;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};

const NAMESPACE: &str = "sale";
const DATABASE: &str = "analytics";

/// Database service — owns the embedded database handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Start an in-memory database instance
    pub async fn memory() -> AppResult<Self> {
        let db = Surreal::new::<Mem>(()).await?;
        db.use_ns(NAMESPACE).use_db(DATABASE).await?;
        tracing::info!("Embedded database ready (in-memory engine)");
        Ok(Self { db })
    }
}
