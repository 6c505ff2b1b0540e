//! Category Repository

use super::BaseRepository;
use crate::error::{AppError, AppResult};
use crate::models::{Category, CategoryCreate};
use crate::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const TABLE: &str = "category";

#[derive(Clone)]
pub struct CategoryRepository {
    base: BaseRepository,
}

impl CategoryRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Create a new category
    pub async fn create(&self, data: CategoryCreate) -> AppResult<Category> {
        // Check duplicate name
        if self.find_by_name(&data.name).await?.is_some() {
            return Err(AppError::Duplicate(format!(
                "Category '{}' already exists",
                data.name
            )));
        }

        let category = Category {
            id: None,
            name: data.name,
            created_at: Some(now_millis()),
        };

        let created: Option<Category> = self.base.db().create(TABLE).content(category).await?;
        created.ok_or_else(|| AppError::Database("Failed to create category".to_string()))
    }

    /// Find category by name
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<Category>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM category WHERE name = $name LIMIT 1")
            .bind(("name", name.to_string()))
            .await?;
        let categories: Vec<Category> = result.take(0)?;
        Ok(categories.into_iter().next())
    }

    /// Find all categories matching a set of names
    ///
    /// Names with no match are simply absent from the result.
    pub async fn find_by_names(&self, names: &[String]) -> AppResult<Vec<Category>> {
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM category WHERE name IN $names")
            .bind(("names", names.to_vec()))
            .await?;
        let categories: Vec<Category> = result.take(0)?;
        Ok(categories)
    }
}
