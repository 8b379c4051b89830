use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, DbErr, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::category::{self, Model as CategoryModel};
use crate::entities::RecordStatus;
use crate::errors::ServiceError;
use crate::repositories::UnitOfWork;
use crate::validation::{trim, trim_optional, NAME_RE};

/// Fields accepted when creating or editing a category.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(
        length(min = 1, max = 50, message = "must be 1-50 characters"),
        regex(path = "NAME_RE", message = "contains unsupported characters")
    )]
    pub name: String,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    #[serde(default)]
    pub description: Option<String>,
}

impl CategoryInput {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_optional(&mut self.description);
    }
}

#[derive(Clone)]
pub struct CategoryService {
    db: Arc<DatabaseConnection>,
}

impl CategoryService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, mut input: CategoryInput) -> Result<CategoryModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        self.ensure_name_free(&uow, &input.name, None).await?;

        let category = uow
            .categories()
            .insert(category::ActiveModel {
                id: NotSet,
                name: Set(input.name.clone()),
                description: Set(input.description),
                status: Set(RecordStatus::Active),
                last_update: Set(Utc::now()),
            })
            .await
            .map_err(|err| name_conflict_or(err, &input.name))?;

        info!(category_id = category.id, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        mut input: CategoryInput,
    ) -> Result<CategoryModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        let existing = self.get(id).await?;
        self.ensure_name_free(&uow, &input.name, Some(id)).await?;

        let mut category: category::ActiveModel = existing.into();
        category.name = Set(input.name.clone());
        category.description = Set(input.description);

        let category = uow
            .categories()
            .update(category)
            .await
            .map_err(|err| name_conflict_or(err, &input.name))?;
        info!(category_id = id, "Category updated");
        Ok(category)
    }

    /// Soft delete. Products keep pointing at the category.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i32) -> Result<CategoryModel, ServiceError> {
        self.set_status(id, RecordStatus::Inactive).await
    }

    #[instrument(skip(self))]
    pub async fn activate(&self, id: i32) -> Result<CategoryModel, ServiceError> {
        self.set_status(id, RecordStatus::Active).await
    }

    pub async fn get(&self, id: i32) -> Result<CategoryModel, ServiceError> {
        UnitOfWork::new(&*self.db)
            .categories()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Category", id))
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<CategoryModel>, ServiceError> {
        Ok(UnitOfWork::new(&*self.db)
            .categories()
            .list(include_inactive)
            .await?)
    }

    async fn set_status(
        &self,
        id: i32,
        status: RecordStatus,
    ) -> Result<CategoryModel, ServiceError> {
        let existing = self.get(id).await?;
        if existing.status == status {
            return Ok(existing);
        }

        let mut category: category::ActiveModel = existing.into();
        category.status = Set(status);
        let category = UnitOfWork::new(&*self.db)
            .categories()
            .update(category)
            .await?;

        info!(category_id = id, ?status, "Category status changed");
        Ok(category)
    }

    async fn ensure_name_free(
        &self,
        uow: &UnitOfWork<'_, DatabaseConnection>,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        if uow
            .categories()
            .find_by_name_ci(name, exclude_id)
            .await?
            .is_some()
        {
            return Err(name_taken(name));
        }
        Ok(())
    }
}

fn name_taken(name: &str) -> ServiceError {
    ServiceError::Conflict(format!("a category named '{}' already exists", name))
}

/// A concurrent create can pass the lookup and still hit the unique index.
fn name_conflict_or(err: DbErr, name: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => name_taken(name),
        _ => ServiceError::DatabaseError(err),
    }
}
