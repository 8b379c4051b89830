use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::category::Model as CategoryModel;
use crate::entities::product::{self, Model as ProductModel};
use crate::entities::RecordStatus;
use crate::errors::ServiceError;
use crate::repositories::UnitOfWork;
use crate::validation::{trim, trim_optional, validate_price, NAME_RE};

/// Fields accepted when creating a product, and when editing one.
///
/// `stock` is an absolute value; sales adjust it through the sale workflow.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ProductInput {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        regex(path = "NAME_RE", message = "contains unsupported characters")
    )]
    pub name: String,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    #[serde(default)]
    pub description: Option<String>,
    #[validate(
        length(max = 50, message = "must be at most 50 characters"),
        regex(path = "NAME_RE", message = "contains unsupported characters")
    )]
    #[serde(default)]
    pub brand: Option<String>,
    #[validate(custom = "validate_price")]
    #[schema(value_type = String, example = "5.00")]
    pub price: Decimal,
    #[validate(range(min = 0, max = 1_000_000, message = "must be between 0 and 1000000"))]
    pub stock: i32,
    pub category_id: i32,
    /// Only honoured on update; new products always start active.
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl ProductInput {
    fn normalize(&mut self) {
        trim(&mut self.name);
        trim_optional(&mut self.description);
        trim_optional(&mut self.brand);
    }
}

/// A product together with the category it belongs to.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductModel,
    pub category: Option<CategoryModel>,
}

/// Whether `product` can supply `quantity` units right now.
pub fn stock_covers(product: Option<&ProductModel>, quantity: i32) -> bool {
    product.map_or(false, |p| p.can_supply(quantity))
}

#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    search_limit: u64,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, search_limit: u64) -> Self {
        Self { db, search_limit }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, mut input: ProductInput) -> Result<ProductModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        self.ensure_category_usable(&uow, input.category_id).await?;

        let product = uow
            .products()
            .insert(product::ActiveModel {
                id: NotSet,
                name: Set(input.name),
                description: Set(input.description),
                brand: Set(input.brand),
                price: Set(input.price),
                stock: Set(input.stock),
                category_id: Set(input.category_id),
                status: Set(RecordStatus::Active),
                last_update: Set(Utc::now()),
            })
            .await?;

        info!(product_id = product.id, "Product created");
        Ok(product)
    }

    /// Replaces the editable fields. Moving a product into another category
    /// requires that category to be active.
    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        mut input: ProductInput,
    ) -> Result<ProductModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        let existing = self.get(id).await?;
        if existing.category_id != input.category_id {
            self.ensure_category_usable(&uow, input.category_id).await?;
        }

        let mut product: product::ActiveModel = existing.into();
        product.name = Set(input.name);
        product.description = Set(input.description);
        product.brand = Set(input.brand);
        product.price = Set(input.price);
        product.stock = Set(input.stock);
        product.category_id = Set(input.category_id);
        if let Some(status) = input.status {
            product.status = Set(status);
        }

        let product = uow.products().update(product).await?;
        info!(product_id = id, stock = product.stock, "Product updated");
        Ok(product)
    }

    /// Soft delete; sale history keeps referencing the product.
    #[instrument(skip(self))]
    pub async fn deactivate(&self, id: i32) -> Result<ProductModel, ServiceError> {
        let existing = self.get(id).await?;
        if !existing.status.is_active() {
            return Ok(existing);
        }

        let mut product: product::ActiveModel = existing.into();
        product.status = Set(RecordStatus::Inactive);
        let product = UnitOfWork::new(&*self.db).products().update(product).await?;

        info!(product_id = id, "Product deactivated");
        Ok(product)
    }

    pub async fn get(&self, id: i32) -> Result<ProductModel, ServiceError> {
        UnitOfWork::new(&*self.db)
            .products()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))
    }

    pub async fn get_detail(&self, id: i32) -> Result<ProductDetail, ServiceError> {
        let (product, category) = UnitOfWork::new(&*self.db)
            .products()
            .find_with_category(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;
        Ok(ProductDetail { product, category })
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<ProductModel>, ServiceError> {
        Ok(UnitOfWork::new(&*self.db)
            .products()
            .list(include_inactive)
            .await?)
    }

    /// True only when the product exists, is active and holds at least
    /// `quantity` units. Missing products answer false, not an error.
    #[instrument(skip(self))]
    pub async fn has_sufficient_stock(
        &self,
        product_id: i32,
        quantity: i32,
    ) -> Result<bool, ServiceError> {
        let product = UnitOfWork::new(&*self.db)
            .products()
            .find_by_id(product_id)
            .await?;
        Ok(stock_covers(product.as_ref(), quantity))
    }

    /// Substring search over sellable products. A blank term yields nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<ProductModel>, ServiceError> {
        let term = term.trim();
        if term.is_empty() {
            return Ok(Vec::new());
        }

        let products = UnitOfWork::new(&*self.db)
            .products()
            .search(term, self.search_limit)
            .await?;
        debug!(matches = products.len(), "Product search finished");
        Ok(products)
    }

    async fn ensure_category_usable(
        &self,
        uow: &UnitOfWork<'_, DatabaseConnection>,
        category_id: i32,
    ) -> Result<(), ServiceError> {
        match uow.categories().find_by_id(category_id).await? {
            Some(category) if category.status.is_active() => Ok(()),
            _ => Err(ServiceError::InvalidInput(format!(
                "category {} does not exist or is inactive",
                category_id
            ))),
        }
    }
}
