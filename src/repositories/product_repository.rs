use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbBackend, DbErr, EntityTrait,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use super::escape_like;
use crate::entities::category::{self, Entity as Category, Model as CategoryModel};
use crate::entities::product::{self, Entity as Product, Model as ProductModel};
use crate::entities::RecordStatus;

pub struct ProductRepository<'c, C> {
    conn: &'c C,
}

fn lower_like<T: IntoColumnRef>(column: T, pattern: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape('\\'))
}

impl<'c, C: ConnectionTrait> ProductRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<ProductModel>, DbErr> {
        Product::find_by_id(id).one(self.conn).await
    }

    pub async fn find_with_category(
        &self,
        id: i32,
    ) -> Result<Option<(ProductModel, Option<CategoryModel>)>, DbErr> {
        Product::find_by_id(id)
            .find_also_related(Category)
            .one(self.conn)
            .await
    }

    /// Every product whose id is in `ids`, in no particular order.
    pub async fn find_many(&self, ids: &[i32]) -> Result<Vec<ProductModel>, DbErr> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Product::find()
            .filter(product::Column::Id.is_in(ids.iter().copied()))
            .all(self.conn)
            .await
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<ProductModel>, DbErr> {
        let mut query = Product::find();
        if !include_inactive {
            query = query.filter(product::Column::Status.eq(RecordStatus::Active));
        }
        query.order_by_asc(product::Column::Name).all(self.conn).await
    }

    /// Active products in active categories matching `term` in name,
    /// description, brand or category name. Case-insensitive, ordered by name.
    pub async fn search(&self, term: &str, limit: u64) -> Result<Vec<ProductModel>, DbErr> {
        let needle = term.to_lowercase();
        // SQLite's LOWER() only folds ASCII.
        if !needle.is_ascii() && self.conn.get_database_backend() == DbBackend::Sqlite {
            return self.search_folding_in_memory(&needle, limit).await;
        }

        let pattern = format!("%{}%", escape_like(&needle));

        Product::find()
            .join(JoinType::InnerJoin, product::Relation::Category.def())
            .filter(product::Column::Status.eq(RecordStatus::Active))
            .filter(category::Column::Status.eq(RecordStatus::Active))
            .filter(
                Condition::any()
                    .add(lower_like((Product, product::Column::Name), &pattern))
                    .add(lower_like((Product, product::Column::Description), &pattern))
                    .add(lower_like((Product, product::Column::Brand), &pattern))
                    .add(lower_like((Category, category::Column::Name), &pattern)),
            )
            .order_by_asc(product::Column::Name)
            .order_by_asc(product::Column::Id)
            .limit(limit)
            .all(self.conn)
            .await
    }

    async fn search_folding_in_memory(
        &self,
        needle: &str,
        limit: u64,
    ) -> Result<Vec<ProductModel>, DbErr> {
        let contains = |text: Option<&str>| text.map_or(false, |t| t.to_lowercase().contains(needle));

        let rows = Product::find()
            .find_also_related(Category)
            .filter(product::Column::Status.eq(RecordStatus::Active))
            .filter(category::Column::Status.eq(RecordStatus::Active))
            .order_by_asc(product::Column::Name)
            .order_by_asc(product::Column::Id)
            .all(self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .filter(|(product, category)| {
                contains(Some(&product.name))
                    || contains(product.description.as_deref())
                    || contains(product.brand.as_deref())
                    || contains(category.as_ref().map(|c| c.name.as_str()))
            })
            .map(|(product, _)| product)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    pub async fn insert(&self, model: product::ActiveModel) -> Result<ProductModel, DbErr> {
        model.insert(self.conn).await
    }

    pub async fn update(&self, model: product::ActiveModel) -> Result<ProductModel, DbErr> {
        model.update(self.conn).await
    }

    /// Takes `quantity` units off an active product, only if that leaves the
    /// stock non-negative. Returns whether a row was changed.
    pub async fn decrement_stock(&self, id: i32, quantity: i32) -> Result<bool, DbErr> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(product::Column::LastUpdate, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Status.eq(RecordStatus::Active))
            .filter(product::Column::Stock.gte(quantity))
            .exec(self.conn)
            .await?;

        Ok(result.rows_affected == 1)
    }
}
