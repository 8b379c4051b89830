use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};

use crate::entities::category::{self, Entity as Category, Model as CategoryModel};
use crate::entities::RecordStatus;

pub struct CategoryRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> CategoryRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<CategoryModel>, DbErr> {
        Category::find_by_id(id).one(self.conn).await
    }

    /// Looks up a category by name ignoring case, optionally skipping one id
    /// (the row being updated).
    pub async fn find_by_name_ci(
        &self,
        name: &str,
        exclude_id: Option<i32>,
    ) -> Result<Option<CategoryModel>, DbErr> {
        let mut query = Category::find().filter(
            Expr::expr(Func::lower(Expr::col((Category, category::Column::Name))))
                .eq(name.to_lowercase()),
        );
        if let Some(id) = exclude_id {
            query = query.filter(category::Column::Id.ne(id));
        }
        query.one(self.conn).await
    }

    pub async fn list(&self, include_inactive: bool) -> Result<Vec<CategoryModel>, DbErr> {
        let mut query = Category::find();
        if !include_inactive {
            query = query.filter(category::Column::Status.eq(RecordStatus::Active));
        }
        query
            .order_by_asc(category::Column::Name)
            .all(self.conn)
            .await
    }

    pub async fn insert(&self, model: category::ActiveModel) -> Result<CategoryModel, DbErr> {
        model.insert(self.conn).await
    }

    pub async fn update(&self, model: category::ActiveModel) -> Result<CategoryModel, DbErr> {
        model.update(self.conn).await
    }
}
