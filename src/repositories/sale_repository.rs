use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DbErr, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder,
};

use super::Page;
use crate::entities::sale::{self, Entity as Sale, Model as SaleModel};
use crate::entities::sale_item::{self, Entity as SaleItem, Model as SaleItemModel};

pub struct SaleRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> SaleRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn insert_header(&self, model: sale::ActiveModel) -> Result<SaleModel, DbErr> {
        model.insert(self.conn).await
    }

    /// Inserts every line in one statement.
    pub async fn insert_items(&self, items: Vec<sale_item::ActiveModel>) -> Result<u64, DbErr> {
        if items.is_empty() {
            return Ok(0);
        }
        SaleItem::insert_many(items)
            .exec_without_returning(self.conn)
            .await
    }

    pub async fn find_with_items(
        &self,
        id: i32,
    ) -> Result<Option<(SaleModel, Vec<SaleItemModel>)>, DbErr> {
        let Some(header) = Sale::find_by_id(id).one(self.conn).await? else {
            return Ok(None);
        };
        let items = header
            .find_related(SaleItem)
            .order_by_asc(sale_item::Column::ProductId)
            .all(self.conn)
            .await?;
        Ok(Some((header, items)))
    }

    /// Headers newest first. `page` is 1-based.
    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<SaleModel>, DbErr> {
        let paginator = Sale::find()
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .paginate(self.conn, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page { items, total })
    }
}
