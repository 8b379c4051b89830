use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};

use crate::entities::client::{self, Entity as Client, Model as ClientModel};
use crate::entities::sale;

pub struct ClientRepository<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> ClientRepository<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<ClientModel>, DbErr> {
        Client::find_by_id(id).one(self.conn).await
    }

    pub async fn find_by_tax_document(
        &self,
        tax_document: &str,
        exclude_id: Option<i32>,
    ) -> Result<Option<ClientModel>, DbErr> {
        let mut query = Client::find().filter(client::Column::TaxDocument.eq(tax_document));
        if let Some(id) = exclude_id {
            query = query.filter(client::Column::Id.ne(id));
        }
        query.one(self.conn).await
    }

    pub async fn list(&self) -> Result<Vec<ClientModel>, DbErr> {
        Client::find()
            .order_by_asc(client::Column::BusinessName)
            .all(self.conn)
            .await
    }

    /// Number of sales that reference the client.
    pub async fn count_sales(&self, client_id: i32) -> Result<u64, DbErr> {
        sale::Entity::find()
            .filter(sale::Column::ClientId.eq(client_id))
            .count(self.conn)
            .await
    }

    pub async fn insert(&self, model: client::ActiveModel) -> Result<ClientModel, DbErr> {
        model.insert(self.conn).await
    }

    pub async fn update(&self, model: client::ActiveModel) -> Result<ClientModel, DbErr> {
        model.update(self.conn).await
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: i32) -> Result<bool, DbErr> {
        let result = Client::delete_by_id(id).exec(self.conn).await?;
        Ok(result.rows_affected == 1)
    }
}
