use chrono::Utc;
use sea_orm::{ActiveValue::NotSet, DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::client::{self, Model as ClientModel};
use crate::entities::RecordStatus;
use crate::errors::ServiceError;
use crate::repositories::UnitOfWork;
use crate::validation::{trim, trim_optional, NAME_RE, TAX_DOCUMENT_RE};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct ClientInput {
    #[validate(
        length(min = 1, max = 100, message = "must be 1-100 characters"),
        regex(path = "NAME_RE", message = "contains unsupported characters")
    )]
    pub business_name: String,
    #[validate(
        email(message = "must be a valid email address"),
        length(max = 100, message = "must be at most 100 characters")
    )]
    #[serde(default)]
    pub email: Option<String>,
    #[validate(length(max = 200, message = "must be at most 200 characters"))]
    #[serde(default)]
    pub address: Option<String>,
    #[validate(regex(
        path = "TAX_DOCUMENT_RE",
        message = "must be 5-20 letters, digits or dashes"
    ))]
    pub tax_document: String,
    /// Only honoured on update; new clients always start active.
    #[serde(default)]
    pub status: Option<RecordStatus>,
}

impl ClientInput {
    fn normalize(&mut self) {
        trim(&mut self.business_name);
        trim(&mut self.tax_document);
        trim_optional(&mut self.email);
        trim_optional(&mut self.address);
    }
}

#[derive(Clone)]
pub struct ClientService {
    db: Arc<DatabaseConnection>,
}

impl ClientService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, mut input: ClientInput) -> Result<ClientModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        self.ensure_document_free(&uow, &input.tax_document, None).await?;

        let client = uow
            .clients()
            .insert(client::ActiveModel {
                id: NotSet,
                business_name: Set(input.business_name),
                email: Set(input.email),
                address: Set(input.address),
                tax_document: Set(input.tax_document),
                status: Set(RecordStatus::Active),
                last_update: Set(Utc::now()),
            })
            .await?;

        info!(client_id = client.id, "Client created");
        Ok(client)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: i32,
        mut input: ClientInput,
    ) -> Result<ClientModel, ServiceError> {
        input.normalize();
        input.validate()?;

        let uow = UnitOfWork::new(&*self.db);
        let existing = self.get(id).await?;
        self.ensure_document_free(&uow, &input.tax_document, Some(id))
            .await?;

        let mut client: client::ActiveModel = existing.into();
        client.business_name = Set(input.business_name);
        client.email = Set(input.email);
        client.address = Set(input.address);
        client.tax_document = Set(input.tax_document);
        if let Some(status) = input.status {
            client.status = Set(status);
        }

        let client = uow.clients().update(client).await?;
        info!(client_id = id, "Client updated");
        Ok(client)
    }

    pub async fn get(&self, id: i32) -> Result<ClientModel, ServiceError> {
        UnitOfWork::new(&*self.db)
            .clients()
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Client", id))
    }

    pub async fn get_by_tax_document(
        &self,
        tax_document: &str,
    ) -> Result<ClientModel, ServiceError> {
        let tax_document = tax_document.trim();
        UnitOfWork::new(&*self.db)
            .clients()
            .find_by_tax_document(tax_document, None)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Client with tax document {} not found",
                    tax_document
                ))
            })
    }

    pub async fn list(&self) -> Result<Vec<ClientModel>, ServiceError> {
        Ok(UnitOfWork::new(&*self.db).clients().list().await?)
    }

    /// Hard delete, refused while any sale references the client.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: i32) -> Result<(), ServiceError> {
        let uow = UnitOfWork::new(&*self.db);
        self.get(id).await?;

        let sales = uow.clients().count_sales(id).await?;
        if sales > 0 {
            warn!(client_id = id, sales, "Refusing to remove client with sales");
            return Err(ServiceError::Conflict(format!(
                "client {} has {} recorded sale(s) and cannot be removed",
                id, sales
            )));
        }

        if !uow.clients().delete(id).await? {
            return Err(ServiceError::not_found("Client", id));
        }

        info!(client_id = id, "Client removed");
        Ok(())
    }

    async fn ensure_document_free(
        &self,
        uow: &UnitOfWork<'_, DatabaseConnection>,
        tax_document: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError> {
        if uow
            .clients()
            .find_by_tax_document(tax_document, exclude_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "tax document {} is already registered",
                tax_document
            )));
        }
        Ok(())
    }
}
