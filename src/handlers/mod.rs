pub mod categories;
pub mod clients;
pub mod common;
pub mod products;
pub mod sales;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{CategoryService, ClientService, ProductService, SaleService};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer used by the HTTP handlers.
#[derive(Clone)]
pub struct AppServices {
    pub categories: Arc<CategoryService>,
    pub products: Arc<ProductService>,
    pub clients: Arc<ClientService>,
    pub sales: Arc<SaleService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>, config: &AppConfig) -> Self {
        Self {
            categories: Arc::new(CategoryService::new(db_pool.clone())),
            products: Arc::new(ProductService::new(
                db_pool.clone(),
                config.product_search_limit,
            )),
            clients: Arc::new(ClientService::new(db_pool.clone())),
            sales: Arc::new(SaleService::from_config(db_pool, config)),
        }
    }
}
