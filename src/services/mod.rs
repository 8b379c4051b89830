//! Business operations. Handlers call these; these call the repositories.

pub mod categories;
pub mod clients;
pub mod products;
pub mod sales;

pub use categories::CategoryService;
pub use clients::ClientService;
pub use products::ProductService;
pub use sales::SaleService;
