//! Database entities for the store catalog, clients and sales.

pub mod category;
pub mod client;
pub mod product;
pub mod record_status;
pub mod sale;
pub mod sale_item;

pub use record_status::RecordStatus;
