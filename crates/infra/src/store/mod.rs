//! Catalog persistence: repository traits and their backends.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod repository;

pub use in_memory::InMemoryCatalogStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresCatalogStore;
pub use repository::{
    ArticleRepository, CatalogStore, CategoryRepository, DeleteOutcome, InventoryRepository,
    StockLedger, StoreError, StoreResult,
};
