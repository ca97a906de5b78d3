use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_catalog::{
    Article, Category, Inventory, InventoryLine, TransferOutcome, TransferRequest,
};
use stockroom_core::{ArticleId, CategoryId, DomainError, ExpectedVersion, InventoryId};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// Deterministic domain failure (not found, stale version, insufficient stock, ...).
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The backend could not serve the request.
    #[error("store backend failure: {0}")]
    Backend(String),

    #[cfg(feature = "postgres")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// The domain error carried by this failure, if it is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            StoreError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

/// Result of a dependent-gated delete.
///
/// The dependent check and the delete happen as one step, so `Blocked`
/// lists exactly the records that prevented the delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome<D> {
    Deleted,
    Blocked(Vec<D>),
    NotFound,
}

impl<D> DeleteOutcome<D> {
    pub fn is_deleted(&self) -> bool {
        matches!(self, DeleteOutcome::Deleted)
    }
}

#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories, sorted by name ascending.
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    /// Persist a new category; returns the stored record (version 1).
    async fn insert_category(&self, category: Category) -> StoreResult<Category>;
    /// Full-record replace guarded by `expected`.
    async fn update_category(
        &self,
        category: Category,
        expected: ExpectedVersion,
    ) -> StoreResult<Category>;
    /// Delete unless any article still references the category.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<DeleteOutcome<Article>>;
}

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// All articles, sorted by name ascending.
    async fn list_articles(&self) -> StoreResult<Vec<Article>>;
    async fn get_article(&self, id: ArticleId) -> StoreResult<Option<Article>>;
    /// Articles referencing `category`, sorted by name ascending.
    async fn articles_in_category(&self, category: CategoryId) -> StoreResult<Vec<Article>>;
    async fn insert_article(&self, article: Article) -> StoreResult<Article>;
    async fn update_article(
        &self,
        article: Article,
        expected: ExpectedVersion,
    ) -> StoreResult<Article>;
    /// Delete unless any inventory holds a line for the article.
    async fn delete_article(&self, id: ArticleId) -> StoreResult<DeleteOutcome<Inventory>>;
}

#[async_trait]
pub trait InventoryRepository: Send + Sync {
    /// All inventories, sorted by owner ascending.
    async fn list_inventories(&self) -> StoreResult<Vec<Inventory>>;
    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>>;
    /// The earliest-created inventory belonging to `owner`.
    async fn find_inventory_by_owner(&self, owner: &str) -> StoreResult<Option<Inventory>>;
    /// Inventories holding a line for `article`, sorted by owner ascending.
    async fn inventories_holding(&self, article: ArticleId) -> StoreResult<Vec<Inventory>>;
    async fn insert_inventory(&self, inventory: Inventory) -> StoreResult<Inventory>;
    /// Delete unless the inventory still holds lines.
    async fn delete_inventory(&self, id: InventoryId)
    -> StoreResult<DeleteOutcome<InventoryLine>>;
}

#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Move stock from an article into the owner's inventory.
    ///
    /// Both records are written atomically: on any error neither write is
    /// visible.
    async fn transfer_stock(&self, request: TransferRequest) -> StoreResult<TransferOutcome>;
}

/// Everything the catalog application needs from a backend.
pub trait CatalogStore:
    CategoryRepository + ArticleRepository + InventoryRepository + StockLedger
{
}

impl<T> CatalogStore for T where
    T: CategoryRepository + ArticleRepository + InventoryRepository + StockLedger
{
}

// Shared-ownership forwarding, so `Arc<Store>` can be handed around as a store.

#[async_trait]
impl<S> CategoryRepository for Arc<S>
where
    S: CategoryRepository + ?Sized,
{
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        (**self).list_categories().await
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        (**self).get_category(id).await
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        (**self).insert_category(category).await
    }

    async fn update_category(
        &self,
        category: Category,
        expected: ExpectedVersion,
    ) -> StoreResult<Category> {
        (**self).update_category(category, expected).await
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<DeleteOutcome<Article>> {
        (**self).delete_category(id).await
    }
}

#[async_trait]
impl<S> ArticleRepository for Arc<S>
where
    S: ArticleRepository + ?Sized,
{
    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        (**self).list_articles().await
    }

    async fn get_article(&self, id: ArticleId) -> StoreResult<Option<Article>> {
        (**self).get_article(id).await
    }

    async fn articles_in_category(&self, category: CategoryId) -> StoreResult<Vec<Article>> {
        (**self).articles_in_category(category).await
    }

    async fn insert_article(&self, article: Article) -> StoreResult<Article> {
        (**self).insert_article(article).await
    }

    async fn update_article(
        &self,
        article: Article,
        expected: ExpectedVersion,
    ) -> StoreResult<Article> {
        (**self).update_article(article, expected).await
    }

    async fn delete_article(&self, id: ArticleId) -> StoreResult<DeleteOutcome<Inventory>> {
        (**self).delete_article(id).await
    }
}

#[async_trait]
impl<S> InventoryRepository for Arc<S>
where
    S: InventoryRepository + ?Sized,
{
    async fn list_inventories(&self) -> StoreResult<Vec<Inventory>> {
        (**self).list_inventories().await
    }

    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        (**self).get_inventory(id).await
    }

    async fn find_inventory_by_owner(&self, owner: &str) -> StoreResult<Option<Inventory>> {
        (**self).find_inventory_by_owner(owner).await
    }

    async fn inventories_holding(&self, article: ArticleId) -> StoreResult<Vec<Inventory>> {
        (**self).inventories_holding(article).await
    }

    async fn insert_inventory(&self, inventory: Inventory) -> StoreResult<Inventory> {
        (**self).insert_inventory(inventory).await
    }

    async fn delete_inventory(
        &self,
        id: InventoryId,
    ) -> StoreResult<DeleteOutcome<InventoryLine>> {
        (**self).delete_inventory(id).await
    }
}

#[async_trait]
impl<S> StockLedger for Arc<S>
where
    S: StockLedger + ?Sized,
{
    async fn transfer_stock(&self, request: TransferRequest) -> StoreResult<TransferOutcome> {
        (**self).transfer_stock(request).await
    }
}
