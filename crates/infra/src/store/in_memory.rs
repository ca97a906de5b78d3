use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use stockroom_catalog::{
    transfer, Article, Category, Inventory, InventoryLine, TransferOutcome, TransferRequest,
};
use stockroom_core::{
    ArticleId, CategoryId, DomainError, Entity, ExpectedVersion, InventoryId,
};

use super::repository::{
    ArticleRepository, CategoryRepository, DeleteOutcome, InventoryRepository, StockLedger,
    StoreError, StoreResult,
};

#[derive(Debug, Default)]
struct Tables {
    categories: HashMap<CategoryId, Category>,
    articles: HashMap<ArticleId, Article>,
    inventories: HashMap<InventoryId, Inventory>,
}

impl Tables {
    fn articles_in(&self, category: CategoryId) -> Vec<Article> {
        let mut out: Vec<Article> = self
            .articles
            .values()
            .filter(|a| a.category == category)
            .cloned()
            .collect();
        sort_articles(&mut out);
        out
    }

    fn holders_of(&self, article: ArticleId) -> Vec<Inventory> {
        let mut out: Vec<Inventory> = self
            .inventories
            .values()
            .filter(|i| i.holds(article))
            .cloned()
            .collect();
        sort_inventories(&mut out);
        out
    }

    fn first_owned_by(&self, owner: &str) -> Option<&Inventory> {
        self.inventories
            .values()
            .filter(|i| i.owner == owner)
            .min_by_key(|i| (i.created_at, i.id))
    }
}

fn sort_articles(v: &mut [Article]) {
    v.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
}

fn sort_inventories(v: &mut [Inventory]) {
    v.sort_by(|a, b| a.owner.cmp(&b.owner).then(a.id.cmp(&b.id)));
}

/// Replace a stored record, enforcing the caller's version expectation.
fn replace<V>(
    map: &mut HashMap<V::Id, V>,
    mut value: V,
    expected: ExpectedVersion,
    set_version: impl Fn(&mut V, u64),
) -> StoreResult<V>
where
    V: Entity + Clone,
{
    let key = value.id().clone();
    let current = map.get(&key).ok_or(DomainError::NotFound)?;
    let current_version = current.version();
    expected.check(current_version)?;
    set_version(&mut value, current_version + 1);
    map.insert(key, value.clone());
    Ok(value)
}

/// In-memory catalog store for tests/dev.
///
/// A single lock guards all three tables, so multi-record operations
/// (transfers, dependent-gated deletes) are atomic.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<Tables>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::backend("lock poisoned"))
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCatalogStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let tables = self.read()?;
        let mut out: Vec<Category> = tables.categories.values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn insert_category(&self, mut category: Category) -> StoreResult<Category> {
        let mut tables = self.write()?;
        if tables.categories.contains_key(&category.id) {
            return Err(DomainError::conflict("category already exists").into());
        }
        category.version = 1;
        tables.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        category: Category,
        expected: ExpectedVersion,
    ) -> StoreResult<Category> {
        let mut tables = self.write()?;
        replace(
            &mut tables.categories,
            category,
            expected,
            |c, v| c.version = v,
        )
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<DeleteOutcome<Article>> {
        let mut tables = self.write()?;
        if !tables.categories.contains_key(&id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let dependents = tables.articles_in(id);
        if !dependents.is_empty() {
            return Ok(DeleteOutcome::Blocked(dependents));
        }
        tables.categories.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl ArticleRepository for InMemoryCatalogStore {
    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        let mut out: Vec<Article> = self.read()?.articles.values().cloned().collect();
        sort_articles(&mut out);
        Ok(out)
    }

    async fn get_article(&self, id: ArticleId) -> StoreResult<Option<Article>> {
        Ok(self.read()?.articles.get(&id).cloned())
    }

    async fn articles_in_category(&self, category: CategoryId) -> StoreResult<Vec<Article>> {
        Ok(self.read()?.articles_in(category))
    }

    async fn insert_article(&self, mut article: Article) -> StoreResult<Article> {
        let mut tables = self.write()?;
        if tables.articles.contains_key(&article.id) {
            return Err(DomainError::conflict("article already exists").into());
        }
        article.version = 1;
        tables.articles.insert(article.id, article.clone());
        Ok(article)
    }

    async fn update_article(
        &self,
        article: Article,
        expected: ExpectedVersion,
    ) -> StoreResult<Article> {
        let mut tables = self.write()?;
        replace(
            &mut tables.articles,
            article,
            expected,
            |a, v| a.version = v,
        )
    }

    async fn delete_article(&self, id: ArticleId) -> StoreResult<DeleteOutcome<Inventory>> {
        let mut tables = self.write()?;
        if !tables.articles.contains_key(&id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let holders = tables.holders_of(id);
        if !holders.is_empty() {
            return Ok(DeleteOutcome::Blocked(holders));
        }
        tables.articles.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl InventoryRepository for InMemoryCatalogStore {
    async fn list_inventories(&self) -> StoreResult<Vec<Inventory>> {
        let mut out: Vec<Inventory> = self.read()?.inventories.values().cloned().collect();
        sort_inventories(&mut out);
        Ok(out)
    }

    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        Ok(self.read()?.inventories.get(&id).cloned())
    }

    async fn find_inventory_by_owner(&self, owner: &str) -> StoreResult<Option<Inventory>> {
        Ok(self.read()?.first_owned_by(owner).cloned())
    }

    async fn inventories_holding(&self, article: ArticleId) -> StoreResult<Vec<Inventory>> {
        Ok(self.read()?.holders_of(article))
    }

    async fn insert_inventory(&self, mut inventory: Inventory) -> StoreResult<Inventory> {
        let mut tables = self.write()?;
        if tables.inventories.contains_key(&inventory.id) {
            return Err(DomainError::conflict("inventory already exists").into());
        }
        inventory.version = 1;
        tables.inventories.insert(inventory.id, inventory.clone());
        Ok(inventory)
    }

    async fn delete_inventory(
        &self,
        id: InventoryId,
    ) -> StoreResult<DeleteOutcome<InventoryLine>> {
        let mut tables = self.write()?;
        let Some(inventory) = tables.inventories.get(&id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !inventory.is_empty() {
            return Ok(DeleteOutcome::Blocked(inventory.articles.clone()));
        }
        tables.inventories.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl StockLedger for InMemoryCatalogStore {
    async fn transfer_stock(&self, request: TransferRequest) -> StoreResult<TransferOutcome> {
        let mut tables = self.write()?;

        let article = tables
            .articles
            .get(&request.article)
            .ok_or(DomainError::NotFound)?;
        let inventory = tables.first_owned_by(&request.owner).cloned();

        // Nothing below this point can fail, so both writes land together.
        let mut outcome = transfer::plan(article, inventory, &request, Utc::now())?;

        outcome.article.version += 1;
        outcome.inventory.version += 1;
        tables
            .articles
            .insert(outcome.article.id, outcome.article.clone());
        tables
            .inventories
            .insert(outcome.inventory.id, outcome.inventory.clone());

        tracing::debug!(
            article_id = %outcome.article.id,
            inventory_id = %outcome.inventory.id,
            quantity = request.quantity,
            "in-memory transfer applied"
        );
        Ok(outcome)
    }
}
