//! Postgres-backed catalog store.
//!
//! ## Atomicity
//!
//! Every multi-statement operation runs inside one transaction. Stock
//! transfers lock the article row (`FOR UPDATE`), serialize on the owner with
//! a transaction-scoped advisory lock, then lock the owner's inventory row, so
//! concurrent transfers can neither over-draw stock nor lose line updates.
//!
//! ## Dependent-gated deletes
//!
//! The parent row is locked `FOR UPDATE` before dependents are counted.
//! Foreign-key checks on concurrent inserts take `KEY SHARE` locks on the
//! parent, so no new dependent can slip in between the check and the delete.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{PgConnection, Row};
use tracing::instrument;
use uuid::Uuid;

use stockroom_catalog::{
    transfer, Article, Category, Inventory, InventoryLine, Price, TransferOutcome,
    TransferRequest,
};
use stockroom_core::{ArticleId, CategoryId, DomainError, ExpectedVersion, InventoryId};

use super::repository::{
    ArticleRepository, CategoryRepository, DeleteOutcome, InventoryRepository, StockLedger,
    StoreError, StoreResult,
};

const SCHEMA: &str = include_str!("../../migrations/0001_catalog.sql");

const CATEGORY_COLUMNS: &str = "id, name, description, examples, version, created_at, updated_at";
const ARTICLE_COLUMNS: &str = "id, name, short_description, category_id, price_cents, \
     stock_number, detail_description, version, created_at, updated_at";
const INVENTORY_COLUMNS: &str = "id, owner, version, created_at, updated_at";

/// Postgres catalog store.
///
/// Uses an SQLx connection pool (thread-safe, cheap to clone).
#[derive(Debug, Clone)]
pub struct PostgresCatalogStore {
    pool: Arc<PgPool>,
}

impl PostgresCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the schema exists.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply the catalog schema (idempotent).
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&*self.pool).await?;
        tracing::info!("catalog schema ready");
        Ok(())
    }
}

// -------------------------
// Row mapping
// -------------------------

fn to_u64(value: i64, column: &str) -> StoreResult<u64> {
    u64::try_from(value).map_err(|_| StoreError::backend(format!("negative {column}: {value}")))
}

fn to_u32(value: i64, column: &str) -> StoreResult<u32> {
    u32::try_from(value).map_err(|_| StoreError::backend(format!("{column} out of range: {value}")))
}

fn to_i64(value: u64, column: &str) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::backend(format!("{column} out of range: {value}")))
}

fn category_from_row(row: &PgRow) -> StoreResult<Category> {
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        examples: row.try_get("examples")?,
        version: to_u64(row.try_get("version")?, "version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn article_from_row(row: &PgRow) -> StoreResult<Article> {
    Ok(Article {
        id: ArticleId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        short_description: row.try_get("short_description")?,
        category: CategoryId::from_uuid(row.try_get("category_id")?),
        price: Price::from_cents(to_u64(row.try_get("price_cents")?, "price_cents")?),
        stock_number: to_u32(row.try_get("stock_number")?, "stock_number")?,
        detail_description: row.try_get("detail_description")?,
        version: to_u64(row.try_get("version")?, "version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn inventory_from_row(row: &PgRow) -> StoreResult<Inventory> {
    Ok(Inventory {
        id: InventoryId::from_uuid(row.try_get("id")?),
        owner: row.try_get("owner")?,
        articles: Vec::new(),
        version: to_u64(row.try_get("version")?, "version")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Map inventory rows and load their lines in one extra query.
async fn hydrate_inventories(
    conn: &mut PgConnection,
    rows: &[PgRow],
) -> StoreResult<Vec<Inventory>> {
    let mut inventories = rows
        .iter()
        .map(inventory_from_row)
        .collect::<StoreResult<Vec<_>>>()?;
    if inventories.is_empty() {
        return Ok(inventories);
    }

    let ids: Vec<Uuid> = inventories.iter().map(|i| *i.id.as_uuid()).collect();
    let line_rows = sqlx::query(
        "SELECT inventory_id, article_id, quantity FROM inventory_lines \
         WHERE inventory_id = ANY($1) ORDER BY inventory_id, position",
    )
    .bind(&ids[..])
    .fetch_all(&mut *conn)
    .await?;

    let mut by_inventory: HashMap<Uuid, Vec<InventoryLine>> = HashMap::new();
    for row in &line_rows {
        let inventory_id: Uuid = row.try_get("inventory_id")?;
        by_inventory
            .entry(inventory_id)
            .or_default()
            .push(InventoryLine {
                article: ArticleId::from_uuid(row.try_get("article_id")?),
                quantity: to_u32(row.try_get("quantity")?, "quantity")?,
            });
    }

    for inventory in &mut inventories {
        inventory.articles = by_inventory
            .remove(inventory.id.as_uuid())
            .unwrap_or_default();
    }
    Ok(inventories)
}

async fn upsert_line(
    conn: &mut PgConnection,
    inventory: InventoryId,
    position: usize,
    line: &InventoryLine,
) -> StoreResult<()> {
    let position = i32::try_from(position)
        .map_err(|_| StoreError::backend("inventory has too many lines"))?;
    sqlx::query(
        "INSERT INTO inventory_lines (inventory_id, article_id, position, quantity) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (inventory_id, article_id) DO UPDATE SET quantity = EXCLUDED.quantity",
    )
    .bind(inventory.as_uuid())
    .bind(line.article.as_uuid())
    .bind(position)
    .bind(i64::from(line.quantity))
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Lock a row and return its current version, or `NotFound`.
async fn lock_version(conn: &mut PgConnection, table: &str, id: &Uuid) -> StoreResult<u64> {
    let sql = format!("SELECT version FROM {table} WHERE id = $1 FOR UPDATE");
    let version: Option<i64> = sqlx::query_scalar(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    to_u64(version.ok_or(DomainError::NotFound)?, "version")
}

// -------------------------
// Repositories
// -------------------------

#[async_trait]
impl CategoryRepository for PostgresCatalogStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name, id");
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
        rows.iter().map(category_from_row).collect()
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let sql = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(category_from_row).transpose()
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn insert_category(&self, mut category: Category) -> StoreResult<Category> {
        category.version = 1;
        sqlx::query(
            "INSERT INTO categories (id, name, description, examples, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.examples)
        .bind(to_i64(category.version, "version")?)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(category)
    }

    #[instrument(skip(self, category), fields(category_id = %category.id))]
    async fn update_category(
        &self,
        mut category: Category,
        expected: ExpectedVersion,
    ) -> StoreResult<Category> {
        let mut tx = self.pool.begin().await?;
        let current = lock_version(&mut tx, "categories", category.id.as_uuid()).await?;
        expected.check(current)?;
        category.version = current + 1;

        sqlx::query(
            "UPDATE categories SET name = $2, description = $3, examples = $4, \
             version = $5, updated_at = $6 WHERE id = $1",
        )
        .bind(category.id.as_uuid())
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.examples)
        .bind(to_i64(category.version, "version")?)
        .bind(category.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(category)
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<DeleteOutcome<Article>> {
        let mut tx = self.pool.begin().await?;
        match lock_version(&mut tx, "categories", id.as_uuid()).await {
            Ok(_) => {}
            Err(StoreError::Domain(DomainError::NotFound)) => return Ok(DeleteOutcome::NotFound),
            Err(e) => return Err(e),
        }

        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE category_id = $1 ORDER BY name, id"
        );
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        if !rows.is_empty() {
            let dependents = rows.iter().map(article_from_row).collect::<StoreResult<_>>()?;
            return Ok(DeleteOutcome::Blocked(dependents));
        }

        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl ArticleRepository for PostgresCatalogStore {
    async fn list_articles(&self) -> StoreResult<Vec<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles ORDER BY name, id");
        let rows = sqlx::query(&sql).fetch_all(&*self.pool).await?;
        rows.iter().map(article_from_row).collect()
    }

    async fn get_article(&self, id: ArticleId) -> StoreResult<Option<Article>> {
        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(article_from_row).transpose()
    }

    async fn articles_in_category(&self, category: CategoryId) -> StoreResult<Vec<Article>> {
        let sql = format!(
            "SELECT {ARTICLE_COLUMNS} FROM articles WHERE category_id = $1 ORDER BY name, id"
        );
        let rows = sqlx::query(&sql)
            .bind(category.as_uuid())
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(article_from_row).collect()
    }

    #[instrument(skip(self, article), fields(article_id = %article.id))]
    async fn insert_article(&self, mut article: Article) -> StoreResult<Article> {
        article.version = 1;
        sqlx::query(
            "INSERT INTO articles (id, name, short_description, category_id, price_cents, \
             stock_number, detail_description, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(article.id.as_uuid())
        .bind(&article.name)
        .bind(&article.short_description)
        .bind(article.category.as_uuid())
        .bind(to_i64(article.price.cents(), "price_cents")?)
        .bind(i64::from(article.stock_number))
        .bind(&article.detail_description)
        .bind(to_i64(article.version, "version")?)
        .bind(article.created_at)
        .bind(article.updated_at)
        .execute(&*self.pool)
        .await?;
        Ok(article)
    }

    #[instrument(skip(self, article), fields(article_id = %article.id))]
    async fn update_article(
        &self,
        mut article: Article,
        expected: ExpectedVersion,
    ) -> StoreResult<Article> {
        let mut tx = self.pool.begin().await?;
        let current = lock_version(&mut tx, "articles", article.id.as_uuid()).await?;
        expected.check(current)?;
        article.version = current + 1;

        sqlx::query(
            "UPDATE articles SET name = $2, short_description = $3, category_id = $4, \
             price_cents = $5, stock_number = $6, detail_description = $7, version = $8, \
             updated_at = $9 WHERE id = $1",
        )
        .bind(article.id.as_uuid())
        .bind(&article.name)
        .bind(&article.short_description)
        .bind(article.category.as_uuid())
        .bind(to_i64(article.price.cents(), "price_cents")?)
        .bind(i64::from(article.stock_number))
        .bind(&article.detail_description)
        .bind(to_i64(article.version, "version")?)
        .bind(article.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(article)
    }

    #[instrument(skip(self))]
    async fn delete_article(&self, id: ArticleId) -> StoreResult<DeleteOutcome<Inventory>> {
        let mut tx = self.pool.begin().await?;
        match lock_version(&mut tx, "articles", id.as_uuid()).await {
            Ok(_) => {}
            Err(StoreError::Domain(DomainError::NotFound)) => return Ok(DeleteOutcome::NotFound),
            Err(e) => return Err(e),
        }

        let sql = format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories i WHERE EXISTS \
             (SELECT 1 FROM inventory_lines l WHERE l.inventory_id = i.id AND l.article_id = $1) \
             ORDER BY owner, id"
        );
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        if !rows.is_empty() {
            let holders = hydrate_inventories(&mut tx, &rows).await?;
            return Ok(DeleteOutcome::Blocked(holders));
        }

        sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl InventoryRepository for PostgresCatalogStore {
    async fn list_inventories(&self) -> StoreResult<Vec<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventories ORDER BY owner, id");
        let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;
        hydrate_inventories(&mut conn, &rows).await
    }

    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = $1");
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *conn)
            .await?;
        Ok(hydrate_inventories(&mut conn, &rows).await?.into_iter().next())
    }

    async fn find_inventory_by_owner(&self, owner: &str) -> StoreResult<Option<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE owner = $1 \
             ORDER BY created_at, id LIMIT 1"
        );
        let rows = sqlx::query(&sql).bind(owner).fetch_all(&mut *conn).await?;
        Ok(hydrate_inventories(&mut conn, &rows).await?.into_iter().next())
    }

    async fn inventories_holding(&self, article: ArticleId) -> StoreResult<Vec<Inventory>> {
        let mut conn = self.pool.acquire().await?;
        let sql = format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories i WHERE EXISTS \
             (SELECT 1 FROM inventory_lines l WHERE l.inventory_id = i.id AND l.article_id = $1) \
             ORDER BY owner, id"
        );
        let rows = sqlx::query(&sql)
            .bind(article.as_uuid())
            .fetch_all(&mut *conn)
            .await?;
        hydrate_inventories(&mut conn, &rows).await
    }

    #[instrument(skip(self, inventory), fields(inventory_id = %inventory.id))]
    async fn insert_inventory(&self, mut inventory: Inventory) -> StoreResult<Inventory> {
        inventory.version = 1;
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO inventories (id, owner, version, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(inventory.id.as_uuid())
        .bind(&inventory.owner)
        .bind(to_i64(inventory.version, "version")?)
        .bind(inventory.created_at)
        .bind(inventory.updated_at)
        .execute(&mut *tx)
        .await?;
        for (position, line) in inventory.articles.iter().enumerate() {
            upsert_line(&mut tx, inventory.id, position, line).await?;
        }
        tx.commit().await?;
        Ok(inventory)
    }

    #[instrument(skip(self))]
    async fn delete_inventory(
        &self,
        id: InventoryId,
    ) -> StoreResult<DeleteOutcome<InventoryLine>> {
        let mut tx = self.pool.begin().await?;
        let sql = format!("SELECT {INVENTORY_COLUMNS} FROM inventories WHERE id = $1 FOR UPDATE");
        let rows = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let Some(inventory) = hydrate_inventories(&mut tx, &rows).await?.into_iter().next() else {
            return Ok(DeleteOutcome::NotFound);
        };
        if !inventory.is_empty() {
            return Ok(DeleteOutcome::Blocked(inventory.articles));
        }

        sqlx::query("DELETE FROM inventories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl StockLedger for PostgresCatalogStore {
    #[instrument(skip(self, request), fields(article_id = %request.article, quantity = request.quantity))]
    async fn transfer_stock(&self, request: TransferRequest) -> StoreResult<TransferOutcome> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ARTICLE_COLUMNS} FROM articles WHERE id = $1 FOR UPDATE");
        let article = sqlx::query(&sql)
            .bind(request.article.as_uuid())
            .fetch_optional(&mut *tx)
            .await?
            .as_ref()
            .map(article_from_row)
            .transpose()?
            .ok_or(DomainError::NotFound)?;

        // Owners are not unique; serialize find-or-create per owner name.
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(&request.owner)
            .execute(&mut *tx)
            .await?;

        let sql = format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventories WHERE owner = $1 \
             ORDER BY created_at, id LIMIT 1 FOR UPDATE"
        );
        let rows = sqlx::query(&sql)
            .bind(&request.owner)
            .fetch_all(&mut *tx)
            .await?;
        let inventory = hydrate_inventories(&mut tx, &rows).await?.into_iter().next();

        let mut outcome = transfer::plan(&article, inventory, &request, Utc::now())?;
        outcome.article.version += 1;
        outcome.inventory.version += 1;

        sqlx::query(
            "UPDATE articles SET stock_number = $2, version = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(outcome.article.id.as_uuid())
        .bind(i64::from(outcome.article.stock_number))
        .bind(to_i64(outcome.article.version, "version")?)
        .bind(outcome.article.updated_at)
        .execute(&mut *tx)
        .await?;

        if outcome.created_inventory {
            sqlx::query(
                "INSERT INTO inventories (id, owner, version, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(outcome.inventory.id.as_uuid())
            .bind(&outcome.inventory.owner)
            .bind(to_i64(outcome.inventory.version, "version")?)
            .bind(outcome.inventory.created_at)
            .bind(outcome.inventory.updated_at)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query("UPDATE inventories SET version = $2, updated_at = $3 WHERE id = $1")
                .bind(outcome.inventory.id.as_uuid())
                .bind(to_i64(outcome.inventory.version, "version")?)
                .bind(outcome.inventory.updated_at)
                .execute(&mut *tx)
                .await?;
        }

        let (position, line) = outcome
            .inventory
            .articles
            .iter()
            .enumerate()
            .find(|(_, l)| l.article == outcome.article.id)
            .ok_or_else(|| DomainError::invariant("transferred line missing from inventory"))?;
        upsert_line(&mut tx, outcome.inventory.id, position, line).await?;

        tx.commit().await?;
        Ok(outcome)
    }
}
