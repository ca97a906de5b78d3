use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ArticleId, CategoryId, DomainError, DomainResult, Entity};

use crate::price::Price;

/// Validated article fields, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleDraft {
    pub name: String,
    pub short_description: String,
    pub category: CategoryId,
    pub price: Price,
    pub stock_number: u32,
    pub detail_description: String,
}

/// A catalog item with a price and stock available for transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub name: String,
    pub short_description: String,
    pub category: CategoryId,
    pub price: Price,
    pub stock_number: u32,
    pub detail_description: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    pub fn create(draft: ArticleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: ArticleId::new(),
            name: draft.name,
            short_description: draft.short_description,
            category: draft.category,
            price: draft.price,
            stock_number: draft.stock_number,
            detail_description: draft.detail_description,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full-record replace; identity and creation time are kept.
    pub fn replaced_with(&self, draft: ArticleDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            name: draft.name,
            short_description: draft.short_description,
            category: draft.category,
            price: draft.price,
            stock_number: draft.stock_number,
            detail_description: draft.detail_description,
            version: self.version,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    /// Remove `quantity` units from the available stock.
    ///
    /// Fails without touching the article when fewer units are available.
    pub fn withdraw(&mut self, quantity: u32, now: DateTime<Utc>) -> DomainResult<()> {
        if self.stock_number < quantity {
            return Err(DomainError::insufficient_stock(quantity, self.stock_number));
        }
        self.stock_number -= quantity;
        self.updated_at = now;
        Ok(())
    }

    pub fn url(&self) -> String {
        format!("/catalog/article/{}", self.id)
    }
}

impl Entity for Article {
    type Id = ArticleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
