use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ArticleId, DomainError, DomainResult, Entity, InventoryId, ValueObject};

use crate::price::Price;

/// Quantity of one article held by an inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLine {
    pub article: ArticleId,
    pub quantity: u32,
}

impl ValueObject for InventoryLine {}

/// An owner's collection of held article quantities.
///
/// Holds at most one line per article; [`Inventory::receive`] merges into an
/// existing line instead of appending a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub owner: String,
    pub articles: Vec<InventoryLine>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// New empty inventory for `owner`.
    pub fn create(owner: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: InventoryId::new(),
            owner: owner.into(),
            articles: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn line_for(&self, article: ArticleId) -> Option<&InventoryLine> {
        self.articles.iter().find(|l| l.article == article)
    }

    pub fn holds(&self, article: ArticleId) -> bool {
        self.line_for(article).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    /// Add `quantity` units of `article`, merging into an existing line.
    pub fn receive(
        &mut self,
        article: ArticleId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        match self.articles.iter_mut().find(|l| l.article == article) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or_else(|| DomainError::invariant("inventory line quantity overflow"))?;
            }
            None => self.articles.push(InventoryLine { article, quantity }),
        }
        self.updated_at = now;
        Ok(())
    }

    /// Total number of units held across all lines.
    pub fn number_of_articles(&self) -> u64 {
        self.articles.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Total holdings value: Σ(quantity × unit price).
    ///
    /// Lines whose article cannot be priced contribute nothing.
    pub fn total_amount<F>(&self, price_of: F) -> Price
    where
        F: Fn(ArticleId) -> Option<Price>,
    {
        self.articles
            .iter()
            .filter_map(|l| price_of(l.article).map(|p| p.times(l.quantity)))
            .sum()
    }

    pub fn url(&self) -> String {
        format!("/catalog/inventory/{}", self.id)
    }
}

impl Entity for Inventory {
    type Id = InventoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_appends_then_merges() {
        let mut inv = Inventory::create("alice", Utc::now());
        let hammer = ArticleId::new();
        let saw = ArticleId::new();

        inv.receive(hammer, 4, Utc::now()).unwrap();
        inv.receive(saw, 1, Utc::now()).unwrap();
        inv.receive(hammer, 3, Utc::now()).unwrap();

        assert_eq!(
            inv.articles,
            vec![
                InventoryLine {
                    article: hammer,
                    quantity: 7
                },
                InventoryLine {
                    article: saw,
                    quantity: 1
                },
            ]
        );
        assert_eq!(inv.number_of_articles(), 8);
    }

    #[test]
    fn receive_rejects_overflow() {
        let mut inv = Inventory::create("bob", Utc::now());
        let a = ArticleId::new();
        inv.receive(a, u32::MAX, Utc::now()).unwrap();
        let err = inv.receive(a, 1, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(inv.line_for(a).unwrap().quantity, u32::MAX);
    }

    #[test]
    fn total_amount_sums_quantity_times_price() {
        let mut inv = Inventory::create("carol", Utc::now());
        let ten = ArticleId::new();
        let five = ArticleId::new();
        inv.receive(ten, 2, Utc::now()).unwrap();
        inv.receive(five, 3, Utc::now()).unwrap();

        let total = inv.total_amount(|id| {
            if id == ten {
                Some(Price::from_cents(1000))
            } else if id == five {
                Some(Price::from_cents(500))
            } else {
                None
            }
        });
        assert_eq!(total, Price::from_cents(3500));
        assert_eq!(total.to_string(), "35.00");
    }

    #[test]
    fn empty_inventory_is_worth_nothing() {
        let inv = Inventory::create("dave", Utc::now());
        assert!(inv.is_empty());
        assert_eq!(inv.total_amount(|_| Some(Price::from_cents(100))), Price::ZERO);
        assert_eq!(inv.number_of_articles(), 0);
    }
}
