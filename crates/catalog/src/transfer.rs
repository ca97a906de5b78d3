//! Stock transfer: moving article stock into an owner's inventory.
//!
//! [`plan`] is the pure decision step. Stores call it while holding whatever
//! guarantees atomicity for them (a write lock, a database transaction) and
//! then persist both returned records together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{ArticleId, DomainError, DomainResult};

use crate::article::Article;
use crate::inventory::Inventory;

/// A validated request to move `quantity` units of `article` to `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub article: ArticleId,
    pub owner: String,
    pub quantity: u32,
}

/// Both records as they must be persisted once the transfer is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOutcome {
    pub article: Article,
    pub inventory: Inventory,
    /// True when no inventory existed for the owner and one was created.
    pub created_inventory: bool,
}

/// Apply a transfer to in-memory copies of the records involved.
///
/// `inventory` is the owner's current inventory, if one exists. Nothing is
/// returned on failure, so callers have nothing to persist.
pub fn plan(
    article: &Article,
    inventory: Option<Inventory>,
    request: &TransferRequest,
    now: DateTime<Utc>,
) -> DomainResult<TransferOutcome> {
    if article.id != request.article {
        return Err(DomainError::invariant("transfer article mismatch"));
    }
    if let Some(inv) = &inventory {
        if inv.owner != request.owner {
            return Err(DomainError::invariant("transfer owner mismatch"));
        }
    }

    let mut article = article.clone();
    article.withdraw(request.quantity, now)?;

    let created_inventory = inventory.is_none();
    let mut inventory = inventory.unwrap_or_else(|| Inventory::create(request.owner.clone(), now));
    inventory.receive(article.id, request.quantity, now)?;

    Ok(TransferOutcome {
        article,
        inventory,
        created_inventory,
    })
}
