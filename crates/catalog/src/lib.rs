//! Catalog domain module.
//!
//! Categories, articles and inventories, the validation pipeline applied to
//! inbound form data, and the stock-transfer rule that moves article stock
//! into an owner's inventory. Everything here is deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod article;
pub mod category;
pub mod inventory;
pub mod price;
pub mod transfer;
pub mod validation;

pub use article::{Article, ArticleDraft};
pub use category::{Category, CategoryDraft};
pub use inventory::{Inventory, InventoryLine};
pub use price::Price;
pub use transfer::{TransferOutcome, TransferRequest};
pub use validation::{FieldError, ValidationErrors};
