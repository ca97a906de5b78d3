//! `stockroom-core`: identifiers, errors and record traits shared by every
//! stockroom crate. No I/O lives here.

pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ArticleId, CategoryId, InventoryId};
pub use value_object::ValueObject;
pub use version::ExpectedVersion;
