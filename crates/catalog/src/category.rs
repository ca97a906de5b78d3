use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, Entity};

/// Validated category fields, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    pub description: String,
    pub examples: String,
}

/// A grouping of articles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: String,
    pub examples: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn create(draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: CategoryId::new(),
            name: draft.name,
            description: draft.description,
            examples: draft.examples,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full-record replace; identity and creation time are kept.
    pub fn replaced_with(&self, draft: CategoryDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: self.id,
            name: draft.name,
            description: draft.description,
            examples: draft.examples,
            version: self.version,
            created_at: self.created_at,
            updated_at: now,
        }
    }

    pub fn url(&self) -> String {
        format!("/catalog/category/{}", self.id)
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
