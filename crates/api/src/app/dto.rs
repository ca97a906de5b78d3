//! Form bodies as posted by the HTML pages, and their mapping to validation
//! inputs.
//!
//! Every field is a `String` so a malformed value reaches validation as a
//! field error instead of an extractor rejection.

use serde::Deserialize;

use stockroom_catalog::validation::{ArticleInput, CategoryInput, InventoryInput, TransferInput};
use stockroom_catalog::{Article, Category};
use stockroom_core::ExpectedVersion;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub name: String,
    pub description: String,
    pub examples: String,
    /// Hidden field carried by update forms.
    pub version: String,
}

impl CategoryForm {
    pub fn input(&self) -> CategoryInput {
        CategoryInput {
            name: self.name.clone(),
            description: self.description.clone(),
            examples: self.examples.clone(),
        }
    }

    /// Version the form was rendered from, if it carried a readable one.
    pub fn version(&self) -> Option<u64> {
        parse_version(&self.version)
    }

    pub fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::from_observed(self.version())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ArticleForm {
    pub name: String,
    pub short_description: String,
    pub category: String,
    pub price: String,
    pub stock_number: String,
    pub detail_description: String,
    pub version: String,
}

impl ArticleForm {
    pub fn input(&self) -> ArticleInput {
        ArticleInput {
            name: self.name.clone(),
            short_description: self.short_description.clone(),
            category: self.category.clone(),
            price: self.price.clone(),
            stock_number: self.stock_number.clone(),
            detail_description: self.detail_description.clone(),
        }
    }

    /// Version the form was rendered from, if it carried a readable one.
    pub fn version(&self) -> Option<u64> {
        parse_version(&self.version)
    }

    pub fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::from_observed(self.version())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InventoryForm {
    pub owner: String,
}

impl InventoryForm {
    pub fn input(&self) -> InventoryInput {
        InventoryInput {
            owner: self.owner.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TransferForm {
    pub owner: String,
    pub quantity: String,
}

impl TransferForm {
    pub fn input(&self) -> TransferInput {
        TransferInput {
            owner: self.owner.clone(),
            quantity: self.quantity.clone(),
        }
    }
}

/// Prefill values for editing an existing category.
pub fn category_input(category: &Category) -> CategoryInput {
    CategoryInput {
        name: category.name.clone(),
        description: category.description.clone(),
        examples: category.examples.clone(),
    }
}

/// Prefill values for editing an existing article.
pub fn article_input(article: &Article) -> ArticleInput {
    ArticleInput {
        name: article.name.clone(),
        short_description: article.short_description.clone(),
        category: article.category.to_string(),
        price: article.price.to_string(),
        stock_number: article.stock_number.to_string(),
        detail_description: article.detail_description.clone(),
    }
}

/// An absent or unreadable version reads as `None`, which updates treat as
/// "replace unconditionally".
pub fn parse_version(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_field_maps_to_expected_version() {
        let mut form = CategoryForm {
            version: "3".into(),
            ..CategoryForm::default()
        };
        assert_eq!(form.expected_version(), ExpectedVersion::Exact(3));

        form.version = " 7 ".into();
        assert_eq!(form.expected_version(), ExpectedVersion::Exact(7));

        form.version = String::new();
        assert_eq!(form.expected_version(), ExpectedVersion::Any);

        form.version = "abc".into();
        assert_eq!(form.version(), None);
        assert_eq!(form.expected_version(), ExpectedVersion::Any);
    }

    #[test]
    fn article_form_copies_every_field() {
        let form = ArticleForm {
            name: "Hammer".into(),
            short_description: "Claw".into(),
            category: "c".into(),
            price: "9.99".into(),
            stock_number: "4".into(),
            detail_description: "Steel".into(),
            version: "1".into(),
        };
        let input = form.input();
        assert_eq!(input.name, "Hammer");
        assert_eq!(input.price, "9.99");
        assert_eq!(input.stock_number, "4");
        assert_eq!(form.expected_version(), ExpectedVersion::Exact(1));
    }
}
