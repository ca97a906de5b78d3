//! Form validation pipeline.
//!
//! Each inbound form is run through an ordered list of per-field rules before
//! any handler logic executes. Rules never short-circuit the pipeline: every
//! violated rule contributes one [`FieldError`], in field order, so a form can
//! be redisplayed with all of its messages at once. A successful run yields a
//! typed draft that the domain constructors accept.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockroom_core::CategoryId;

use crate::article::ArticleDraft;
use crate::category::CategoryDraft;
use crate::price::Price;

pub const CATEGORY_NAME_MAX: usize = 30;
pub const ARTICLE_NAME_MAX: usize = 30;
pub const SHORT_DESCRIPTION_MAX: usize = 40;
pub const DETAIL_DESCRIPTION_MAX: usize = 200;

/// A single violated rule, attributed to the form field that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Ordered collection of field errors produced by a validation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// First message recorded for `field`, if any.
    pub fn for_field(&self, field: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    pub fn into_vec(self) -> Vec<FieldError> {
        self.errors
    }

    /// Record the outcome of a rule, returning the accepted value on success.
    fn check<T>(&mut self, outcome: Result<T, FieldError>) -> Option<T> {
        match outcome {
            Ok(v) => Some(v),
            Err(e) => {
                self.push(e);
                None
            }
        }
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, ValidationErrors> {
        match value {
            Some(v) if self.is_empty() => Ok(v),
            _ => Err(self),
        }
    }
}

impl From<FieldError> for ValidationErrors {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// -------------------------
// Rules
// -------------------------

/// Trimmed, non-empty text, optionally capped at `max` characters.
pub fn required_text(
    field: &str,
    label: &str,
    value: &str,
    max: Option<usize>,
) -> Result<String, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, format!("{label} must be specified.")));
    }
    if let Some(max) = max {
        if trimmed.chars().count() > max {
            return Err(FieldError::new(
                field,
                format!("{label} must be at most {max} characters."),
            ));
        }
    }
    Ok(trimmed.to_string())
}

/// Decimal amount of at least 0.01.
pub fn positive_price(field: &str, value: &str) -> Result<Price, FieldError> {
    Price::parse_positive(value)
        .map_err(|_| FieldError::new(field, "Price must be a positive number."))
}

/// Integer ≥ 0 (leading/trailing whitespace tolerated).
pub fn non_negative_int(field: &str, message: &str, value: &str) -> Result<u32, FieldError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| FieldError::new(field, message))
}

const UNKNOWN_CATEGORY: &str = "Category must be an existing category.";

/// Non-empty identifier of a category.
pub fn category_ref(field: &str, value: &str) -> Result<CategoryId, FieldError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FieldError::new(field, "Category must be specified."));
    }
    trimmed
        .parse()
        .map_err(|_| FieldError::new(field, UNKNOWN_CATEGORY))
}

// -------------------------
// Form inputs
// -------------------------

/// Raw category form fields, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryInput {
    pub name: String,
    pub description: String,
    pub examples: String,
}

impl CategoryInput {
    pub fn validate(&self) -> Result<CategoryDraft, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = errors.check(required_text(
            "name",
            "Name",
            &self.name,
            Some(CATEGORY_NAME_MAX),
        ));
        let description = errors.check(required_text(
            "description",
            "Description",
            &self.description,
            None,
        ));
        let examples = errors.check(required_text("examples", "Examples", &self.examples, None));

        let draft = match (name, description, examples) {
            (Some(name), Some(description), Some(examples)) => Some(CategoryDraft {
                name,
                description,
                examples,
            }),
            _ => None,
        };
        errors.finish(draft)
    }
}

/// Raw article form fields, exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleInput {
    pub name: String,
    pub short_description: String,
    pub category: String,
    pub price: String,
    pub stock_number: String,
    pub detail_description: String,
}

impl ArticleInput {
    pub fn validate(&self) -> Result<ArticleDraft, ValidationErrors> {
        self.validate_with(|_| true)
    }

    /// Like [`validate`](Self::validate), additionally rejecting a well-formed
    /// category id for which `category_exists` returns false. The error keeps
    /// the category field's position.
    pub fn validate_with<F>(&self, category_exists: F) -> Result<ArticleDraft, ValidationErrors>
    where
        F: Fn(CategoryId) -> bool,
    {
        let mut errors = ValidationErrors::new();
        let name = errors.check(required_text(
            "name",
            "Name",
            &self.name,
            Some(ARTICLE_NAME_MAX),
        ));
        let short_description = errors.check(required_text(
            "short_description",
            "Short description",
            &self.short_description,
            Some(SHORT_DESCRIPTION_MAX),
        ));
        let category = errors.check(category_ref("category", &self.category).and_then(|id| {
            if category_exists(id) {
                Ok(id)
            } else {
                Err(FieldError::new("category", UNKNOWN_CATEGORY))
            }
        }));
        let price = errors.check(positive_price("price", &self.price));
        let stock_number = errors.check(non_negative_int(
            "stock_number",
            "Stock number must be a non-negative integer.",
            &self.stock_number,
        ));
        let detail_description = errors.check(required_text(
            "detail_description",
            "Detail description",
            &self.detail_description,
            Some(DETAIL_DESCRIPTION_MAX),
        ));

        let draft = match (
            name,
            short_description,
            category,
            price,
            stock_number,
            detail_description,
        ) {
            (
                Some(name),
                Some(short_description),
                Some(category),
                Some(price),
                Some(stock_number),
                Some(detail_description),
            ) => Some(ArticleDraft {
                name,
                short_description,
                category,
                price,
                stock_number,
                detail_description,
            }),
            _ => None,
        };
        errors.finish(draft)
    }
}

/// Raw inventory form fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InventoryInput {
    pub owner: String,
}

impl InventoryInput {
    /// Returns the trimmed owner name.
    pub fn validate(&self) -> Result<String, ValidationErrors> {
        required_text("owner", "Owner", &self.owner, None).map_err(ValidationErrors::from)
    }
}

/// Raw stock-transfer fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferInput {
    pub owner: String,
    pub quantity: String,
}

impl TransferInput {
    /// Returns the trimmed owner and the requested quantity.
    pub fn validate(&self) -> Result<(String, u32), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let owner = errors.check(required_text("owner", "Owner", &self.owner, None));
        let quantity = errors.check(non_negative_int(
            "quantity",
            "Quantity must be a non-negative integer.",
            &self.quantity,
        ));
        let pair = owner.zip(quantity);
        errors.finish(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_article() -> ArticleInput {
        ArticleInput {
            name: "Hammer".to_string(),
            short_description: "Claw hammer".to_string(),
            category: CategoryId::new().to_string(),
            price: "12.50".to_string(),
            stock_number: "10".to_string(),
            detail_description: "16oz steel claw hammer".to_string(),
        }
    }

    #[test]
    fn category_input_trims_values() {
        let input = CategoryInput {
            name: "  Tools ".to_string(),
            description: " Hand tools".to_string(),
            examples: "hammer, saw ".to_string(),
        };
        let draft = input.validate().unwrap();
        assert_eq!(draft.name, "Tools");
        assert_eq!(draft.description, "Hand tools");
        assert_eq!(draft.examples, "hammer, saw");
    }

    #[test]
    fn category_input_reports_every_empty_field() {
        let input = CategoryInput {
            name: "   ".to_string(),
            description: String::new(),
            examples: "x".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.for_field("name"), Some("Name must be specified."));
        assert_eq!(
            errors.for_field("description"),
            Some("Description must be specified.")
        );
        assert_eq!(errors.for_field("examples"), None);
    }

    #[test]
    fn category_name_is_capped() {
        let input = CategoryInput {
            name: "x".repeat(CATEGORY_NAME_MAX + 1),
            description: "d".to_string(),
            examples: "e".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.for_field("name"),
            Some("Name must be at most 30 characters.")
        );
    }

    #[test]
    fn article_input_accepts_valid_form() {
        let draft = valid_article().validate().unwrap();
        assert_eq!(draft.price, Price::from_cents(1250));
        assert_eq!(draft.stock_number, 10);
    }

    #[test]
    fn article_input_rejects_non_positive_price() {
        for bad in ["0", "-1", "abc", ""] {
            let mut input = valid_article();
            input.price = bad.to_string();
            let errors = input.validate().unwrap_err();
            assert_eq!(errors.len(), 1, "price {bad:?}");
            assert_eq!(
                errors.for_field("price"),
                Some("Price must be a positive number.")
            );
        }
    }

    #[test]
    fn article_input_rejects_negative_stock() {
        let mut input = valid_article();
        input.stock_number = "-1".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.for_field("stock_number"),
            Some("Stock number must be a non-negative integer.")
        );
    }

    #[test]
    fn article_input_collects_one_error_per_violated_rule() {
        let input = ArticleInput::default();
        let errors = input.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "name",
                "short_description",
                "category",
                "price",
                "stock_number",
                "detail_description"
            ]
        );
    }

    #[test]
    fn unknown_category_keeps_its_field_position() {
        let mut input = valid_article();
        input.name = String::new();
        input.detail_description = String::new();
        let errors = input.validate_with(|_| false).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "category", "detail_description"]);
        assert_eq!(
            errors.for_field("category"),
            Some("Category must be an existing category.")
        );
    }

    #[test]
    fn article_input_rejects_malformed_category_reference() {
        let mut input = valid_article();
        input.category = "nope".to_string();
        let errors = input.validate().unwrap_err();
        assert_eq!(
            errors.for_field("category"),
            Some("Category must be an existing category.")
        );
    }

    #[test]
    fn transfer_input_accepts_zero_quantity() {
        let input = TransferInput {
            owner: " alice ".to_string(),
            quantity: "0".to_string(),
        };
        assert_eq!(input.validate().unwrap(), ("alice".to_string(), 0));
    }

    #[test]
    fn transfer_input_rejects_negative_quantity_and_blank_owner() {
        let input = TransferInput {
            owner: "  ".to_string(),
            quantity: "-2".to_string(),
        };
        let errors = input.validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.for_field("owner").is_some());
        assert!(errors.for_field("quantity").is_some());
    }

    #[test]
    fn inventory_input_requires_owner() {
        let errors = InventoryInput::default().validate().unwrap_err();
        assert_eq!(errors.for_field("owner"), Some("Owner must be specified."));
    }
}
