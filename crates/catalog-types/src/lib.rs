//! Shared records and form types for the catalog.
//!
//! Every crate in the workspace takes its view of a [`Category`] or a
//! [`Product`] from here, so the store, the form layer and the HTML views
//! never disagree about field names or limits.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum length, in characters, of a category or product name.
///
/// Matches the `VARCHAR(64)` width both tables were created with.
pub const MAX_NAME_LEN: usize = 64;

/// A named grouping that products belong to.
///
/// Categories are seeded out-of-band; the HTTP surface never creates one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Database-assigned identifier.
    pub id: i64,
    /// Unique display name.
    pub name: String,
}

/// A named catalog item belonging to exactly one [`Category`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Database-assigned identifier.
    pub id: i64,
    /// Unique display name.
    pub name: String,
    /// Foreign key into `categories.id`.
    pub category_id: i64,
}

/// Raw fields as submitted by the product form.
///
/// Both fields are kept as strings so that a missing or malformed category
/// becomes a field error rather than a request rejection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductFormInput {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
}

/// A product form that passed field validation.
///
/// The category id is syntactically valid but has not been checked against
/// the `categories` table yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    /// Trimmed product name.
    pub name: String,
    /// Chosen category id.
    pub category_id: i64,
}

/// Form field identifiers that can carry a validation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Category,
}

impl FormField {
    /// Returns the HTML input name for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
        }
    }
}

/// Field-level validation messages, keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<FormField, Vec<String>>);

impl FieldErrors {
    /// Creates an empty error set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against `field`.
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    /// Returns the messages recorded for `field`, if any.
    pub fn get(&self, field: FormField) -> &[String] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns `true` if no field has a message.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field.as_str(), message)?;
                first = false;
            }
        }
        Ok(())
    }
}
