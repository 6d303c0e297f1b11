//! Field validation for the product form.

use catalog_types::{FieldErrors, FormField, ProductDraft, ProductFormInput, MAX_NAME_LEN};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str = "Not a valid choice.";

/// Checks the submitted fields and produces a [`ProductDraft`].
///
/// Only the shape of the input is checked here. Whether the category exists
/// and whether the name is already taken are decided against the database
/// by [`crate::create_product`] and [`crate::edit_product`].
pub fn validate_product_form(input: &ProductFormInput) -> Result<ProductDraft, FieldErrors> {
    let mut errors = FieldErrors::new();

    let name = input.name.trim();
    if name.is_empty() {
        errors.add(FormField::Name, REQUIRED_MESSAGE);
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add(
            FormField::Name,
            format!("Field cannot be longer than {MAX_NAME_LEN} characters."),
        );
    }

    let category_id = match input.category.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(FormField::Category, INVALID_CHOICE_MESSAGE);
            None
        }
    };

    match category_id {
        Some(category_id) if errors.is_empty() => Ok(ProductDraft {
            name: name.to_string(),
            category_id,
        }),
        _ => Err(errors),
    }
}
