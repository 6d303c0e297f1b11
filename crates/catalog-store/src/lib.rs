//! Product and category persistence for the catalog.
//!
//! Holds the queries for both tables plus the three form-driven use cases:
//! [`create_product`], [`edit_product`] and [`delete_product`]. Every call
//! takes an explicit `&Connection`; the crate holds no global handle.
//!
//! Outcomes fall into three groups. A missing product or category is
//! terminal ([`StoreError::ProductNotFound`], [`StoreError::CategoryNotFound`]).
//! A bad field ([`StoreError::Validation`]) or a taken name
//! ([`StoreError::Conflict`]) is recoverable and the form is shown again.
//! Anything else is a database failure.

mod categories;
mod form;
mod products;

pub use categories::{ensure_category, get_category, list_categories, seed_categories};
pub use form::{validate_product_form, INVALID_CHOICE_MESSAGE, REQUIRED_MESSAGE};
pub use products::{
    count_products, delete_product, find_product_by_name, find_products_by_category,
    get_product, insert_product, list_products, update_product,
};

use catalog_types::{FieldErrors, Product, ProductFormInput};
use rusqlite::Connection;
use thiserror::Error;

/// Errors that can occur during catalog operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("product not found: {0}")]
    ProductNotFound(i64),
    #[error("category not found: {0}")]
    CategoryNotFound(i64),
    #[error("invalid form: {0}")]
    Validation(FieldErrors),
    /// The display text is the notice shown to the user.
    #[error("A product with name: '{name}' already exists.")]
    Conflict { name: String },
    #[error("category name is longer than {max} characters: '{name}'")]
    CategoryNameTooLong { name: String, max: usize },
}

impl StoreError {
    /// Returns `true` for the terminal not-found outcomes.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductNotFound(_) | Self::CategoryNotFound(_))
    }
}

/// Validates a submitted form and inserts the product it describes.
///
/// The category lookup, the uniqueness check and the insert run in one
/// transaction; on any error nothing is written.
pub fn create_product(conn: &Connection, input: &ProductFormInput) -> Result<Product, StoreError> {
    let draft = validate_product_form(input).map_err(StoreError::Validation)?;

    let tx = conn.unchecked_transaction()?;
    get_category(&tx, draft.category_id)?;

    if find_product_by_name(&tx, &draft.name)?.is_some() {
        tracing::debug!(name = %draft.name, "product name already taken");
        return Err(StoreError::Conflict { name: draft.name });
    }

    let product = insert_product(&tx, &draft.name, draft.category_id)?;
    tx.commit()?;

    tracing::info!(
        product_id = product.id,
        category_id = product.category_id,
        "product created"
    );
    Ok(product)
}

/// Validates a submitted form and applies it to product `id`.
///
/// The product must exist before the form is even looked at, so an unknown
/// id is always reported as [`StoreError::ProductNotFound`]. A product that
/// keeps its own name does not conflict with itself.
pub fn edit_product(
    conn: &Connection,
    id: i64,
    input: &ProductFormInput,
) -> Result<Product, StoreError> {
    let tx = conn.unchecked_transaction()?;
    let mut product = get_product(&tx, id)?;

    let draft = validate_product_form(input).map_err(StoreError::Validation)?;
    get_category(&tx, draft.category_id)?;

    if let Some(other) = find_product_by_name(&tx, &draft.name)? {
        if other.id != id {
            tracing::debug!(
                product_id = id,
                other_id = other.id,
                "product name already taken"
            );
            return Err(StoreError::Conflict { name: draft.name });
        }
    }

    product.name = draft.name;
    product.category_id = draft.category_id;
    update_product(&tx, &product)?;
    tx.commit()?;

    tracing::info!(
        product_id = product.id,
        category_id = product.category_id,
        "product updated"
    );
    Ok(product)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use catalog_types::FormField;

    pub(crate) fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .expect("enable foreign keys");
        catalog_db::run_migrations(&conn).expect("migrations");
        conn
    }

    fn form(name: &str, category: impl ToString) -> ProductFormInput {
        ProductFormInput {
            name: name.to_string(),
            category: category.to_string(),
        }
    }

    /// Seeds `Tools` (id 1) and `Garden` (id 2).
    fn seeded() -> Connection {
        let conn = setup_db();
        seed_categories(&conn, &["Tools", "Garden"]).unwrap();
        conn
    }

    #[test]
    fn create_then_retrieve() {
        let conn = seeded();
        let hammer = create_product(&conn, &form("Hammer", 1)).unwrap();

        assert_eq!(hammer.name, "Hammer");
        assert_eq!(hammer.category_id, 1);
        assert_eq!(get_product(&conn, hammer.id).unwrap(), hammer);
    }

    #[test]
    fn create_duplicate_leaves_count_unchanged() {
        let conn = seeded();
        create_product(&conn, &form("Hammer", 1)).unwrap();

        let err = create_product(&conn, &form("Hammer", 1)).unwrap_err();
        match err {
            StoreError::Conflict { ref name } => assert_eq!(name, "Hammer"),
            ref other => panic!("expected Conflict, got {:?}", other),
        }
        assert_eq!(err.to_string(), "A product with name: 'Hammer' already exists.");
        assert_eq!(count_products(&conn).unwrap(), 1);
    }

    #[test]
    fn create_with_blank_name_is_validation_error() {
        let conn = seeded();
        match create_product(&conn, &form("  ", 1)) {
            Err(StoreError::Validation(errors)) => {
                assert_eq!(errors.get(FormField::Name), [REQUIRED_MESSAGE])
            }
            other => panic!("expected Validation, got {:?}", other),
        }
        assert_eq!(count_products(&conn).unwrap(), 0);
    }

    #[test]
    fn create_with_unknown_category_is_not_found() {
        let conn = seeded();
        let err = create_product(&conn, &form("Hammer", 42)).unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(42)));
        assert!(err.is_not_found());
        assert_eq!(count_products(&conn).unwrap(), 0);
    }

    #[test]
    fn edit_keeping_own_name_succeeds() {
        let conn = seeded();
        let hammer = create_product(&conn, &form("Hammer", 1)).unwrap();

        let moved = edit_product(&conn, hammer.id, &form("Hammer", 2)).unwrap();
        assert_eq!(moved.name, "Hammer");
        assert_eq!(moved.category_id, 2);
        assert_eq!(get_product(&conn, hammer.id).unwrap(), moved);
    }

    #[test]
    fn edit_to_other_products_name_conflicts() {
        let conn = seeded();
        let hammer = create_product(&conn, &form("Hammer", 1)).unwrap();
        let saw = create_product(&conn, &form("Saw", 1)).unwrap();

        let err = edit_product(&conn, saw.id, &form("Hammer", 2)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        assert_eq!(get_product(&conn, hammer.id).unwrap(), hammer);
        assert_eq!(get_product(&conn, saw.id).unwrap(), saw);
    }

    #[test]
    fn edit_renames_and_frees_old_name() {
        let conn = seeded();
        let hammer = create_product(&conn, &form("Hammer", 1)).unwrap();

        edit_product(&conn, hammer.id, &form(" Mallet ", 1)).unwrap();
        assert_eq!(get_product(&conn, hammer.id).unwrap().name, "Mallet");
        assert!(find_product_by_name(&conn, "Hammer").unwrap().is_none());

        create_product(&conn, &form("Hammer", 1)).unwrap();
        assert_eq!(count_products(&conn).unwrap(), 2);
    }

    #[test]
    fn edit_missing_product_is_not_found_even_with_bad_form() {
        let conn = seeded();
        assert!(matches!(
            edit_product(&conn, 77, &form("", "x")),
            Err(StoreError::ProductNotFound(77))
        ));
        assert!(matches!(
            edit_product(&conn, 77, &form("Hammer", 1)),
            Err(StoreError::ProductNotFound(77))
        ));
    }

    #[test]
    fn edit_with_unknown_category_leaves_row_unchanged() {
        let conn = seeded();
        let hammer = create_product(&conn, &form("Hammer", 1)).unwrap();

        let err = edit_product(&conn, hammer.id, &form("Mallet", 9)).unwrap_err();
        assert!(matches!(err, StoreError::CategoryNotFound(9)));
        assert_eq!(get_product(&conn, hammer.id).unwrap(), hammer);
    }
}
