//! Product queries.
//!
//! These are single-statement reads and writes. The form-driven use cases
//! in the crate root wrap them in a transaction together with the category
//! lookup and the uniqueness check.

use crate::StoreError;
use catalog_types::Product;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PRODUCT_COLUMNS: &str = "id, name, category_id";

/// Lists every product in storage order.
pub fn list_products(conn: &Connection) -> Result<Vec<Product>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([], map_row_to_product)?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row?);
    }
    Ok(products)
}

/// Retrieves a product by id.
///
/// A missing row is reported as [`StoreError::ProductNotFound`].
pub fn get_product(conn: &Connection, id: i64) -> Result<Product, StoreError> {
    conn.query_row(
        &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"),
        [id],
        map_row_to_product,
    )
    .optional()?
    .ok_or(StoreError::ProductNotFound(id))
}

/// Looks a product up by its exact name.
pub fn find_product_by_name(conn: &Connection, name: &str) -> Result<Option<Product>, StoreError> {
    let product = conn
        .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name = ?1"),
            [name],
            map_row_to_product,
        )
        .optional()?;
    Ok(product)
}

/// Lists the products assigned to `category_id`, in storage order.
pub fn find_products_by_category(
    conn: &Connection,
    category_id: i64,
) -> Result<Vec<Product>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 ORDER BY id ASC"
    ))?;
    let rows = stmt.query_map([category_id], map_row_to_product)?;

    let mut products = Vec::new();
    for row in rows {
        products.push(row?);
    }
    Ok(products)
}

/// Returns the number of stored products.
pub fn count_products(conn: &Connection) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
    Ok(count as usize)
}

/// Inserts a new product and returns it with its assigned id.
///
/// A `UNIQUE` violation on the name surfaces as [`StoreError::Conflict`].
pub fn insert_product(
    conn: &Connection,
    name: &str,
    category_id: i64,
) -> Result<Product, StoreError> {
    conn.execute(
        "INSERT INTO products (name, category_id) VALUES (?1, ?2)",
        params![name, category_id],
    )
    .map_err(|e| conflict_or_database(e, name))?;

    Ok(Product {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        category_id,
    })
}

/// Writes the name and category of an existing product.
pub fn update_product(conn: &Connection, product: &Product) -> Result<(), StoreError> {
    let count = conn
        .execute(
            "UPDATE products SET name = ?1, category_id = ?2 WHERE id = ?3",
            params![product.name, product.category_id, product.id],
        )
        .map_err(|e| conflict_or_database(e, &product.name))?;
    if count == 0 {
        return Err(StoreError::ProductNotFound(product.id));
    }
    Ok(())
}

/// Deletes a product immediately.
pub fn delete_product(conn: &Connection, id: i64) -> Result<(), StoreError> {
    let count = conn.execute("DELETE FROM products WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(StoreError::ProductNotFound(id));
    }
    tracing::info!(product_id = id, "product deleted");
    Ok(())
}

fn conflict_or_database(err: rusqlite::Error, name: &str) -> StoreError {
    if let rusqlite::Error::SqliteFailure(ref code, _) = err {
        if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
            return StoreError::Conflict {
                name: name.to_string(),
            };
        }
    }
    StoreError::Database(err)
}

fn map_row_to_product(row: &Row) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        category_id: row.get(2)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categories::ensure_category;
    use crate::tests::setup_db;

    #[test]
    fn insert_get_list_delete() {
        let conn = setup_db();
        let tools = ensure_category(&conn, "Tools").unwrap();

        let hammer = insert_product(&conn, "Hammer", tools.id).unwrap();
        let saw = insert_product(&conn, "Saw", tools.id).unwrap();
        assert!(saw.id > hammer.id);

        assert_eq!(get_product(&conn, hammer.id).unwrap(), hammer);
        assert_eq!(list_products(&conn).unwrap(), vec![hammer.clone(), saw.clone()]);
        assert_eq!(count_products(&conn).unwrap(), 2);

        delete_product(&conn, hammer.id).unwrap();
        assert!(matches!(
            get_product(&conn, hammer.id),
            Err(StoreError::ProductNotFound(_))
        ));
        assert_eq!(count_products(&conn).unwrap(), 1);
    }

    #[test]
    fn delete_missing_is_not_found() {
        let conn = setup_db();
        match delete_product(&conn, 99) {
            Err(StoreError::ProductNotFound(id)) => assert_eq!(id, 99),
            other => panic!("expected ProductNotFound, got {:?}", other),
        }
    }

    #[test]
    fn find_by_name_is_exact() {
        let conn = setup_db();
        let tools = ensure_category(&conn, "Tools").unwrap();
        let hammer = insert_product(&conn, "Hammer", tools.id).unwrap();

        assert_eq!(find_product_by_name(&conn, "Hammer").unwrap(), Some(hammer));
        assert_eq!(find_product_by_name(&conn, "hammer").unwrap(), None);
    }

    #[test]
    fn duplicate_insert_maps_to_conflict() {
        let conn = setup_db();
        let tools = ensure_category(&conn, "Tools").unwrap();
        insert_product(&conn, "Hammer", tools.id).unwrap();

        match insert_product(&conn, "Hammer", tools.id) {
            Err(StoreError::Conflict { name }) => assert_eq!(name, "Hammer"),
            other => panic!("expected Conflict, got {:?}", other),
        }
        assert_eq!(count_products(&conn).unwrap(), 1);
    }

    #[test]
    fn products_by_category() {
        let conn = setup_db();
        let tools = ensure_category(&conn, "Tools").unwrap();
        let garden = ensure_category(&conn, "Garden").unwrap();

        let hammer = insert_product(&conn, "Hammer", tools.id).unwrap();
        let rake = insert_product(&conn, "Rake", garden.id).unwrap();
        let saw = insert_product(&conn, "Saw", tools.id).unwrap();

        assert_eq!(
            find_products_by_category(&conn, tools.id).unwrap(),
            vec![hammer, saw]
        );
        assert_eq!(find_products_by_category(&conn, garden.id).unwrap(), vec![rake]);
        assert!(find_products_by_category(&conn, 1234).unwrap().is_empty());
    }

    #[test]
    fn update_missing_is_not_found() {
        let conn = setup_db();
        let ghost = Product {
            id: 5,
            name: "Ghost".to_string(),
            category_id: 1,
        };
        assert!(matches!(
            update_product(&conn, &ghost),
            Err(StoreError::ProductNotFound(5))
        ));
    }
}
