//! Category queries and out-of-band seeding.

use crate::StoreError;
use catalog_types::{Category, MAX_NAME_LEN};
use rusqlite::{Connection, OptionalExtension, Row};

/// Lists every category in storage order.
pub fn list_categories(conn: &Connection) -> Result<Vec<Category>, StoreError> {
    let mut stmt = conn.prepare("SELECT id, name FROM categories ORDER BY id ASC")?;
    let rows = stmt.query_map([], map_row_to_category)?;

    let mut categories = Vec::new();
    for row in rows {
        categories.push(row?);
    }
    Ok(categories)
}

/// Retrieves a category by id.
///
/// A missing row is reported as [`StoreError::CategoryNotFound`].
pub fn get_category(conn: &Connection, id: i64) -> Result<Category, StoreError> {
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = ?1",
        [id],
        map_row_to_category,
    )
    .optional()?
    .ok_or(StoreError::CategoryNotFound(id))
}

/// Returns the category called `name`, inserting it first if it is missing.
///
/// Names longer than [`MAX_NAME_LEN`] characters are rejected with
/// [`StoreError::CategoryNameTooLong`] before anything is written.
pub fn ensure_category(conn: &Connection, name: &str) -> Result<Category, StoreError> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(StoreError::CategoryNameTooLong {
            name: name.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    conn.execute(
        "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
        [name],
    )?;
    let category = conn.query_row(
        "SELECT id, name FROM categories WHERE name = ?1",
        [name],
        map_row_to_category,
    )?;
    Ok(category)
}

/// Makes sure every name in `names` exists as a category.
///
/// Blank names are skipped. Running the same seed twice is a no-op.
/// Returns the number of categories that were newly created. A name over
/// [`MAX_NAME_LEN`] characters fails the whole seed and nothing is stored.
pub fn seed_categories<S: AsRef<str>>(conn: &Connection, names: &[S]) -> Result<usize, StoreError> {
    let before = count_categories(conn)?;

    let tx = conn.unchecked_transaction()?;
    for name in names {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        ensure_category(&tx, name)?;
    }
    tx.commit()?;

    let created = count_categories(conn)? - before;
    if created > 0 {
        tracing::info!(count = created, "seeded categories");
    }
    Ok(created)
}

fn count_categories(conn: &Connection) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
    Ok(count as usize)
}

fn map_row_to_category(row: &Row) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}
