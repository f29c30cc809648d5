use crate::error::{CatalogError, Result};
use crate::filter::ProductFilter;
use crate::product::{NewProduct, Product, Upserted};
use crate::store::CatalogStore;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

const COLUMNS: &str = "id, sku, name, brand, color, size, mrp, price, quantity";

/// SQLite-backed catalog.
///
/// A single connection behind a mutex: every upsert runs in its own
/// transaction while holding the lock, so writes to the same SKU are
/// serialised and readers never see a half-written row.
pub struct CatalogDb {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl CatalogDb {
    /// Open or create the catalog database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        register_functions(&conn)?;
        let db = CatalogDb {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        };
        db.initialize_tables()?;
        Ok(db)
    }

    /// Open an in-memory catalog database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        register_functions(&conn)?;
        let db = CatalogDb {
            conn: Mutex::new(conn),
            path: None,
        };
        db.initialize_tables()?;
        Ok(db)
    }

    fn initialize_tables(&self) -> Result<()> {
        self.lock()?.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS products (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL,
                brand TEXT NOT NULL,
                color TEXT NOT NULL DEFAULT '',
                size TEXT NOT NULL DEFAULT '',
                mrp REAL NOT NULL,
                price REAL NOT NULL,
                quantity INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_products_brand ON products(brand);
            CREATE INDEX IF NOT EXISTS idx_products_color ON products(color);
            ",
        )?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CatalogError::Other("catalog database lock poisoned".into()))
    }

    /// Where the database lives, or `None` for an in-memory catalog.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Summary of the catalog for CLI and health output.
    pub fn status(&self) -> Result<serde_json::Value> {
        let path = self
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        Ok(serde_json::json!({
            "database": path,
            "products": self.count()?,
        }))
    }
}

impl CatalogStore for CatalogDb {
    fn upsert(&self, product: NewProduct) -> Result<Upserted> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM products WHERE sku = ?1",
                params![product.sku],
                |row| row.get(0),
            )
            .optional()?;

        let upserted = match existing {
            Some(id) => {
                tx.execute(
                    "UPDATE products
                     SET name = ?2, brand = ?3, color = ?4, size = ?5,
                         mrp = ?6, price = ?7, quantity = ?8
                     WHERE id = ?1",
                    params![
                        id,
                        product.name,
                        product.brand,
                        product.color,
                        product.size,
                        product.mrp,
                        product.price,
                        product.quantity
                    ],
                )?;
                Upserted { id, created: false }
            }
            None => {
                tx.execute(
                    "INSERT INTO products (sku, name, brand, color, size, mrp, price, quantity)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![
                        product.sku,
                        product.name,
                        product.brand,
                        product.color,
                        product.size,
                        product.mrp,
                        product.price,
                        product.quantity
                    ],
                )?;
                Upserted {
                    id: tx.last_insert_rowid(),
                    created: true,
                }
            }
        };

        tx.commit()?;
        Ok(upserted)
    }

    fn search(
        &self,
        filter: &ProductFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)> {
        let (where_clause, mut values) = filter.to_sql();
        let conn = self.lock()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM products{where_clause}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        values.push(Value::Integer(i64::try_from(offset).unwrap_or(i64::MAX)));

        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM products{where_clause} ORDER BY id LIMIT ? OFFSET ?"
        ))?;
        let rows = stmt.query_map(params_from_iter(values.iter()), product_from_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok((items, total as usize))
    }

    fn get(&self, sku: &str) -> Result<Option<Product>> {
        let result = self
            .lock()?
            .query_row(
                &format!("SELECT {COLUMNS} FROM products WHERE sku = ?1"),
                params![sku],
                product_from_row,
            )
            .optional()?;
        Ok(result)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self
            .lock()?
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// SQLite's `lower()` only folds ASCII; `fold_lower` uses Rust's Unicode
/// lowercasing so SQL search agrees with in-memory matching.
fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold_lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

fn product_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        brand: row.get(3)?,
        color: row.get(4)?,
        size: row.get(5)?,
        mrp: row.get(6)?,
        price: row.get(7)?,
        quantity: row.get(8)?,
    })
}
