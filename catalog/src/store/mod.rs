use crate::error::{CatalogError, Result};
use crate::filter::ProductFilter;
use crate::product::{NewProduct, Product, Upserted};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Keyed product storage shared by the ingestion pipeline and the query engine.
///
/// Implementations must make each `upsert` atomic with respect to concurrent
/// callers: two upserts of the same SKU never interleave, and readers see a
/// row either before or after an upsert, never halfway.
pub trait CatalogStore: Send + Sync {
    /// Insert a product under a new ascending id, or overwrite every field of
    /// the product with the same SKU while keeping its id.
    fn upsert(&self, product: NewProduct) -> Result<Upserted>;

    /// Products matching `filter`, ordered by ascending id, starting at
    /// `offset`, at most `limit` of them, plus the total number of matches.
    fn search(
        &self,
        filter: &ProductFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)>;

    /// Look up a single product by SKU.
    fn get(&self, sku: &str) -> Result<Option<Product>>;

    /// Total number of stored products.
    fn count(&self) -> Result<usize>;

    /// Unfiltered page of products, ordered by ascending id.
    fn list(&self, offset: usize, limit: usize) -> Result<(Vec<Product>, usize)> {
        self.search(&ProductFilter::new(), offset, limit)
    }
}

/// In-process catalog: one arena slot per SKU, `id = slot + 1`.
#[derive(Default)]
pub struct MemoryCatalogStore {
    arena: RwLock<Arena>,
}

#[derive(Default)]
struct Arena {
    slots: Vec<Product>,
    by_sku: HashMap<String, usize>,
}

impl MemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Arena>> {
        self.arena
            .read()
            .map_err(|_| CatalogError::Other("catalog lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Arena>> {
        self.arena
            .write()
            .map_err(|_| CatalogError::Other("catalog lock poisoned".into()))
    }
}

impl CatalogStore for MemoryCatalogStore {
    fn upsert(&self, product: NewProduct) -> Result<Upserted> {
        let mut arena = self.write()?;

        let existing = arena.by_sku.get(&product.sku).copied();
        if let Some(slot) = existing {
            let id = arena.slots[slot].id;
            arena.slots[slot] = product.with_id(id);
            return Ok(Upserted { id, created: false });
        }

        let slot = arena.slots.len();
        let id = slot as i64 + 1;
        arena.by_sku.insert(product.sku.clone(), slot);
        arena.slots.push(product.with_id(id));
        Ok(Upserted { id, created: true })
    }

    fn search(
        &self,
        filter: &ProductFilter,
        offset: usize,
        limit: usize,
    ) -> Result<(Vec<Product>, usize)> {
        let arena = self.read()?;
        // Slots are already in id order
        let matching: Vec<&Product> = arena.slots.iter().filter(|p| filter.matches(p)).collect();
        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((items, total))
    }

    fn get(&self, sku: &str) -> Result<Option<Product>> {
        let arena = self.read()?;
        Ok(arena.by_sku.get(sku).map(|&slot| arena.slots[slot].clone()))
    }

    fn count(&self) -> Result<usize> {
        Ok(self.read()?.slots.len())
    }
}
