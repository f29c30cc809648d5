// Catalog entities

use serde::{Deserialize, Serialize};

/// A product as stored in the catalog.
///
/// `id` is assigned by the store on first insert and never changes when the
/// same `sku` is ingested again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub color: String,
    pub size: String,
    pub mrp: f64,
    pub price: f64,
    pub quantity: i64,
}

/// A validated product that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub brand: String,
    pub color: String,
    pub size: String,
    pub mrp: f64,
    pub price: f64,
    pub quantity: i64,
}

impl NewProduct {
    /// Attach a store-assigned id.
    pub fn with_id(self, id: i64) -> Product {
        Product {
            id,
            sku: self.sku,
            name: self.name,
            brand: self.brand,
            color: self.color,
            size: self.size,
            mrp: self.mrp,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// What an upsert did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Upserted {
    pub id: i64,
    pub created: bool,
}
