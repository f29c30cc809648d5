pub mod product;
pub mod row_parser;
pub mod validation;
pub mod filter;
pub mod store;
pub mod catalog_db;
pub mod ingest;
pub mod query;
pub mod error;

pub use catalog_db::CatalogDb;
pub use error::{CatalogError, Result};
pub use filter::{Criterion, ProductFilter};
pub use ingest::{ensure_csv_upload, IngestionPipeline, IngestionResult, RowError};
pub use product::{NewProduct, Product, Upserted};
pub use query::{Pagination, QueryEngine, QueryPage, SearchParams};
pub use store::{CatalogStore, MemoryCatalogStore};
