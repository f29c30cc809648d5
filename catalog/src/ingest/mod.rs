//! Batch ingestion: decode, validate and upsert a CSV batch row by row.
//!
//! A bad row is recorded and skipped; it never aborts the batch and never
//! rolls back rows applied before it. Each valid row is upserted as soon as
//! it validates, so when a SKU appears twice in one batch the later row wins.

use crate::error::{CatalogError, Result};
use crate::row_parser::{decode_batch, RawRow};
use crate::store::CatalogStore;
use crate::validation::validate_row;
use serde::Serialize;
use std::path::Path;

pub const CSV_ONLY_MESSAGE: &str = "Only CSV files are allowed";

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionResult {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<RowError>,
}

/// A rejected row: 1-based position among data rows, the cells as read,
/// and every message raised against it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    #[serde(rename = "row")]
    pub row_number: usize,
    #[serde(rename = "data")]
    pub raw_fields: RawRow,
    #[serde(rename = "errors")]
    pub messages: Vec<String>,
}

impl IngestionResult {
    fn accept(&mut self) {
        self.total_rows += 1;
        self.valid_rows += 1;
    }

    fn reject(&mut self, row_number: usize, raw_fields: RawRow, messages: Vec<String>) {
        self.total_rows += 1;
        self.invalid_rows += 1;
        self.errors.push(RowError {
            row_number,
            raw_fields,
            messages,
        });
    }

    /// One-line human summary used in upload responses.
    pub fn summary(&self) -> String {
        format!(
            "Successfully processed {} out of {} products",
            self.valid_rows, self.total_rows
        )
    }
}

/// Reject uploads that are not named as CSV files.
pub fn ensure_csv_upload(filename: &str) -> Result<()> {
    if filename.to_lowercase().ends_with(".csv") {
        Ok(())
    } else {
        Err(CatalogError::FileFormat(CSV_ONLY_MESSAGE.to_string()))
    }
}

pub struct IngestionPipeline<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> IngestionPipeline<'a, S> {
    pub fn new(store: &'a S) -> Self {
        IngestionPipeline { store }
    }

    /// Ingest one CSV batch.
    ///
    /// Fails only when the batch as a whole cannot be decoded, in which case
    /// nothing has been written. Row problems end up in the returned result.
    pub fn ingest(&self, batch: &[u8]) -> Result<IngestionResult> {
        let batch = decode_batch(batch)?;

        let unknown = batch.header.unknown_columns();
        if !unknown.is_empty() {
            log::warn!("Ignoring unknown columns: {}", unknown.join(", "));
        }

        let mut result = IngestionResult::default();

        for (index, fields) in batch.rows.into_iter().enumerate() {
            let row_number = index + 1;

            let product = match validate_row(&fields) {
                Ok(product) => product,
                Err(messages) => {
                    log::warn!("Row {row_number} rejected with {} error(s)", messages.len());
                    result.reject(row_number, fields, messages);
                    continue;
                }
            };

            match self.store.upsert(product) {
                Ok(upserted) => {
                    log::debug!(
                        "Row {row_number}: {} product id {}",
                        if upserted.created { "inserted" } else { "updated" },
                        upserted.id
                    );
                    result.accept();
                }
                Err(e) => {
                    log::error!("Row {row_number}: store failed: {e}");
                    result.reject(row_number, fields, vec![format!("store: {e}")]);
                }
            }
        }

        log::info!(
            "Ingested batch: {} rows, {} valid, {} invalid",
            result.total_rows,
            result.valid_rows,
            result.invalid_rows
        );

        Ok(result)
    }

    /// Read a `.csv` file from disk and ingest it.
    pub fn ingest_file(&self, path: &Path) -> Result<IngestionResult> {
        ensure_csv_upload(&path.to_string_lossy())?;
        let bytes = std::fs::read(path)?;
        self.ingest(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_db::CatalogDb;
    use crate::store::MemoryCatalogStore;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const HEADER: &str = "sku,name,brand,color,size,mrp,price,quantity\n";

    fn batch(rows: &[&str]) -> Vec<u8> {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text.into_bytes()
    }

    #[test]
    fn test_price_above_mrp_rejected_and_store_untouched() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(b"sku,name,brand,mrp,price,quantity\nA,N,B,1000,1200,5\n")
            .unwrap();

        let data: RawRow = [
            ("sku", "A"),
            ("name", "N"),
            ("brand", "B"),
            ("mrp", "1000"),
            ("price", "1200"),
            ("quantity", "5"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        assert_eq!(
            result,
            IngestionResult {
                total_rows: 1,
                valid_rows: 0,
                invalid_rows: 1,
                errors: vec![RowError {
                    row_number: 1,
                    raw_fields: data,
                    messages: vec!["price: price must be less than or equal to mrp".into()],
                }],
            }
        );
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_twenty_rows_get_ids_in_file_order() {
        let store = CatalogDb::open_in_memory().unwrap();
        let rows: Vec<String> = (1..=20)
            .map(|i| format!("SKU-{i:02},Item {i},Acme,Blue,M,100,90,{i}"))
            .collect();
        let refs: Vec<&str> = rows.iter().map(|s| s.as_str()).collect();

        let result = IngestionPipeline::new(&store).ingest(&batch(&refs)).unwrap();
        assert_eq!(result.valid_rows, 20);
        assert_eq!(result.invalid_rows, 0);
        assert!(result.errors.is_empty());

        let (items, total) = store.list(0, 100).unwrap();
        assert_eq!(total, 20);
        for (i, product) in items.iter().enumerate() {
            assert_eq!(product.id, i as i64 + 1);
            assert_eq!(product.sku, format!("SKU-{:02}", i + 1));
        }
    }

    #[test]
    fn test_duplicate_sku_in_batch_last_row_wins() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(&batch(&[
                "DUP,First,Acme,,,500,400,1",
                "OTHER,Other,Acme,,,500,400,1",
                "DUP,Second,Acme,,,500,450,2",
            ]))
            .unwrap();

        assert_eq!(result.valid_rows, 3);
        assert_eq!(store.count().unwrap(), 2);
        let dup = store.get("DUP").unwrap().unwrap();
        assert_eq!(dup.id, 1);
        assert_eq!(dup.price, 450.0);
        assert_eq!(dup.name, "Second");
    }

    #[test]
    fn test_invalid_update_leaves_prior_version() {
        let store = CatalogDb::open_in_memory().unwrap();
        let pipeline = IngestionPipeline::new(&store);
        pipeline.ingest(&batch(&["A,Shirt,Acme,Red,L,1000,800,3"])).unwrap();

        let result = pipeline.ingest(&batch(&["A,Shirt v2,Acme,Red,L,1000,1500,3"])).unwrap();
        assert_eq!(result.invalid_rows, 1);

        let stored = store.get("A").unwrap().unwrap();
        assert_eq!(stored.name, "Shirt");
        assert_eq!(stored.price, 800.0);
    }

    #[test]
    fn test_bad_rows_do_not_abort_batch() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(&batch(&[
                "A,Ok,Acme,,,100,90,1",
                ",Missing sku,Acme,,,100,90,1",
                "C,Bad qty,Acme,,,100,90,-4",
                "D,Ok too,Acme,,,100,100,0",
            ]))
            .unwrap();

        assert_eq!(result.total_rows, 4);
        assert_eq!(result.valid_rows, 2);
        assert_eq!(result.invalid_rows, 2);
        let rows: Vec<usize> = result.errors.iter().map(|e| e.row_number).collect();
        assert_eq!(rows, vec![2, 3]);
        assert_eq!(result.errors[1].messages, vec!["quantity: quantity must be non-negative"]);
        assert!(store.get("A").unwrap().is_some());
        assert!(store.get("D").unwrap().is_some());
    }

    #[test]
    fn test_column_order_and_optional_columns() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(b"quantity,price,mrp,brand,name,sku\n7,25,30,Acme,Cap,CAP-1\n")
            .unwrap();
        assert_eq!(result.valid_rows, 1);

        let cap = store.get("CAP-1").unwrap().unwrap();
        assert_eq!(cap.quantity, 7);
        assert_eq!(cap.price, 25.0);
        assert_eq!(cap.color, "");
    }

    #[test]
    fn test_short_row_reports_missing_fields() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(&batch(&["A,Shirt,Acme"]))
            .unwrap();
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(
            result.errors[0].messages,
            vec![
                "mrp: required field missing",
                "price: required field missing",
                "quantity: required field missing",
            ]
        );
        assert_eq!(result.errors[0].raw_fields["mrp"], "");
    }

    #[test]
    fn test_header_only_batch() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store).ingest(HEADER.as_bytes()).unwrap();
        assert_eq!(result, IngestionResult::default());
    }

    #[test]
    fn test_unreadable_batch_is_fatal() {
        let store = MemoryCatalogStore::new();
        let err = IngestionPipeline::new(&store).ingest(b"").unwrap_err();
        assert!(matches!(err, CatalogError::FileFormat(_)));

        let err = IngestionPipeline::new(&store)
            .ingest(b"sku,name\n\xC3\x28,bad\n")
            .unwrap_err();
        assert!(matches!(err, CatalogError::FileFormat(_)));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_result_serialises_with_wire_names() {
        let store = MemoryCatalogStore::new();
        let result = IngestionPipeline::new(&store)
            .ingest(&batch(&["A,Shirt,Acme,,,10,20,1"]))
            .unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["total_rows"], 1);
        assert_eq!(json["errors"][0]["row"], 1);
        assert_eq!(json["errors"][0]["data"]["sku"], "A");
        assert_eq!(
            json["errors"][0]["errors"][0],
            "price: price must be less than or equal to mrp"
        );
        assert_eq!(result.summary(), "Successfully processed 0 out of 1 products");
    }

    #[test]
    fn test_ensure_csv_upload() {
        assert!(ensure_csv_upload("products.csv").is_ok());
        assert!(ensure_csv_upload("PRODUCTS.CSV").is_ok());
        let err = ensure_csv_upload("products.xlsx").unwrap_err();
        assert!(matches!(err, CatalogError::FileFormat(ref m) if m == CSV_ONLY_MESSAGE));
    }

    #[test]
    fn test_ingest_file() {
        let tmp = TempDir::new().unwrap();
        let store = MemoryCatalogStore::new();
        let pipeline = IngestionPipeline::new(&store);

        let csv_path = tmp.path().join("upload.csv");
        std::fs::write(&csv_path, batch(&["A,Shirt,Acme,,,10,9,1"])).unwrap();
        assert_eq!(pipeline.ingest_file(&csv_path).unwrap().valid_rows, 1);

        let txt_path = tmp.path().join("upload.txt");
        std::fs::write(&txt_path, batch(&["B,Shirt,Acme,,,10,9,1"])).unwrap();
        assert!(pipeline.ingest_file(&txt_path).is_err());
        assert!(store.get("B").unwrap().is_none());
    }

    #[test]
    fn test_works_through_trait_object() {
        let store: Box<dyn CatalogStore> = Box::new(MemoryCatalogStore::new());
        let result = IngestionPipeline::new(store.as_ref())
            .ingest(&batch(&["A,Shirt,Acme,,,10,9,1"]))
            .unwrap();
        assert_eq!(result.valid_rows, 1);
    }
}
