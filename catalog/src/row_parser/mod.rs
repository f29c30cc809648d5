//! Structural decoding of CSV batches.
//!
//! Turns raw upload bytes into a header plus one [`RawRow`] per data line.
//! Nothing here coerces types or applies business rules; a row that is
//! short, long or full of garbage still decodes. Only a batch that cannot be
//! read as CSV at all fails, and it fails as a whole.

use crate::error::{CatalogError, Result};
use csv::StringRecord;
use std::collections::BTreeMap;

/// Column names the catalog understands, in canonical order.
pub const PRODUCT_FIELDS: [&str; 8] = [
    "sku", "name", "brand", "color", "size", "mrp", "price", "quantity",
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const ENCODING_MESSAGE: &str = "Invalid CSV file encoding. Please use UTF-8 encoding";
pub const EMPTY_MESSAGE: &str = "CSV file is empty or has no header row";

/// Field name to untouched cell text for a single data row.
pub type RawRow = BTreeMap<String, String>;

/// The header row of a batch. Names are trimmed and lower-cased so that
/// lookup does not depend on column order or capitalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    names: Vec<String>,
}

impl Header {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Header {
            names: names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Map one row positionally onto the header.
    ///
    /// Cells past the last header column are dropped; header columns with no
    /// cell map to the empty string. Blank header names are skipped.
    pub fn map_row<'r, I>(&self, values: I) -> RawRow
    where
        I: IntoIterator<Item = &'r str>,
    {
        let mut values = values.into_iter();
        let mut row = RawRow::new();
        for name in &self.names {
            let value = values.next().unwrap_or("");
            if !name.is_empty() {
                row.insert(name.clone(), value.to_string());
            }
        }
        row
    }

    /// Header columns that are not catalog fields.
    pub fn unknown_columns(&self) -> Vec<&str> {
        self.names
            .iter()
            .filter(|n| !n.is_empty() && !PRODUCT_FIELDS.contains(&n.as_str()))
            .map(|n| n.as_str())
            .collect()
    }
}

/// A fully decoded batch: header plus data rows in file order.
#[derive(Debug, Clone)]
pub struct RawBatch {
    pub header: Header,
    pub rows: Vec<RawRow>,
}

/// Decode a whole batch up front.
///
/// The full input is read before any row is handed on, so a malformed file
/// is rejected before anything touches the store.
pub fn decode_batch(bytes: &[u8]) -> Result<RawBatch> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let text = std::str::from_utf8(bytes)
        .map_err(|_| CatalogError::FileFormat(ENCODING_MESSAGE.to_string()))?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut record = StringRecord::new();
    let mut header: Option<Header> = None;
    let mut rows = Vec::new();

    while reader.read_record(&mut record).map_err(format_error)? {
        // First record is the header
        if header.is_none() {
            header = Some(Header::new(record.iter()));
            continue;
        }
        if let Some(h) = &header {
            rows.push(h.map_row(record.iter()));
        }
    }

    let header = match header {
        Some(h) if h.names().iter().any(|n| !n.is_empty()) => h,
        _ => return Err(CatalogError::FileFormat(EMPTY_MESSAGE.to_string())),
    };

    Ok(RawBatch { header, rows })
}

fn format_error(e: csv::Error) -> CatalogError {
    match e.position() {
        Some(pos) => CatalogError::FileFormat(format!(
            "Malformed CSV near line {}: {}",
            pos.line(),
            e
        )),
        None => CatalogError::FileFormat(format!("Malformed CSV: {e}")),
    }
}
