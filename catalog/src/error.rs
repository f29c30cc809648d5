use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    /// The batch could not be decoded as CSV at all. Fatal for the whole request.
    #[error("File format error: {0}")]
    FileFormat(String),

    /// Caller-supplied query parameters are contradictory or malformed.
    #[error("Invalid query parameters: {0}")]
    QueryParameter(String),

    #[error("Product not found: {sku}")]
    NotFound { sku: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
