use catalog::{CatalogDb, Result};
use std::path::Path;

const DEFAULT_DB_PATH: &str = "catalog.db";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// `:memory:` opens a throwaway in-memory catalog.
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparsable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        ServerConfig {
            db_path: lookup("CATALOG_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            host: lookup("CATALOG_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: lookup("CATALOG_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            max_upload_bytes: lookup("CATALOG_MAX_UPLOAD_BYTES")
                .and_then(|n| n.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        }
    }

    pub fn open_catalog(&self) -> Result<CatalogDb> {
        if self.db_path == ":memory:" {
            CatalogDb::open_in_memory()
        } else {
            CatalogDb::open(Path::new(&self.db_path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CatalogStore;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.db_path, "catalog.db");
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_overrides_and_bad_numbers() {
        let vars: HashMap<&str, &str> = [
            ("CATALOG_DB_PATH", ":memory:"),
            ("CATALOG_HOST", "0.0.0.0"),
            ("CATALOG_PORT", "not-a-port"),
            ("CATALOG_MAX_UPLOAD_BYTES", "2048"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_upload_bytes, 2048);

        let catalog = config.open_catalog().unwrap();
        assert!(catalog.path().is_none());
        assert_eq!(catalog.count().unwrap(), 0);
    }
}
