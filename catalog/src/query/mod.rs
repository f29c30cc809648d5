use crate::error::{CatalogError, Result};
use crate::filter::{Criterion, ProductFilter};
use crate::product::Product;
use crate::store::CatalogStore;
use serde::Serialize;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// One page of products plus the number of matches across all pages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPage {
    pub total: usize,
    pub page: u64,
    pub limit: u64,
    pub products: Vec<Product>,
}

/// Normalised paging: `page >= 1`, `1 <= limit <= 100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    /// Clamp caller-supplied values instead of rejecting them.
    pub fn new(page: i64, limit: i64) -> Self {
        Pagination {
            page: page.max(1) as u64,
            limit: limit.clamp(1, MAX_LIMIT) as u64,
        }
    }

    pub fn offset(&self) -> usize {
        let offset = (self.page - 1).saturating_mul(self.limit);
        usize::try_from(offset).unwrap_or(usize::MAX)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(DEFAULT_PAGE, DEFAULT_LIMIT)
    }
}

/// Search filters as supplied by a caller. Absent or blank text filters
/// match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchParams {
    pub brand: Option<String>,
    pub color: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SearchParams {
    /// Check the parameters and turn them into a store filter.
    pub fn to_filter(&self) -> Result<ProductFilter> {
        for (name, bound) in [("minPrice", self.min_price), ("maxPrice", self.max_price)] {
            if let Some(bound) = bound {
                if !bound.is_finite() || bound < 0.0 {
                    return Err(CatalogError::QueryParameter(format!(
                        "{name} must be a non-negative number"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(CatalogError::QueryParameter(
                    "minPrice cannot be greater than maxPrice".to_string(),
                ));
            }
        }

        let mut filter = ProductFilter::new();
        if let Some(brand) = non_blank(&self.brand) {
            filter = filter.and(Criterion::BrandContains(brand.to_string()));
        }
        if let Some(color) = non_blank(&self.color) {
            filter = filter.and(Criterion::ColorContains(color.to_string()));
        }
        if let Some(min) = self.min_price {
            filter = filter.and(Criterion::MinPrice(min));
        }
        if let Some(max) = self.max_price {
            filter = filter.and(Criterion::MaxPrice(max));
        }
        Ok(filter)
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Read side of the catalog: listing and filtered search, both paginated.
pub struct QueryEngine<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> QueryEngine<'a, S> {
    pub fn new(store: &'a S) -> Self {
        QueryEngine { store }
    }

    pub fn list_page(&self, page: i64, limit: i64) -> Result<QueryPage> {
        let paging = Pagination::new(page, limit);
        let (products, total) = self.store.list(paging.offset(), paging.limit as usize)?;
        Ok(QueryPage {
            total,
            page: paging.page,
            limit: paging.limit,
            products,
        })
    }

    /// Parameters are checked before the store is touched.
    pub fn search_page(&self, params: &SearchParams, page: i64, limit: i64) -> Result<QueryPage> {
        let filter = params.to_filter()?;
        let paging = Pagination::new(page, limit);
        let (products, total) =
            self.store
                .search(&filter, paging.offset(), paging.limit as usize)?;
        Ok(QueryPage {
            total,
            page: paging.page,
            limit: paging.limit,
            products,
        })
    }
}
