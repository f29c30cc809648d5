use crate::product::Product;

/// A single search condition on a stored product.
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    /// Case-insensitive substring match on `brand`.
    BrandContains(String),
    /// Case-insensitive substring match on `color`.
    ColorContains(String),
    /// `price >= bound`
    MinPrice(f64),
    /// `price <= bound`
    MaxPrice(f64),
}

impl Criterion {
    pub fn matches(&self, product: &Product) -> bool {
        match self {
            Criterion::BrandContains(needle) => contains_ignore_case(&product.brand, needle),
            Criterion::ColorContains(needle) => contains_ignore_case(&product.color, needle),
            Criterion::MinPrice(bound) => product.price >= *bound,
            Criterion::MaxPrice(bound) => product.price <= *bound,
        }
    }

    /// SQL condition over the `products` table with a single `?` placeholder,
    /// plus the value to bind to it. Text needles are folded here and compared
    /// against `fold_lower`, which the catalog database registers per connection.
    pub fn to_sql(&self) -> (&'static str, rusqlite::types::Value) {
        use rusqlite::types::Value;
        match self {
            Criterion::BrandContains(needle) => (
                "instr(fold_lower(brand), ?) > 0",
                Value::Text(needle.to_lowercase()),
            ),
            Criterion::ColorContains(needle) => (
                "instr(fold_lower(color), ?) > 0",
                Value::Text(needle.to_lowercase()),
            ),
            Criterion::MinPrice(bound) => ("price >= ?", Value::Real(*bound)),
            Criterion::MaxPrice(bound) => ("price <= ?", Value::Real(*bound)),
        }
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// A conjunction of criteria. The empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
    criteria: Vec<Criterion>,
}

impl ProductFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a criterion; all criteria must hold for a product to match.
    pub fn and(mut self, criterion: Criterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.criteria.iter().all(|c| c.matches(product))
    }

    /// Render as a `WHERE` clause (empty string when there are no criteria)
    /// and its bind values in placeholder order.
    pub fn to_sql(&self) -> (String, Vec<rusqlite::types::Value>) {
        if self.criteria.is_empty() {
            return (String::new(), Vec::new());
        }
        let (clauses, values): (Vec<&str>, Vec<_>) =
            self.criteria.iter().map(Criterion::to_sql).unzip();
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}
