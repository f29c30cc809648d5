use crate::product::NewProduct;
use crate::row_parser::RawRow;

/// Fields that must be present and non-blank in every row.
pub const REQUIRED_FIELDS: [&str; 6] = ["sku", "name", "brand", "mrp", "price", "quantity"];

/// Validate one decoded row and build a product from it.
///
/// Every rule is checked; a row can fail several at once. A numeric field
/// that does not parse is reported once and skipped by the business rules,
/// which still run for the other fields. Cell values are trimmed first.
pub fn validate_row(fields: &RawRow) -> Result<NewProduct, Vec<String>> {
    let mut errors = Vec::new();

    for name in REQUIRED_FIELDS {
        if value(fields, name).is_empty() {
            errors.push(format!("{name}: required field missing"));
        }
    }

    let mrp = coerce_decimal(fields, "mrp", &mut errors);
    let price = coerce_decimal(fields, "price", &mut errors);
    let quantity = coerce_integer(fields, "quantity", &mut errors);

    if let Some(mrp) = mrp {
        if mrp <= 0.0 {
            errors.push("mrp: must be greater than zero".to_string());
        }
    }
    if let Some(price) = price {
        if price <= 0.0 {
            errors.push("price: must be greater than zero".to_string());
        }
    }
    if let (Some(mrp), Some(price)) = (mrp, price) {
        if price > mrp {
            errors.push("price: price must be less than or equal to mrp".to_string());
        }
    }
    if let Some(quantity) = quantity {
        if quantity < 0 {
            errors.push("quantity: quantity must be non-negative".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    // No errors means every required field was present and coerced.
    let (Some(mrp), Some(price), Some(quantity)) = (mrp, price, quantity) else {
        return Err(errors);
    };

    Ok(NewProduct {
        sku: value(fields, "sku").to_string(),
        name: value(fields, "name").to_string(),
        brand: value(fields, "brand").to_string(),
        color: value(fields, "color").to_string(),
        size: value(fields, "size").to_string(),
        mrp,
        price,
        quantity,
    })
}

fn value<'a>(fields: &'a RawRow, name: &str) -> &'a str {
    fields.get(name).map(|v| v.trim()).unwrap_or("")
}

/// Blank values yield `None` without a message; the required check owns those.
fn coerce_decimal(fields: &RawRow, name: &str, errors: &mut Vec<String>) -> Option<f64> {
    let raw = value(fields, name);
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() => Some(n),
        _ => {
            errors.push(format!("{name}: must be a number"));
            None
        }
    }
}

fn coerce_integer(fields: &RawRow, name: &str, errors: &mut Vec<String>) -> Option<i64> {
    let raw = value(fields, name);
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.push(format!("{name}: must be a non-negative integer"));
            None
        }
    }
}
