//! # Validation Module
//!
//! Input validation and identifier normalization for Vendora.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP layer (schema validation, excluded from this repo)      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation, always BEFORE any    │
//! │           mutation. Empty-string SKUs/barcodes are normalized to       │
//! │           absent here so sparse uniqueness applies uniformly.          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite - NOT NULL, partial UNIQUE indexes, CHECK constraints │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{ValidationError, ValidationResult};
use crate::types::{NewProduct, ProductPatch, VariantDraft};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Normalization
// =============================================================================

/// Normalizes an optional business code (SKU, barcode).
///
/// Trims whitespace and maps empty strings to `None`, so an empty code
/// never participates in a uniqueness check.
///
/// ## Example
/// ```rust
/// use vendora_core::validation::normalize_code;
///
/// assert_eq!(normalize_code(Some("  ABC ".to_string())), Some("ABC".to_string()));
/// assert_eq!(normalize_code(Some("".to_string())), None);
/// assert_eq!(normalize_code(Some("   ".to_string())), None);
/// assert_eq!(normalize_code(None), None);
/// ```
pub fn normalize_code(code: Option<String>) -> Option<String> {
    match code {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        None => None,
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// Absence is legal; call this only on a normalized, present value.
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a barcode value.
///
/// ## Rules
/// - At most 64 characters
/// - No interior whitespace
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    if barcode.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 64,
        });
    }

    if barcode.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "price".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock level. Stock is never negative.
pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a payment amount in minor units. Zero payments are rejected.
pub fn validate_payment_amount(cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Draft Validators
// =============================================================================

fn validate_variant_draft(index: usize, draft: &VariantDraft) -> ValidationResult<()> {
    validate_price_cents(draft.price_cents)?;
    validate_stock(draft.stock)?;

    if let Some(sku) = normalize_code(draft.sku.clone()) {
        validate_sku(&sku)?;
    }
    if let Some(barcode) = normalize_code(draft.barcode.clone()) {
        validate_barcode(&barcode)?;
    }

    if draft.name.is_none() && draft.options.is_empty() {
        return Err(ValidationError::Required {
            field: format!("variants[{index}].name"),
        });
    }

    Ok(())
}

/// Validates a product creation draft. Field checks only; uniqueness is
/// the storage layer's concern.
pub fn validate_new_product(draft: &NewProduct) -> ValidationResult<()> {
    validate_name(&draft.name)?;
    validate_price_cents(draft.price_cents)?;

    if let Some(sku) = normalize_code(draft.sku.clone()) {
        validate_sku(&sku)?;
    }
    if let Some(barcode) = normalize_code(draft.barcode.clone()) {
        validate_barcode(&barcode)?;
    }
    if let Some(stock) = draft.stock {
        validate_stock(stock)?;
    }
    if let Some(bps) = draft.tax_rate_bps {
        validate_tax_rate_bps(bps)?;
    }
    validate_stock(draft.min_stock)?;

    for (index, variant) in draft.variants.iter().enumerate() {
        validate_variant_draft(index, variant)?;
    }

    Ok(())
}

/// Validates the fields present in a product patch.
pub fn validate_product_patch(patch: &ProductPatch) -> ValidationResult<()> {
    if let Some(name) = &patch.name {
        validate_name(name)?;
    }
    if let Some(price) = patch.price_cents {
        validate_price_cents(price)?;
    }
    if let Some(sku) = normalize_code(patch.sku.clone()) {
        validate_sku(&sku)?;
    }
    if let Some(barcode) = normalize_code(patch.barcode.clone()) {
        validate_barcode(&barcode)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    if let Some(bps) = patch.tax_rate_bps {
        validate_tax_rate_bps(bps)?;
    }
    if let Some(min_stock) = patch.min_stock {
        validate_stock(min_stock)?;
    }

    if let Some(variants) = &patch.variants {
        for (index, variant) in variants.iter().enumerate() {
            validate_variant_draft(index, variant)?;
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code(None), None);
        assert_eq!(normalize_code(Some("".to_string())), None);
        assert_eq!(normalize_code(Some("   ".to_string())), None);
        assert_eq!(
            normalize_code(Some(" ABC-1 ".to_string())),
            Some("ABC-1".to_string())
        );
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Cola 330ml").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("COLA-330").is_ok());
        assert!(validate_sku("product_1").is_ok());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("5449000000996").is_ok());
        assert!(validate_barcode("has space").is_err());
        assert!(validate_barcode(&"9".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_and_stock() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let mut draft = NewProduct {
            name: "Tea".to_string(),
            price_cents: 500,
            category: "beverages".to_string(),
            ..Default::default()
        };
        assert!(validate_new_product(&draft).is_ok());

        // Empty-string codes normalize away instead of failing format checks.
        draft.sku = Some("".to_string());
        draft.barcode = Some("  ".to_string());
        assert!(validate_new_product(&draft).is_ok());

        draft.price_cents = -5;
        assert!(validate_new_product(&draft).is_err());
    }

    #[test]
    fn test_validate_variantless_patch() {
        let patch = ProductPatch {
            price_cents: Some(750),
            ..Default::default()
        };
        assert!(validate_product_patch(&patch).is_ok());

        let patch = ProductPatch {
            stock: Some(-2),
            ..Default::default()
        };
        assert!(validate_product_patch(&patch).is_err());
    }

    #[test]
    fn test_variant_draft_needs_a_label() {
        let draft = NewProduct {
            name: "Shirt".to_string(),
            category: "apparel".to_string(),
            variants: vec![VariantDraft::default()],
            ..Default::default()
        };
        assert!(validate_new_product(&draft).is_err());

        let draft = NewProduct {
            name: "Shirt".to_string(),
            category: "apparel".to_string(),
            variants: vec![VariantDraft {
                options: vec!["Red".to_string()],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(validate_new_product(&draft).is_ok());
    }
}
