//! # Stock Derivation
//!
//! A product's stock level has two possible sources:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Where Stock Comes From                             │
//! │                                                                         │
//! │  Product WITHOUT variants          Product WITH variants                │
//! │  ────────────────────────          ─────────────────────                │
//! │  stock = caller-supplied value     stock = SUM(variant.stock)           │
//! │  (Explicit)                        (DerivedFromVariants)                │
//! │                                                                         │
//! │  The source is resolved at every write that touches the product or     │
//! │  its variants. A caller-supplied stock value on a variant product is   │
//! │  never trusted.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Tagged source of a product's stock value, resolved at every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockSource {
    /// Caller-supplied stock for a variant-free product.
    Explicit(i64),
    /// Stock is the sum of the variant stock levels.
    DerivedFromVariants,
}

impl StockSource {
    /// Classifies the stock source for a write.
    ///
    /// A product with at least one variant always derives its stock;
    /// the explicit value (defaulting to 0 when absent) is used otherwise.
    pub fn classify(explicit: Option<i64>, has_variants: bool) -> Self {
        if has_variants {
            StockSource::DerivedFromVariants
        } else {
            StockSource::Explicit(explicit.unwrap_or(0))
        }
    }

    /// Resolves the stock value to persist.
    pub fn resolve<I>(self, variant_stocks: I) -> i64
    where
        I: IntoIterator<Item = i64>,
    {
        match self {
            StockSource::Explicit(n) => n,
            StockSource::DerivedFromVariants => variant_stocks.into_iter().sum(),
        }
    }
}
