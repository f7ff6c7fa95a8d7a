//! # Validation Module
//!
//! Business rule validation for Colmado POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI shell                                                     │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE — business rule validation                       │
//! │  ├── Commit-time cart checks (never reach the backend on failure)      │
//! │  └── Field-level checks for quantities, prices, rates                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend ledger                                               │
//! │  └── The single source of truth rejects what slips through             │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::cart::Cart;
use crate::error::ValidationError;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
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

/// Validates a quantity value.
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

/// Validates a price in cents. Zero is allowed (free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
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

// =============================================================================
// Commit-Time Validation
// =============================================================================

/// Validates a cart for commit.
///
/// Rejected carts never reach the backend. Failures here are resolved
/// locally and surfaced as warnings.
///
/// ## Rules
/// - Cart must be non-empty
/// - Every line must have a product id set
/// - Every line quantity must be > 0
pub fn validate_for_commit(cart: &Cart) -> ValidationResult<()> {
    if cart.is_empty() {
        return Err(ValidationError::CartNotCommittable {
            reason: "cart is empty".to_string(),
        });
    }

    for (index, line) in cart.items.iter().enumerate() {
        if line.product_id.trim().is_empty() {
            return Err(ValidationError::CartNotCommittable {
                reason: format!("line {} has no product id", index),
            });
        }
        if line.quantity <= 0 {
            return Err(ValidationError::CartNotCommittable {
                reason: format!("line {} has non-positive quantity", index),
            });
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
    use crate::types::Product;
    use chrono::Utc;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category_id: None,
            price_cents: 1000,
            tax_rate_bps: 1800,
            current_stock: 10,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Malta Morena 330ml").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name("   ").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
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
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-100).is_err());
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(1800).is_ok());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_validate_for_commit_rejects_empty_cart() {
        let cart = Cart::new();
        let err = validate_for_commit(&cart).unwrap_err();
        assert!(err.to_string().contains("cart is empty"));
    }

    #[test]
    fn test_validate_for_commit_rejects_blank_product_id() {
        let mut cart = Cart::new();
        cart.add(&product("1")).unwrap();
        cart.items[0].product_id = "  ".to_string();

        let err = validate_for_commit(&cart).unwrap_err();
        assert!(err.to_string().contains("no product id"));
    }

    #[test]
    fn test_validate_for_commit_accepts_normal_cart() {
        let mut cart = Cart::new();
        cart.add(&product("1")).unwrap();
        assert!(validate_for_commit(&cart).is_ok());
    }
}
