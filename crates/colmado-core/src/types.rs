//! # Domain Types
//!
//! Core domain types used throughout Colmado POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleLine     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (backend!)  │   │  product_id     │       │
//! │  │  name           │   │  status         │   │  name snapshot  │       │
//! │  │  price_cents    │   │  total_cents    │   │  frozen prices  │       │
//! │  │  (ITBIS incl.)  │   │  payment_method │   │  quantity       │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  Pending        │   │  Cash           │       │
//! │  │  1800 = 18%     │   │  Completed      │   │  Card           │       │
//! │  └─────────────────┘   │  Cancelled      │   │  Transfer       │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! - A `Sale` is built by the register but owned by the backend ledger once
//!   `status = Completed`; only the backend assigns its `id`.
//! - Catalog prices are TAX-INCLUSIVE; the pre-tax figure lives on the cart
//!   line item, frozen at add time (see `money::split_inclusive`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% (ITBIS standard rate)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (for convenience).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate. A zero-rated product is tax-exempt.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero (exempt).
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Product / Catalog Entities
// =============================================================================

/// A product available for sale.
///
/// `price_cents` is the shelf price WITH tax baked in; `current_stock` is a
/// cache that may be stale until the next sync event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Tax-inclusive shelf price in cents.
    pub price_cents: i64,

    /// Tax rate in basis points (1800 = 18%). Zero means exempt.
    pub tax_rate_bps: u32,

    /// Last-known stock level (stale-tolerant cache, see SyncBus).
    pub current_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the tax-inclusive price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

/// A product category (listing/filtering collaborator data).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
}

/// A customer known to the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub document: Option<String>,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was paid.
///
/// Malformed method strings are REJECTED at parse time rather than silently
/// normalized to Cash; silently rewriting financial data was flagged as a
/// latent bug in the original design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment. The only method where change is defined.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// Parses a user/shell-supplied method string.
    ///
    /// Lenient on known spellings, strict on everything else.
    ///
    /// ## Example
    /// ```rust
    /// use colmado_core::types::PaymentMethod;
    ///
    /// assert_eq!(PaymentMethod::parse("cash").unwrap(), PaymentMethod::Cash);
    /// assert_eq!(PaymentMethod::parse("Credit").unwrap(), PaymentMethod::Card);
    /// assert!(PaymentMethod::parse("bitcoin").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<Self, ValidationError> {
        match value.trim().to_lowercase().as_str() {
            "cash" | "efectivo" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" | "tarjeta" => Ok(PaymentMethod::Card),
            "transfer" | "transferencia" => Ok(PaymentMethod::Transfer),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".into(), "card".into(), "transfer".into()],
            }),
        }
    }

    /// Whether change is meaningful for this method.
    #[inline]
    pub const fn supports_change(&self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Built locally, not yet accepted by the backend.
    Pending,
    /// Accepted by the backend ledger (terminal success).
    Completed,
    /// Cancelled/refunded after the fact.
    Cancelled,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Pending
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A line of a sale. Snapshot pattern: product data is frozen at sale time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Tax-inclusive unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Pre-tax unit price in cents (frozen at add-to-cart time).
    pub unit_price_ex_tax_cents: i64,
    /// Tax rate in basis points at time of sale.
    pub tax_rate_bps: u32,
    /// Whether the line was tax-exempt.
    pub is_exempt: bool,
    /// Quantity sold.
    pub quantity: i64,
    /// Line total including tax (unit price × quantity).
    pub line_total_cents: i64,
}

/// A sale transaction. Immutable once created.
///
/// `id` is `None` until the backend — the single source of truth for sale
/// identity — assigns one. A commit response without an id is a hard failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Backend-assigned identifier.
    pub id: Option<String>,
    pub customer_id: Option<String>,
    pub status: SaleStatus,
    pub subtotal_ex_tax_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Amount tendered. For non-cash methods this equals the total.
    pub amount_received_cents: i64,
    /// Change due. Defined only for Cash; zero otherwise.
    pub change_cents: i64,
    pub lines: Vec<SaleLine>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
