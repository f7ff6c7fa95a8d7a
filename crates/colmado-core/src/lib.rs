//! # colmado-core: Pure Business Logic for Colmado POS
//!
//! This crate is the **heart** of the transaction engine. It contains the
//! cart ledger, the tax-inclusive price split and the domain types as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Colmado POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI Shell (out of scope)                      │   │
//! │  │    Product grid ──► Cart view ──► Tender ──► Receipt           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 colmado-register (session layer)                │   │
//! │  │    commit coordinator, print pipeline, alert queue              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ colmado-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   cart    │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │   Cart    │  │   rules   │  │   │
//! │  │   │   Sale    │  │ TaxSplit  │  │ LineItem  │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: all monetary values are in cents (i64) to avoid float drift
//! 4. **Frozen Tax Split**: the inclusive/pre-tax split happens exactly once,
//!    at add-to-cart time; everything after is multiplication
//!
//! ## Example Usage
//!
//! ```rust
//! use colmado_core::money::{Money, split_inclusive};
//! use colmado_core::types::TaxRate;
//!
//! // RD$118.00 shelf price with 18% ITBIS baked in
//! let split = split_inclusive(Money::from_cents(11800), TaxRate::from_bps(1800));
//! assert_eq!(split.price_without_tax.cents(), 10000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use colmado_core::Cart` instead of
// `use colmado_core::cart::Cart`

pub use cart::{Cart, CartTotals, LineItem, QuantityOutcome, Tender};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{split_inclusive, Money, TaxSplit};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum items allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;
