//! # Cart Ledger
//!
//! The in-memory ordered list of line items for the active register session.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Ledger Operations                               │
//! │                                                                         │
//! │  Shell Action             Operation               Cart Change           │
//! │  ────────────             ─────────               ───────────           │
//! │                                                                         │
//! │  Click Product ─────────► add(product) ─────────► qty += 1 or push     │
//! │                                                                         │
//! │  Change Quantity ───────► set_quantity(i, n) ───► clamp to stock       │
//! │                                                                         │
//! │  Click Remove ──────────► remove(i) ────────────► items.remove(i)      │
//! │                                                                         │
//! │  Apply Discount ────────► set_discount(m) ──────► clamp [0, total]     │
//! │                                                                         │
//! │  Click Clear ───────────► clear() ──────────────► items/discount/notes │
//! │                                                                         │
//! │  Totals are DERIVED on every read — there is no cached total that      │
//! │  can go stale relative to the lines.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per `product_id`; repeated adds increment quantity
//! - The tax split is frozen on the line at add time; quantity edits multiply
//!   the frozen unit figures and never re-derive them
//! - `discount` is clamped to `[0, subtotal_with_tax]`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{split_inclusive, Money};
use crate::types::{PaymentMethod, Product, SaleLine};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// An item in the cart.
///
/// ## Price Freezing
/// Both unit prices (with and without tax) are captured when the product is
/// added. If the product price changes in the catalog afterwards, this line
/// retains the original figures — and repeated quantity edits can never
/// accumulate rounding drift because the division happens exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Product ID (UUID).
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Tax-inclusive unit price in cents (frozen).
    pub unit_price_cents: i64,

    /// Pre-tax unit price in cents (frozen, derived once via the tax split).
    pub unit_price_ex_tax_cents: i64,

    /// Tax rate in basis points at time of adding (frozen).
    pub tax_rate_bps: u32,

    /// Whether the product was tax-exempt (zero rate) when added.
    pub is_exempt: bool,

    /// Quantity in cart (always ≥ 1).
    pub quantity: i64,

    /// When this item was added to the cart.
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Creates a line item from a product, splitting the tax-inclusive price
    /// exactly once.
    pub fn from_product(product: &Product) -> Self {
        let split = split_inclusive(product.price(), product.tax_rate());
        LineItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_cents: product.price_cents,
            unit_price_ex_tax_cents: split.price_without_tax.cents(),
            tax_rate_bps: product.tax_rate_bps,
            is_exempt: split.is_exempt,
            quantity: 1,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal including tax (`unit_price × quantity`).
    pub fn line_subtotal_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line contribution to the pre-tax subtotal.
    ///
    /// Exempt lines contribute their FULL price here (their pre-tax and
    /// shelf prices are identical).
    pub fn line_subtotal_ex_tax_cents(&self) -> i64 {
        self.unit_price_ex_tax_cents * self.quantity
    }

    /// Line contribution to the tax amount.
    pub fn line_tax_cents(&self) -> i64 {
        (self.unit_price_cents - self.unit_price_ex_tax_cents) * self.quantity
    }

    /// Snapshots this line for an immutable sale record.
    pub fn to_sale_line(&self) -> SaleLine {
        SaleLine {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            unit_price_cents: self.unit_price_cents,
            unit_price_ex_tax_cents: self.unit_price_ex_tax_cents,
            tax_rate_bps: self.tax_rate_bps,
            is_exempt: self.is_exempt,
            quantity: self.quantity,
            line_total_cents: self.line_subtotal_cents(),
        }
    }
}

// =============================================================================
// Quantity Outcome
// =============================================================================

/// Result of a `set_quantity` call.
///
/// Stock conflicts are NOT hard failures: the quantity is capped and the
/// caller surfaces a warning. Non-positive quantities are rejected no-ops —
/// the caller decides whether to tell the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityOutcome {
    /// Quantity applied as requested.
    Updated,
    /// Requested quantity exceeded the last-known stock; capped. `stock`
    /// is the quantity actually applied (floored at 1).
    ClampedToStock { stock: i64 },
    /// Requested quantity was < 1; cart unchanged.
    RejectedNonPositive,
}

// =============================================================================
// Cart
// =============================================================================

/// The cart ledger.
///
/// Exclusively owned by the active register session; cross-view sync never
/// mutates the cart, only the catalog cache it checks stock against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Ordered line items, at most one per product.
    pub items: Vec<LineItem>,

    /// Whole-cart discount in cents, clamped on write.
    pub discount_cents: i64,

    /// Free-form note for the receipt.
    pub notes: Option<String>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            discount_cents: 0,
            notes: None,
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart, or increments its quantity by one if it
    /// is already present (at most one line per product).
    pub fn add(&mut self, product: &Product) -> CoreResult<()> {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let new_qty = item.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(LineItem::from_product(product));
        Ok(())
    }

    /// Removes the line at `index`, returning it.
    ///
    /// Emptying the cart is not an error; an out-of-range index is a no-op
    /// returning `None`.
    pub fn remove(&mut self, index: usize) -> Option<LineItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// Sets the quantity of the line at `index`.
    ///
    /// ## Contract
    /// - `n < 1` is rejected (no-op outcome, cart unchanged)
    /// - `n` above `known_stock` is capped to the stock value; the caller
    ///   surfaces the warning
    /// - `known_stock = None` means stock is not tracked for this product
    pub fn set_quantity(
        &mut self,
        index: usize,
        n: i64,
        known_stock: Option<i64>,
    ) -> CoreResult<QuantityOutcome> {
        let item = self
            .items
            .get_mut(index)
            .ok_or(CoreError::LineNotFound(index))?;

        if n < 1 {
            return Ok(QuantityOutcome::RejectedNonPositive);
        }

        if n > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: n,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if let Some(stock) = known_stock {
            if n > stock {
                // Stock conflict is a clamp with warning, not a hard failure.
                // Lines never drop below quantity 1, so the outcome reports
                // the quantity actually applied, not the raw stock figure.
                let applied = stock.max(1);
                item.quantity = applied;
                return Ok(QuantityOutcome::ClampedToStock { stock: applied });
            }
        }

        item.quantity = n;
        Ok(QuantityOutcome::Updated)
    }

    /// Sets the whole-cart discount, clamped to `[0, subtotal_with_tax]`.
    pub fn set_discount(&mut self, discount: Money) {
        let ceiling = Money::from_cents(self.subtotal_with_tax_cents());
        self.discount_cents = discount.clamp_to(Money::zero(), ceiling).cents();
    }

    /// Clears all items and resets discount and notes.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount_cents = 0;
        self.notes = None;
        self.created_at = Utc::now();
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of unique lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Pre-tax subtotal. Exempt lines contribute their full price.
    pub fn subtotal_ex_tax_cents(&self) -> i64 {
        self.items
            .iter()
            .map(|i| i.line_subtotal_ex_tax_cents())
            .sum()
    }

    /// Total tax amount.
    pub fn tax_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_tax_cents()).sum()
    }

    /// Tax-inclusive subtotal before discount.
    pub fn subtotal_with_tax_cents(&self) -> i64 {
        self.items.iter().map(|i| i.line_subtotal_cents()).sum()
    }

    /// Grand total: `subtotal_ex_tax + tax − discount`.
    ///
    /// The discount is re-clamped on read so a discount set against a fuller
    /// cart can never push the total negative after lines are removed.
    pub fn total_cents(&self) -> i64 {
        let subtotal_with_tax = self.subtotal_with_tax_cents();
        let discount = self.discount_cents.clamp(0, subtotal_with_tax);
        self.subtotal_ex_tax_cents() + self.tax_cents() - discount
    }

    /// Derived totals snapshot for the shell.
    pub fn totals(&self) -> CartTotals {
        CartTotals::from(self)
    }

    /// Computes the tender summary for a payment.
    ///
    /// Change is defined only for Cash and may be NEGATIVE (under-payment) —
    /// surfaced as-is, not blocked; the caller decides whether to accept it.
    /// Non-cash methods always tender exactly the total.
    pub fn tender(&self, method: PaymentMethod, amount_received: Money) -> Tender {
        let total = Money::from_cents(self.total_cents());
        if method.supports_change() {
            Tender {
                amount_received,
                change: amount_received - total,
            }
        } else {
            Tender {
                amount_received: total,
                change: Money::zero(),
            }
        }
    }

    /// Snapshots all lines for an immutable sale record.
    pub fn sale_lines(&self) -> Vec<SaleLine> {
        self.items.iter().map(LineItem::to_sale_line).collect()
    }
}

// =============================================================================
// Derived Views
// =============================================================================

/// Cart totals summary, recomputed on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_ex_tax_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl From<&Cart> for CartTotals {
    fn from(cart: &Cart) -> Self {
        let subtotal_with_tax = cart.subtotal_with_tax_cents();
        CartTotals {
            line_count: cart.line_count(),
            total_quantity: cart.total_quantity(),
            subtotal_ex_tax_cents: cart.subtotal_ex_tax_cents(),
            tax_cents: cart.tax_cents(),
            discount_cents: cart.discount_cents.clamp(0, subtotal_with_tax),
            total_cents: cart.total_cents(),
        }
    }
}

/// Amount tendered and change due for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
    pub amount_received: Money,
    pub change: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxRate;

    fn product(id: &str, price_cents: i64, tax_bps: u32, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category_id: None,
            price_cents,
            tax_rate_bps: tax_bps,
            current_stock: stock,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_same_product_twice_merges_lines() {
        let mut cart = Cart::new();
        let p = product("1", 11800, 1800, 10);

        cart.add(&p).unwrap();
        cart.add(&p).unwrap();

        // Exactly one line with quantity 2, never two lines.
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn test_tax_split_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut p = product("1", 11800, 1800, 10);
        cart.add(&p).unwrap();

        // Catalog price changes AFTER the add; the line keeps the original.
        p.price_cents = 99900;
        cart.set_quantity(0, 5, Some(10)).unwrap();

        assert_eq!(cart.items[0].unit_price_cents, 11800);
        assert_eq!(cart.items[0].unit_price_ex_tax_cents, 10000);
        assert_eq!(cart.subtotal_ex_tax_cents(), 50000);
    }

    #[test]
    fn test_exempt_line_contributes_full_price_ex_tax() {
        let mut cart = Cart::new();
        cart.add(&product("ex", 5000, 0, 10)).unwrap();

        assert!(cart.items[0].is_exempt);
        assert_eq!(cart.subtotal_ex_tax_cents(), 5000);
        assert_eq!(cart.tax_cents(), 0);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 10)).unwrap();

        assert!(cart.remove(5).is_none());
        assert_eq!(cart.line_count(), 1);

        assert!(cart.remove(0).is_some());
        assert!(cart.is_empty());
        // Emptying the cart is not an error.
        assert!(cart.remove(0).is_none());
    }

    #[test]
    fn test_set_quantity_clamps_to_stock() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 3)).unwrap();

        let outcome = cart.set_quantity(0, 10, Some(3)).unwrap();
        assert_eq!(outcome, QuantityOutcome::ClampedToStock { stock: 3 });
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[test]
    fn test_set_quantity_zero_stock_clamp_reports_applied_quantity() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 0)).unwrap();

        // The line floor is 1 even when the cached stock says 0; the
        // outcome must report the figure the line actually holds.
        let outcome = cart.set_quantity(0, 5, Some(0)).unwrap();
        assert_eq!(outcome, QuantityOutcome::ClampedToStock { stock: 1 });
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[test]
    fn test_set_quantity_rejects_non_positive() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 10)).unwrap();
        cart.set_quantity(0, 4, Some(10)).unwrap();

        for n in [0, -3] {
            let outcome = cart.set_quantity(0, n, Some(10)).unwrap();
            assert_eq!(outcome, QuantityOutcome::RejectedNonPositive);
            assert_eq!(cart.items[0].quantity, 4, "cart must be unchanged");
        }
    }

    #[test]
    fn test_set_quantity_untracked_stock() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 0)).unwrap();

        let outcome = cart.set_quantity(0, 50, None).unwrap();
        assert_eq!(outcome, QuantityOutcome::Updated);
        assert_eq!(cart.items[0].quantity, 50);
    }

    #[test]
    fn test_end_to_end_totals_itbis() {
        // One product at RD$118.00 (18% ITBIS inclusive), qty 2.
        let mut cart = Cart::new();
        let p = product("1", 11800, 1800, 10);
        cart.add(&p).unwrap();
        cart.add(&p).unwrap();

        assert_eq!(cart.subtotal_ex_tax_cents(), 20000);
        assert_eq!(cart.tax_cents(), 3600);
        assert_eq!(cart.total_cents(), 23600);

        cart.set_discount(Money::from_cents(3600));
        assert_eq!(cart.total_cents(), 20000);
    }

    #[test]
    fn test_discount_clamped_to_subtotal_with_tax() {
        let mut cart = Cart::new();
        cart.add(&product("1", 11800, 1800, 10)).unwrap();

        cart.set_discount(Money::from_cents(-500));
        assert_eq!(cart.discount_cents, 0);

        cart.set_discount(Money::from_cents(999_999));
        assert_eq!(cart.discount_cents, 11800);
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn test_discount_reclamped_after_line_removal() {
        let mut cart = Cart::new();
        cart.add(&product("1", 11800, 1800, 10)).unwrap();
        cart.add(&product("2", 5000, 0, 10)).unwrap();
        cart.set_discount(Money::from_cents(10000));

        cart.remove(0);
        // Discount may not exceed the remaining subtotal-with-tax.
        assert_eq!(cart.total_cents(), 0);
    }

    #[test]
    fn test_cash_change_may_go_negative() {
        let mut cart = Cart::new();
        let mut p = product("1", 8000, 0, 10);
        p.name = "flat".into();
        cart.add(&p).unwrap();

        let t = cart.tender(PaymentMethod::Cash, Money::from_cents(10000));
        assert_eq!(t.change.cents(), 2000);

        // Under-payment surfaces negative change, never blocks.
        let t = cart.tender(PaymentMethod::Cash, Money::from_cents(5000));
        assert_eq!(t.change.cents(), -3000);
    }

    #[test]
    fn test_non_cash_tender_is_exact() {
        let mut cart = Cart::new();
        cart.add(&product("1", 8000, 0, 10)).unwrap();

        for method in [PaymentMethod::Card, PaymentMethod::Transfer] {
            let t = cart.tender(method, Money::from_cents(99999));
            assert_eq!(t.amount_received.cents(), 8000);
            assert_eq!(t.change.cents(), 0);
        }
    }

    #[test]
    fn test_clear_resets_discount_and_notes() {
        let mut cart = Cart::new();
        cart.add(&product("1", 1000, 0, 10)).unwrap();
        cart.set_discount(Money::from_cents(100));
        cart.notes = Some("regular customer".into());

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.discount_cents, 0);
        assert!(cart.notes.is_none());
    }
}
