//! # Money Module
//!
//! Provides the `Money` type and the tax-inclusive price split.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Catalog prices are TAX-INCLUSIVE here (ITBIS baked in). Deriving the  │
//! │  pre-tax price with floats and re-deriving it on every quantity edit   │
//! │  drifts away from the authoritative unit price.                        │
//! │                                                                         │
//! │  OUR SOLUTION: integer cents + one split, frozen on the line item.     │
//! │    RD$118.00 at 18% → pre-tax RD$100.00, computed ONCE at add time.    │
//! │    Quantity edits multiply the frozen figures, never re-divide.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use colmado_core::money::{Money, split_inclusive};
//! use colmado_core::types::TaxRate;
//!
//! let shelf_price = Money::from_cents(11800);          // RD$118.00, ITBIS included
//! let split = split_inclusive(shelf_price, TaxRate::from_bps(1800));
//!
//! assert_eq!(split.price_without_tax.cents(), 10000);  // RD$100.00
//! assert!(!split.is_exempt);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

use crate::types::TaxRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (centavos).
///
/// ## Design Decisions
/// - **i64 (signed)**: negative values are legal — under-payment change is
///   surfaced as-is, never blocked (the caller decides)
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: prices enter the system as cents, period
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (pesos) portion.
    #[inline]
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies by a quantity (line subtotals).
    ///
    /// This is the ONLY arithmetic a quantity edit is allowed to perform on a
    /// frozen unit price — see [`split_inclusive`].
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Clamps the value into `[lo, hi]`.
    ///
    /// Used for the cart discount, which must stay within
    /// `[0, subtotal_with_tax]`.
    pub fn clamp_to(&self, lo: Money, hi: Money) -> Money {
        Money(self.0.clamp(lo.0, hi.0))
    }
}

// =============================================================================
// Tax-Inclusive Split (TaxCalculator)
// =============================================================================

/// Result of splitting a tax-inclusive price.
///
/// Frozen on the line item at add-to-cart time; later mutations multiply
/// these figures and never re-derive them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSplit {
    /// The pre-tax unit price.
    pub price_without_tax: Money,
    /// Whether the item is tax-exempt (zero rate).
    pub is_exempt: bool,
}

/// Splits a tax-inclusive price into its pre-tax component.
///
/// ## Rule
/// - `is_exempt = (rate == 0)`; exempt items keep their full price
/// - otherwise `price_without_tax = price_with_tax / (1 + rate)`, computed
///   with integer math and half-up rounding:
///   `(cents × 10000 + divisor/2) / (10000 + bps)`
///
/// ## Example
/// ```rust
/// use colmado_core::money::{Money, split_inclusive};
/// use colmado_core::types::TaxRate;
///
/// // 18% ITBIS, shelf price RD$118.00
/// let split = split_inclusive(Money::from_cents(11800), TaxRate::from_bps(1800));
/// assert_eq!(split.price_without_tax.cents(), 10000);
///
/// // Exempt product: pre-tax and shelf price are identical
/// let split = split_inclusive(Money::from_cents(5000), TaxRate::zero());
/// assert!(split.is_exempt);
/// assert_eq!(split.price_without_tax.cents(), 5000);
/// ```
pub fn split_inclusive(price_with_tax: Money, rate: TaxRate) -> TaxSplit {
    if rate.is_zero() {
        return TaxSplit {
            price_without_tax: price_with_tax,
            is_exempt: true,
        };
    }

    // i128 to prevent overflow on large amounts
    let divisor = 10_000i128 + rate.bps() as i128;
    let numerator = price_with_tax.cents() as i128 * 10_000 + divisor / 2;
    TaxSplit {
        price_without_tax: Money::from_cents((numerator / divisor) as i64),
        is_exempt: false,
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display. Use frontend formatting for actual UI display
/// to handle localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, self.units().abs(), self.cents_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.units(), 10);
        assert_eq!(money.cents_part(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((b - a).cents(), -500);
    }

    #[test]
    fn test_split_inclusive_itbis() {
        // RD$118.00 at 18% → pre-tax RD$100.00 exactly
        let split = split_inclusive(Money::from_cents(11800), TaxRate::from_bps(1800));
        assert!(!split.is_exempt);
        assert_eq!(split.price_without_tax.cents(), 10000);
    }

    #[test]
    fn test_split_exempt_keeps_full_price() {
        let split = split_inclusive(Money::from_cents(7550), TaxRate::zero());
        assert!(split.is_exempt);
        assert_eq!(split.price_without_tax.cents(), 7550);
    }

    #[test]
    fn test_split_round_trip_within_one_cent() {
        // For non-exempt prices, without × (1 + rate) must reproduce the
        // inclusive price within one rounding unit.
        for (cents, bps) in [(11800, 1800u32), (999, 1800), (101, 1600), (33333, 800)] {
            let with = Money::from_cents(cents);
            let split = split_inclusive(with, TaxRate::from_bps(bps));
            let reconstructed =
                split.price_without_tax.cents() as i128 * (10_000 + bps as i128);
            let target = with.cents() as i128 * 10_000;
            let divisor = 10_000 + bps as i128;
            assert!(
                (reconstructed - target).abs() <= divisor,
                "split of {} @ {}bps drifted: {} vs {}",
                cents,
                bps,
                reconstructed,
                target
            );
        }
    }

    #[test]
    fn test_split_is_frozen_math_not_redivision() {
        // Multiplying the frozen split by a quantity equals splitting
        // line-by-line; repeated edits cannot drift.
        let split = split_inclusive(Money::from_cents(11800), TaxRate::from_bps(1800));
        let qty = 7;
        assert_eq!(
            split.price_without_tax.multiply_quantity(qty).cents(),
            10000 * qty
        );
    }

    #[test]
    fn test_clamp_to() {
        let hi = Money::from_cents(23600);
        assert_eq!(
            Money::from_cents(-5).clamp_to(Money::zero(), hi).cents(),
            0
        );
        assert_eq!(
            Money::from_cents(99999).clamp_to(Money::zero(), hi).cents(),
            23600
        );
        assert_eq!(
            Money::from_cents(3600).clamp_to(Money::zero(), hi).cents(),
            3600
        );
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 200, 300]
            .into_iter()
            .map(Money::from_cents)
            .sum();
        assert_eq!(total.cents(), 600);
    }
}
