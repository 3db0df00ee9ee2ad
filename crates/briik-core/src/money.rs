//! # Money and Rates
//!
//! Euro amounts as integer cents, VAT/RE rates as basis points.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  "6.40" ──parse_decimal──► Money(640)                                   │
//! │                                                                         │
//! │  640 × 3 = 1920            exact, unlike 6.40 × 3 = 19.200000000000003  │
//! │  1920 + 750 ≥ 5000 ?       threshold check never off by a float ulp     │
//! │                                                                         │
//! │  base.percentage(2100 bps) = base × 21 / 100, half up at the cent       │
//! │                                                                         │
//! │  Money(1920) ──to_decimal_string──► "19.20"     (XML, 2 digits)         │
//! │              ──Display───────────► "19.20€"    (documents, CLI)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use briik_core::money::{Money, TaxRate};
//!
//! let unit = Money::parse_decimal("6.40").unwrap();
//! let line = unit.multiply_quantity(3);
//! assert_eq!(line.to_decimal_string(), "19.20");
//!
//! let vat = Money::from_cents(10000).percentage(TaxRate::from_percentage(21.0));
//! assert_eq!(vat.cents(), 2100);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in euro cents.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  LineType.default_pvd_unit ──► OrderLine.pvd_unit ──► line subtotal     │
/// │                                                                         │
/// │  Σ line subtotals ──► order subtotal ──┬──► shipping waiver check      │
/// │                                        └──► tax base ──► VAT / RE      │
/// │                                                                         │
/// │  Rules.shipping_cost ──► Order.shipping_cost (snapshot at creation)     │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

/// Largest amount, in cents, accepted from text (100 000 000 000.00€).
///
/// Arithmetic saturates at the `i64` bounds, so a sum of many maximal
/// amounts stays ordered instead of wrapping.
pub const MAX_PARSED_CENTS: i64 = 10_000_000_000_000;

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a decimal euro amount, rounding to the
    /// nearest cent (half away from zero).
    ///
    /// Only used at the boundary where decimal text enters the system.
    /// Values beyond the `i64` range saturate (`as` on f64 never wraps).
    pub fn from_decimal(euros: f64) -> Self {
        Money((euros * 100.0).round() as i64)
    }

    /// Parses decimal text such as `"7.50"` or `"19.2"`.
    ///
    /// ## Returns
    /// * `Some(Money)` - a finite number within ±[`MAX_PARSED_CENTS`]
    /// * `None` - empty, malformed or out-of-range text (callers pick their
    ///   own fallback)
    ///
    /// ## Example
    /// ```rust
    /// use briik_core::money::Money;
    ///
    /// assert_eq!(Money::parse_decimal("7.50").unwrap().cents(), 750);
    /// assert_eq!(Money::parse_decimal(" 19.2 ").unwrap().cents(), 1920);
    /// assert!(Money::parse_decimal("abc").is_none());
    /// assert!(Money::parse_decimal("").is_none());
    /// assert!(Money::parse_decimal("1e17").is_none());
    /// ```
    pub fn parse_decimal(text: &str) -> Option<Self> {
        let value: f64 = text.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        let money = Money::from_decimal(value);
        (money.0.abs() <= MAX_PARSED_CENTS).then_some(money)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the whole-euro portion (truncated toward zero).
    #[inline]
    pub const fn euros(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the cent portion, always 0-99 regardless of sign.
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Multiplies money by a quantity, saturating at the `i64` bounds.
    ///
    /// ## Example
    /// ```rust
    /// use briik_core::money::Money;
    ///
    /// let unit_price = Money::from_cents(640); // 6.40€
    /// assert_eq!(unit_price.multiply_quantity(3).cents(), 1920);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }

    /// Returns `rate` percent of this amount, rounded half-up at the cent.
    ///
    /// ## Implementation
    /// Integer math on basis points: `(amount * bps + 5000) / 10000`.
    /// The +5000 provides rounding (5000/10000 = 0.5).
    ///
    /// ## Example
    /// ```rust
    /// use briik_core::money::{Money, TaxRate};
    ///
    /// let base = Money::from_cents(10000);              // 100.00€
    /// let re = base.percentage(TaxRate::from_bps(520)); // 5.2%
    /// assert_eq!(re.cents(), 520);
    /// ```
    pub fn percentage(&self, rate: TaxRate) -> Money {
        // i128 so large bases cannot overflow
        let amount = self.0 as i128 * rate.bps() as i128;
        let rounded = if amount >= 0 {
            (amount + 5000) / 10000
        } else {
            (amount - 5000) / 10000
        };
        let clamped = rounded.clamp(i64::MIN as i128, i64::MAX as i128);
        Money::from_cents(clamped as i64)
    }

    /// Renders with exactly two fraction digits and no currency symbol.
    ///
    /// This is the wire format used by the XML codec.
    pub fn to_decimal_string(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        format!("{}{}.{:02}", sign, self.euros().abs(), self.cents_part())
    }
}

/// Display shows the amount the way documents print it: `52.50€`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}€", self.to_decimal_string())
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
        Money(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0.saturating_sub(other.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2100 bps = 21% (Spanish general VAT)
/// 520 bps = 5.2% (recargo de equivalencia on general VAT)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a rate from a percentage. Negative input clamps to zero.
    pub fn from_percentage(pct: f64) -> Self {
        if !pct.is_finite() || pct <= 0.0 {
            return TaxRate(0);
        }
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Parses percentage text such as `"21"` or `"5.20"`.
    pub fn parse_percentage(text: &str) -> Option<Self> {
        let value: f64 = text.trim().parse().ok()?;
        if !value.is_finite() {
            return None;
        }
        Some(TaxRate::from_percentage(value))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Renders the percentage with exactly two fraction digits (`5.20`).
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

/// Display trims insignificant zeros: `21%`, `5.2%`, `5.25%`.
impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.0 / 100;
        let frac = self.0 % 100;
        if frac == 0 {
            write!(f, "{}%", whole)
        } else if frac % 10 == 0 {
            write!(f, "{}.{}%", whole, frac / 10)
        } else {
            write!(f, "{}.{:02}%", whole, frac)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
