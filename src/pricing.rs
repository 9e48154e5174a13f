//! Pricing
//!
//! Order totals are derived from cart items alone, with fixed rules:
//!
//! - VAT is 5% of the subtotal;
//! - delivery is free when the subtotal is strictly above 2000, otherwise a flat
//!   fee of 100 applies;
//! - the grand total is subtotal + VAT + delivery fee.
//!
//! Amounts stay exact [`Decimal`] values. Rounding to the currency's minor unit
//! happens only in [`format_amount`], so repeated derivations never accumulate
//! rounding error.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::Serialize;
use thiserror::Error;

use crate::cart::{CartState, subtotal_of};

/// VAT rate in basis points (5%).
pub const VAT_RATE_BASIS_POINTS: i64 = 500;

/// Subtotals strictly above this amount ship for free.
pub const FREE_DELIVERY_THRESHOLD: i64 = 2000;

/// Delivery fee charged at or below [`FREE_DELIVERY_THRESHOLD`].
pub const FLAT_DELIVERY_FEE: i64 = 100;

/// Errors that can occur while pricing or formatting amounts.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// The amount cannot be represented in minor units.
    #[error("amount {0} cannot be represented in minor units")]
    AmountOutOfRange(Decimal),

    /// A total derived from this amount does not fit in a [`Decimal`].
    #[error("totals derived from {0} overflow")]
    TotalOverflow(Decimal),
}

/// VAT rate as a percentage.
#[must_use]
pub fn vat_rate() -> Percentage {
    Percentage::from(Decimal::new(VAT_RATE_BASIS_POINTS, 4))
}

/// VAT due on `subtotal`.
#[must_use]
pub fn vat_on(subtotal: Decimal) -> Decimal {
    vat_rate() * subtotal
}

/// Delivery fee for `subtotal`.
#[must_use]
pub fn delivery_fee(subtotal: Decimal) -> Decimal {
    if subtotal > Decimal::from(FREE_DELIVERY_THRESHOLD) {
        Decimal::ZERO
    } else {
        Decimal::from(FLAT_DELIVERY_FEE)
    }
}

/// Order totals.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Totals {
    /// Sum of line totals.
    pub subtotal: Decimal,

    /// VAT on the subtotal.
    pub vat: Decimal,

    /// Delivery fee.
    pub delivery_fee: Decimal,

    /// Subtotal + VAT + delivery fee.
    pub grand_total: Decimal,
}

impl Totals {
    /// Derive all totals from a subtotal.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::TotalOverflow`] if the grand total does not fit
    /// in a [`Decimal`].
    pub fn from_subtotal(subtotal: Decimal) -> Result<Self, PricingError> {
        let vat = vat_on(subtotal);
        let delivery_fee = delivery_fee(subtotal);

        let grand_total = subtotal
            .checked_add(vat)
            .and_then(|total| total.checked_add(delivery_fee))
            .ok_or(PricingError::TotalOverflow(subtotal))?;

        Ok(Self {
            subtotal,
            vat,
            delivery_fee,
            grand_total,
        })
    }

    /// Whether delivery is free.
    #[must_use]
    pub fn is_free_delivery(&self) -> bool {
        self.delivery_fee.is_zero()
    }
}

/// Compute totals for a cart.
///
/// The subtotal is folded from the items again rather than read from the cached
/// value on the state.
///
/// # Errors
///
/// Returns [`PricingError::TotalOverflow`] if the subtotal or the grand total
/// does not fit in a [`Decimal`].
pub fn compute_totals(state: &CartState) -> Result<Totals, PricingError> {
    let subtotal =
        subtotal_of(state.items()).ok_or(PricingError::TotalOverflow(state.subtotal()))?;

    Totals::from_subtotal(subtotal)
}

/// Convert an amount to minor units of `currency`, rounding half away from zero.
///
/// # Errors
///
/// Returns [`PricingError::AmountOutOfRange`] if the result does not fit in an
/// `i64`.
pub fn to_minor_units(amount: Decimal, currency: &Currency) -> Result<i64, PricingError> {
    10_i64
        .checked_pow(currency.exponent)
        .map(Decimal::from)
        .and_then(|scale| amount.checked_mul(scale))
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or(PricingError::AmountOutOfRange(amount))
}

/// Currency all storefront amounts are shown in.
#[must_use]
pub fn currency() -> &'static Currency {
    iso::BDT
}

/// Format an amount for display in the storefront [`currency`].
///
/// # Errors
///
/// Returns [`PricingError::AmountOutOfRange`] if the amount cannot be rounded
/// into minor units.
pub fn format_amount(amount: Decimal) -> Result<String, PricingError> {
    let currency = currency();
    let minor = to_minor_units(amount, currency)?;

    Ok(Money::from_minor(minor, currency).to_string())
}

/// VAT rate in percent points, for labels.
#[must_use]
pub fn vat_percent_points() -> Decimal {
    (vat_rate() * Decimal::ONE_HUNDRED).normalize()
}
