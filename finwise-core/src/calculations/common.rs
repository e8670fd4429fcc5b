//! Closed-form formulas shared by the preview estimators.
//!
//! These mirror the formulas the calculation service uses for its exact
//! results, but only ever produce a single scalar. Functions that can be
//! undefined for their inputs return `Option<f64>`; `None` is the
//! "unavailable" sentinel the display layer renders as a placeholder.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Multipliers for the Rule of 72 family of approximations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOf {
    /// Doubling.
    Seventy2,
    /// Tripling.
    OneFourteen,
    /// Quadrupling.
    OneFortyFour,
}

impl RuleOf {
    pub fn numerator(self) -> f64 {
        match self {
            Self::Seventy2 => 72.0,
            Self::OneFourteen => 114.0,
            Self::OneFortyFour => 144.0,
        }
    }
}

/// Rounds `value` to `dp` decimal places using half-up rounding.
///
/// Values at exactly the midpoint are rounded away from zero, the same
/// convention financial displays use. Returns `None` when `value` is not
/// finite or is outside the range a [`Decimal`] can hold.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use finwise_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(123.455, 2), Some(dec!(123.46)));
/// assert_eq!(round_half_up(-123.455, 2), Some(dec!(-123.46)));
/// assert_eq!(round_half_up(f64::NAN, 2), None);
/// ```
pub fn round_half_up(
    value: f64,
    dp: u32,
) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    // The shortest round-trip text keeps 123.455 as 123.455 rather than the
    // binary neighbour just below it.
    value
        .to_string()
        .parse::<Decimal>()
        .ok()
        .or_else(|| Decimal::from_f64(value))
        .map(|d| d.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero))
}

/// Level monthly payment that amortizes `principal` over `term_months`.
///
/// A non-positive rate is treated as an interest-free loan
/// (`principal / term_months`). A non-positive term always yields 0.
///
/// ```
/// use finwise_core::calculations::common::monthly_payment;
///
/// assert_eq!(monthly_payment(12_000.0, 0.0, 12), 1_000.0);
/// assert_eq!(monthly_payment(12_000.0, 5.0, 0), 0.0);
/// ```
pub fn monthly_payment(
    principal: f64,
    annual_rate_pct: f64,
    term_months: i64,
) -> f64 {
    if term_months <= 0 {
        return 0.0;
    }
    let n = term_months as f64;
    if annual_rate_pct <= 0.0 {
        return principal / n;
    }
    let r = annual_rate_pct / 1200.0;
    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

/// [`monthly_payment`] as a preview value: `None` when there is no term to
/// amortize over or the payment is not finite.
///
/// ```
/// use finwise_core::calculations::common::loan_payment;
///
/// assert_eq!(loan_payment(12_000.0, 0.0, 12), Some(1_000.0));
/// assert_eq!(loan_payment(12_000.0, 5.0, 0), None);
/// ```
pub fn loan_payment(
    principal: f64,
    annual_rate_pct: f64,
    term_months: i64,
) -> Option<f64> {
    if term_months <= 0 {
        return None;
    }
    finite(monthly_payment(principal, annual_rate_pct, term_months))
}

/// Whole months in `years`, saturating instead of overflowing.
pub fn months_in(years: i64) -> i64 {
    years.saturating_mul(12)
}

/// Future value of a lump sum plus a contribution paid at the end of each
/// period (ordinary annuity).
pub fn future_value(
    principal: f64,
    contribution: f64,
    rate_per_period: f64,
    periods: i64,
) -> f64 {
    let n = periods.max(0) as f64;
    if rate_per_period <= 0.0 {
        return principal + contribution * n;
    }
    let growth = (1.0 + rate_per_period).powf(n);
    principal * growth + contribution * (growth - 1.0) / rate_per_period
}

/// Future value of a lump sum plus a contribution paid at the start of each
/// period (annuity due).
pub fn future_value_due(
    principal: f64,
    contribution: f64,
    rate_per_period: f64,
    periods: i64,
) -> f64 {
    let n = periods.max(0) as f64;
    if rate_per_period <= 0.0 {
        return principal + contribution * n;
    }
    let growth = (1.0 + rate_per_period).powf(n);
    principal * growth
        + contribution * (growth - 1.0) / rate_per_period * (1.0 + rate_per_period)
}

/// Rule-of-N approximation: years to multiply at `value` percent, or the
/// percent needed to multiply in `value` years. The division is the same
/// either way.
pub fn rule_of(
    rule: RuleOf,
    value: f64,
) -> Option<f64> {
    if value <= 0.0 || !value.is_finite() {
        return None;
    }
    Some(rule.numerator() / value)
}

/// Months needed to clear `balance` with a fixed monthly `payment` at
/// `apr_pct`, as a fractional month count.
///
/// `None` when there is nothing to repay or the payment never covers the
/// monthly interest.
pub fn months_to_payoff(
    balance: f64,
    apr_pct: f64,
    payment: f64,
) -> Option<f64> {
    if balance <= 0.0 || payment <= 0.0 {
        return None;
    }
    let r = apr_pct / 1200.0;
    if r <= 0.0 {
        return Some(balance / payment);
    }
    let interest = balance * r;
    if payment <= interest {
        return None;
    }
    let months = -(1.0 - interest / payment).ln() / (1.0 + r).ln();
    months.is_finite().then_some(months)
}

/// Returns `Some(value)` only when it is finite.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}
