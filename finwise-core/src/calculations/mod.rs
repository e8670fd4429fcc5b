//! Client-side calculation helpers.
//!
//! Only closed-form approximations live here; the authoritative numbers
//! come from the calculation service.

pub mod common;

pub use common::{
    RuleOf, finite, future_value, future_value_due, loan_payment, monthly_payment, months_in,
    months_to_payoff, round_half_up, rule_of,
};
