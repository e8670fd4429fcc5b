//! Published rates the forms are pre-filled with (2025 figures).

/// Average US 30-year fixed mortgage rate, percent.
pub const US_MORTGAGE_30YR: f64 = 6.7;

/// Average US credit card APR, percent.
pub const US_CC_AVG_APR: f64 = 21.5;

pub const DEFAULT_INFLATION: f64 = 2.5;
pub const DEFAULT_INVESTMENT_RETURN: f64 = 7.0;
pub const FIRE_SAFE_WITHDRAWAL_RATE: f64 = 4.0;
pub const SIP_NIFTY50_RETURN: f64 = 12.0;

/// 401(k) employee deferral limit.
pub const US_401K_EMPLOYEE_LIMIT: f64 = 23_500.0;

/// Flat APR used to approximate a new personal loan payment.
pub const PERSONAL_LOAN_ROUGH_APR: f64 = 20.0;

/// Share of gross monthly income available for housing under the
/// front-end ratio.
pub const HOUSING_FRONT_END_RATIO: f64 = 0.28;

/// Average days per month.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Federal undergraduate student loan rate for 2025-26, percent.
pub const STUDENT_LOAN_UNDERGRAD_RATE: f64 = 6.53;
