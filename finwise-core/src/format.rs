//! Display formatting for every calculator's rendered output.
//!
//! All functions are total: non-finite input renders [`PLACEHOLDER`] and
//! nothing here panics. Rounding goes through [`round_half_up`], so a value
//! exactly halfway between two displayable numbers is rounded away from zero.

use crate::calculations::common::round_half_up;

/// Rendered in place of a number that cannot be displayed.
pub const PLACEHOLDER: &str = "—";

const NBSP: char = '\u{a0}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Grouping {
    /// 1,234,567
    Thousands,
    /// 12,34,567 (lakh / crore)
    Indian,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SymbolPlacement {
    Before,
    /// Separated by a no-break space, as in `1.234,56 €`.
    After,
}

/// Number conventions of one locale together with how it writes one currency.
#[derive(Debug, Clone, Copy)]
struct CurrencyStyle {
    locale: &'static str,
    symbol: &'static str,
    group: &'static str,
    decimal: &'static str,
    grouping: Grouping,
    placement: SymbolPlacement,
}

const US_STYLE: CurrencyStyle = CurrencyStyle {
    locale: "en-US",
    symbol: "$",
    group: ",",
    decimal: ".",
    grouping: Grouping::Thousands,
    placement: SymbolPlacement::Before,
};

impl CurrencyStyle {
    fn for_code(code: &str) -> Self {
        match code {
            "" | "USD" => US_STYLE,
            "GBP" => Self {
                locale: "en-GB",
                symbol: "£",
                ..US_STYLE
            },
            "EUR" => Self {
                locale: "de-DE",
                symbol: "€",
                group: ".",
                decimal: ",",
                grouping: Grouping::Thousands,
                placement: SymbolPlacement::After,
            },
            "INR" => Self {
                locale: "en-IN",
                symbol: "₹",
                grouping: Grouping::Indian,
                ..US_STYLE
            },
            "JPY" => Self {
                locale: "ja-JP",
                symbol: "￥",
                ..US_STYLE
            },
            "SGD" => Self {
                locale: "en-SG",
                symbol: "$",
                ..US_STYLE
            },
            "CNY" => Self {
                locale: "zh-CN",
                symbol: "¥",
                ..US_STYLE
            },
            _ => US_STYLE,
        }
    }
}

/// Locale tag used to render amounts in `code`. Unknown codes use `en-US`.
pub fn locale_for(code: &str) -> &'static str {
    CurrencyStyle::for_code(&code.trim().to_ascii_uppercase()).locale
}

/// Short symbol used by [`compact`]. Unknown codes have none.
pub fn symbol_for(code: &str) -> Option<&'static str> {
    match code.trim().to_ascii_uppercase().as_str() {
        "USD" => Some("$"),
        "GBP" => Some("£"),
        "EUR" => Some("€"),
        "INR" => Some("₹"),
        "JPY" => Some("¥"),
        "SGD" => Some("S$"),
        "CNY" => Some("¥"),
        _ => None,
    }
}

/// Splits a finite value into sign, integer digits and fraction digits,
/// rounded to `decimals` places.
fn fixed_parts(
    value: f64,
    decimals: u32,
) -> (bool, String, String) {
    let decimals = decimals.min(20);
    let text = match round_half_up(value, decimals) {
        Some(d) => {
            let negative = d.is_sign_negative() && !d.is_zero();
            (negative, format!("{:.*}", decimals as usize, d.abs()))
        }
        // Beyond Decimal's range; plain float formatting is good enough there.
        None => (value < 0.0, format!("{:.*}", decimals as usize, value.abs())),
    };
    let (negative, digits) = text;
    match digits.split_once('.') {
        Some((int, frac)) => (negative, int.to_string(), frac.to_string()),
        None => (negative, digits, String::new()),
    }
}

fn group_digits(
    digits: &str,
    separator: &str,
    grouping: Grouping,
) -> String {
    let len = digits.len();
    if len <= 3 {
        return digits.to_string();
    }
    let mut groups: Vec<&str> = Vec::new();
    let (head, last) = digits.split_at(len - 3);
    let step = match grouping {
        Grouping::Thousands => 3,
        Grouping::Indian => 2,
    };
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(step);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    groups.push(last);
    groups.join(separator)
}

fn join_number(
    int: &str,
    frac: &str,
    style: &CurrencyStyle,
) -> String {
    let grouped = group_digits(int, style.group, style.grouping);
    if frac.is_empty() {
        grouped
    } else {
        format!("{grouped}{}{frac}", style.decimal)
    }
}

/// Renders `value` as a currency amount in the locale associated with
/// `code`.
///
/// ```
/// use finwise_core::format::currency;
///
/// assert_eq!(currency(1234.5, "USD", 2), "$1,234.50");
/// assert_eq!(currency(1234567.0, "INR", 0), "₹12,34,567");
/// assert_eq!(currency(f64::NAN, "USD", 2), "—");
/// ```
pub fn currency(
    value: f64,
    code: &str,
    decimals: u32,
) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let code = code.trim().to_ascii_uppercase();
    let style = CurrencyStyle::for_code(&code);
    let known = style.locale != "en-US" || code.is_empty() || code == "USD";
    let (negative, int, frac) = fixed_parts(value, decimals);
    let number = join_number(&int, &frac, &style);
    let sign = if negative { "-" } else { "" };

    if !known {
        return format!("{sign}{code}{NBSP}{number}");
    }
    match style.placement {
        SymbolPlacement::Before => format!("{sign}{}{number}", style.symbol),
        SymbolPlacement::After => format!("{sign}{number}{NBSP}{}", style.symbol),
    }
}

/// Grouped digits with a fixed number of decimals (`1,234.50`).
pub fn number(
    value: f64,
    decimals: u32,
) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let (negative, int, frac) = fixed_parts(value, decimals);
    let number = join_number(&int, &frac, &US_STYLE);
    if negative { format!("-{number}") } else { number }
}

/// Fixed-point numeral followed by a percent sign. No grouping.
pub fn percent(
    value: f64,
    decimals: u32,
) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let (negative, int, frac) = fixed_parts(value, decimals);
    let sign = if negative { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{int}%")
    } else {
        format!("{sign}{int}.{frac}%")
    }
}

/// `(unit, decimals, suffix)` in ascending order.
const COMPACT_TIERS: [(f64, u32, &str); 4] = [
    (1.0, 0, ""),
    (1e3, 1, "K"),
    (1e6, 2, "M"),
    (1e9, 2, "B"),
];

/// Abbreviates large magnitudes with a `K`, `M` or `B` suffix.
///
/// ```
/// use finwise_core::format::compact;
///
/// assert_eq!(compact(1_500_000.0, "USD"), "$1.50M");
/// assert_eq!(compact(999.0, ""), "999");
/// ```
pub fn compact(
    value: f64,
    code: &str,
) -> String {
    if !value.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let magnitude = value.abs();
    let mut tier = COMPACT_TIERS
        .iter()
        .rposition(|&(unit, _, _)| magnitude >= unit)
        .unwrap_or(0);
    // Rounding can carry into the next tier (999.96K is 1.00M).
    let (int, frac, suffix) = loop {
        let (unit, decimals, suffix) = COMPACT_TIERS[tier];
        let (_, int, frac) = fixed_parts(magnitude / unit, decimals);
        if int.len() > 3 && tier + 1 < COMPACT_TIERS.len() {
            tier += 1;
            continue;
        }
        break (int, frac, suffix);
    };
    let digits = if frac.is_empty() {
        int
    } else {
        format!("{int}.{frac}")
    };
    let sign = if value < 0.0 && digits.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    let symbol = symbol_for(code).unwrap_or("");
    format!("{sign}{symbol}{digits}{suffix}")
}

/// Converts a month count into a phrase such as `2 years` or `1 yr 2 mo`.
///
/// Fractional months are truncated and negative counts clamp to zero.
pub fn months(total_months: f64) -> String {
    if !total_months.is_finite() {
        return PLACEHOLDER.to_string();
    }
    let total = total_months.trunc().max(0.0) as i64;
    let (years, rest) = (total / 12, total % 12);
    match (years, rest) {
        (0, 1) => "1 month".to_string(),
        (0, m) => format!("{m} months"),
        (1, 0) => "1 year".to_string(),
        (y, 0) => format!("{y} years"),
        (y, m) => format!("{y} yr {m} mo"),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const NON_FINITE: [f64; 3] = [f64::NAN, f64::INFINITY, f64::NEG_INFINITY];

    // =========================================================================
    // placeholder handling
    // =========================================================================

    #[test]
    fn every_formatter_renders_placeholder_for_non_finite() {
        for value in NON_FINITE {
            assert_eq!(currency(value, "USD", 2), PLACEHOLDER);
            assert_eq!(currency(value, "EUR", 0), PLACEHOLDER);
            assert_eq!(number(value, 2), PLACEHOLDER);
            assert_eq!(percent(value, 1), PLACEHOLDER);
            assert_eq!(compact(value, "USD"), PLACEHOLDER);
            assert_eq!(months(value), PLACEHOLDER);
        }
    }

    // =========================================================================
    // currency tests
    // =========================================================================

    #[test]
    fn currency_us_dollars() {
        assert_eq!(currency(1234567.891, "USD", 2), "$1,234,567.89");
    }

    #[test]
    fn currency_code_is_case_insensitive() {
        assert_eq!(currency(10.0, "usd", 2), "$10.00");
    }

    #[test]
    fn currency_negative_amount_has_leading_sign() {
        assert_eq!(currency(-1500.0, "USD", 0), "-$1,500");
    }

    #[test]
    fn currency_negative_zero_drops_sign() {
        assert_eq!(currency(-0.001, "USD", 2), "$0.00");
    }

    #[test]
    fn currency_pounds() {
        assert_eq!(currency(50270.0, "GBP", 2), "£50,270.00");
    }

    #[test]
    fn currency_euro_uses_german_separators() {
        assert_eq!(currency(1234567.891, "EUR", 2), "1.234.567,89\u{a0}€");
    }

    #[test]
    fn currency_rupees_use_lakh_grouping() {
        assert_eq!(currency(1234567.891, "INR", 2), "₹12,34,567.89");
        assert_eq!(currency(123456789.0, "INR", 0), "₹12,34,56,789");
        assert_eq!(currency(999.0, "INR", 0), "₹999");
    }

    #[test]
    fn currency_yen_and_yuan() {
        assert_eq!(currency(1234.0, "JPY", 0), "￥1,234");
        assert_eq!(currency(1234.0, "CNY", 0), "¥1,234");
    }

    #[test]
    fn currency_unknown_code_uses_code_as_symbol() {
        assert_eq!(currency(1234.5, "XYZ", 2), "XYZ\u{a0}1,234.50");
        assert_eq!(locale_for("XYZ"), "en-US");
    }

    #[test]
    fn currency_rounds_half_away_from_zero() {
        assert_eq!(currency(0.125, "USD", 2), "$0.13");
        assert_eq!(currency(2.5, "USD", 0), "$3");
    }

    // =========================================================================
    // number / percent tests
    // =========================================================================

    #[test]
    fn number_groups_thousands() {
        assert_eq!(number(1234567.0, 0), "1,234,567");
        assert_eq!(number(1234.5, 2), "1,234.50");
        assert_eq!(number(-98765.4321, 1), "-98,765.4");
    }

    #[test]
    fn number_small_values_are_not_grouped() {
        assert_eq!(number(999.0, 0), "999");
        assert_eq!(number(0.0, 2), "0.00");
    }

    #[test]
    fn percent_is_not_localized() {
        assert_eq!(percent(6.7, 2), "6.70%");
        assert_eq!(percent(12345.678, 1), "12345.7%");
        assert_eq!(percent(-3.0, 0), "-3%");
    }

    // =========================================================================
    // compact tests
    // =========================================================================

    #[test]
    fn compact_boundaries() {
        assert_eq!(compact(999.0, ""), "999");
        assert_eq!(compact(1_000.0, ""), "1.0K");
        assert_eq!(compact(1_000_000.0, ""), "1.00M");
        assert_eq!(compact(1_000_000_000.0, ""), "1.00B");
    }

    #[test]
    fn compact_rounding_carries_into_next_suffix() {
        assert_eq!(compact(999.6, ""), "1.0K");
        assert_eq!(compact(999_999.0, ""), "1.00M");
        assert_eq!(compact(999_999_999.9, "USD"), "$1.00B");
        assert_eq!(compact(-999_960.0, "USD"), "-$1.00M");
        assert_eq!(compact(999.4, ""), "999");
    }

    #[test]
    fn compact_prefixes_known_symbol() {
        assert_eq!(compact(2_500.0, "USD"), "$2.5K");
        assert_eq!(compact(3_400_000.0, "SGD"), "S$3.40M");
        assert_eq!(compact(12.4, "EUR"), "€12");
    }

    #[test]
    fn compact_unknown_code_has_no_prefix() {
        assert_eq!(compact(2_500.0, "XYZ"), "2.5K");
    }

    #[test]
    fn compact_negative_values_keep_sign() {
        assert_eq!(compact(-2_500.0, "USD"), "-$2.5K");
    }

    // =========================================================================
    // months tests
    // =========================================================================

    #[test]
    fn months_phrases() {
        assert_eq!(months(0.0), "0 months");
        assert_eq!(months(1.0), "1 month");
        assert_eq!(months(11.0), "11 months");
        assert_eq!(months(12.0), "1 year");
        assert_eq!(months(24.0), "2 years");
        assert_eq!(months(14.0), "1 yr 2 mo");
        assert_eq!(months(45.9), "3 yr 9 mo");
    }

    #[test]
    fn months_negative_clamps_to_zero() {
        assert_eq!(months(-5.0), "0 months");
    }
}
