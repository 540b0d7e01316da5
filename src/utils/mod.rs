//! Utility functions for formatting and common operations
//!
//! This module provides centralized formatting utilities for consistent
//! display of currency and percentage values throughout the application.

use rust_decimal::Decimal;

/// Currency symbol options for formatting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencySymbol {
    /// Include "$" prefix (US Dollar)
    Usd,
    /// No currency symbol (for table cells, calculations display)
    #[allow(dead_code)]
    None,
}

/// Core formatting function with full control over output.
///
/// Formats a Decimal value using US locale conventions:
/// - Thousands separator: `,` (comma)
/// - Decimal separator: `.` (period)
///
/// # Arguments
/// * `value` - The decimal value to format
/// * `width` - Minimum width for padding (0 for no padding, right-aligned)
/// * `symbol` - Whether to include currency symbol
///
/// # Examples
/// ```
/// use caseledger::utils::{format_currency_with_width, CurrencySymbol};
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(
///     format_currency_with_width(Decimal::from_str("1234.56").unwrap(), 0, CurrencySymbol::Usd),
///     "$1,234.56"
/// );
///
/// assert_eq!(
///     format_currency_with_width(Decimal::from(1234), 15, CurrencySymbol::None),
///     "       1,234.00"
/// );
/// ```
pub fn format_currency_with_width(value: Decimal, width: usize, symbol: CurrencySymbol) -> String {
    let is_negative = value < Decimal::ZERO;
    let abs_value = value.abs();

    // Round to 2 decimal places and format
    let formatted = format!("{:.2}", abs_value);
    let parts: Vec<&str> = formatted.split('.').collect();

    let integer_part = parts[0];
    let decimal_part = parts.get(1).unwrap_or(&"00");

    // Add thousands separators (,) to integer part
    let with_separators: String = integer_part
        .chars()
        .rev()
        .enumerate()
        .flat_map(|(i, c)| {
            if i > 0 && i % 3 == 0 {
                vec![',', c]
            } else {
                vec![c]
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let sign = if is_negative { "-" } else { "" };
    let prefix = match symbol {
        CurrencySymbol::Usd => "$",
        CurrencySymbol::None => "",
    };

    let result = format!("{}{}{}.{}", prefix, sign, with_separators, decimal_part);

    // Apply width padding (right-align)
    if width > 0 && result.len() < width {
        format!("{:>width$}", result, width = width)
    } else {
        result
    }
}

// ============ Convenience functions ============

/// Format as US Dollars with symbol: "$1,234.56"
///
/// # Examples
/// ```
/// use caseledger::utils::format_currency;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(format_currency(Decimal::from_str("1234.56").unwrap()), "$1,234.56");
/// assert_eq!(format_currency(Decimal::from(-500)), "$-500.00");
/// ```
pub fn format_currency(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::Usd)
}

/// Format as US Dollars, right-aligned to specified width.
#[allow(dead_code)]
pub fn format_currency_aligned(value: Decimal, width: usize) -> String {
    format_currency_with_width(value, width, CurrencySymbol::Usd)
}

/// Format number only (no symbol): "1,234.56"
#[allow(dead_code)]
pub fn format_decimal_us(value: Decimal) -> String {
    format_currency_with_width(value, 0, CurrencySymbol::None)
}

/// Format a percentage with one decimal place: "42.5%"
///
/// # Examples
/// ```
/// use caseledger::utils::format_pct;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(format_pct(Decimal::from_str("42.51").unwrap()), "42.5%");
/// ```
pub fn format_pct(value: Decimal) -> String {
    format!("{:.1}%", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_currency_basic() {
        assert_eq!(format_currency(dec!(1234.56)), "$1,234.56");
        assert_eq!(format_currency(dec!(0.99)), "$0.99");
        assert_eq!(format_currency(dec!(1000000)), "$1,000,000.00");
    }

    #[test]
    fn test_format_currency_small_values() {
        assert_eq!(format_currency(dec!(0)), "$0.00");
        assert_eq!(format_currency(dec!(0.01)), "$0.01");
        assert_eq!(format_currency(dec!(12)), "$12.00");
        assert_eq!(format_currency(dec!(999.99)), "$999.99");
    }

    #[test]
    fn test_format_currency_large_values() {
        assert_eq!(format_currency(dec!(12345)), "$12,345.00");
        assert_eq!(format_currency(dec!(1234567)), "$1,234,567.00");
        assert_eq!(format_currency(dec!(12345678.90)), "$12,345,678.90");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(dec!(-1234.56)), "$-1,234.56");
        assert_eq!(format_currency(dec!(-0.01)), "$-0.01");
    }

    #[test]
    fn test_format_decimal_us() {
        assert_eq!(format_decimal_us(dec!(1234.56)), "1,234.56");
        assert_eq!(format_decimal_us(dec!(0)), "0.00");
        assert_eq!(format_decimal_us(dec!(-500)), "-500.00");
    }

    #[test]
    fn test_format_with_width() {
        let result = format_currency_aligned(dec!(100), 15);
        assert_eq!(result.len(), 15);
        assert_eq!(result, "        $100.00");
    }

    #[test]
    fn test_format_with_width_no_padding_needed() {
        let result = format_currency_aligned(dec!(1000000), 5);
        assert_eq!(result, "$1,000,000.00");
    }

    #[test]
    fn test_format_pct() {
        assert_eq!(format_pct(dec!(42.51)), "42.5%");
        assert_eq!(format_pct(dec!(0)), "0.0%");
        assert_eq!(format_pct(dec!(100)), "100.0%");
    }
}
