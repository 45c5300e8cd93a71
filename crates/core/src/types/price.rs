//! Type-safe price representation using decimal arithmetic.
//!
//! Amounts are kept as [`Decimal`] so line subtotals and cart totals never
//! accumulate binary floating point error. Display is always rounded to two
//! decimal places, half away from zero.

use core::fmt;
use core::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places shown for every monetary value.
const DISPLAY_DECIMALS: u32 = 2;

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., quetzales, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply the amount by a quantity, or `None` if the result does not fit
    /// in a [`Decimal`].
    #[must_use]
    pub fn checked_times(&self, quantity: u32) -> Option<Self> {
        let amount = self.amount.checked_mul(Decimal::from(quantity))?;
        Some(Self::new(amount, self.currency_code))
    }

    /// Add two prices in the same currency.
    ///
    /// Returns `None` if the currencies differ or the sum overflows.
    #[must_use]
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency_code != other.currency_code {
            return None;
        }
        let amount = self.amount.checked_add(other.amount)?;
        Some(Self::new(amount, self.currency_code))
    }

    /// The amount rounded to the display precision.
    #[must_use]
    pub fn rounded(&self) -> Decimal {
        self.amount
            .round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Format for display (e.g., "Q24.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.rounded())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes accepted by the register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    GTQ,
    USD,
    MXN,
    EUR,
}

impl CurrencyCode {
    /// Symbol printed in front of amounts.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::GTQ => "Q",
            Self::USD | Self::MXN => "$",
            Self::EUR => "€",
        }
    }

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::GTQ => "GTQ",
            Self::USD => "USD",
            Self::MXN => "MXN",
            Self::EUR => "EUR",
        }
    }
}

/// Error returned when a currency code is not supported.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported currency code: {0}")]
pub struct CurrencyCodeError(pub String);

impl FromStr for CurrencyCode {
    type Err = CurrencyCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GTQ" => Ok(Self::GTQ),
            "USD" => Ok(Self::USD),
            "MXN" => Ok(Self::MXN),
            "EUR" => Ok(Self::EUR),
            _ => Err(CurrencyCodeError(s.to_owned())),
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gtq(s: &str) -> Price {
        Price::new(Decimal::from_str(s).expect("valid decimal"), CurrencyCode::GTQ)
    }

    #[test]
    fn test_display_pads_to_two_decimals() {
        assert_eq!(gtq("24").display(), "Q24.00");
        assert_eq!(gtq("10.5").display(), "Q10.50");
        assert_eq!(Price::zero(CurrencyCode::GTQ).display(), "Q0.00");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        assert_eq!(gtq("1.005").display(), "Q1.01");
        assert_eq!(gtq("1.004").display(), "Q1.00");
        assert_eq!(gtq("19.999").display(), "Q20.00");
    }

    #[test]
    fn test_checked_times_multiplies_amount() {
        assert_eq!(gtq("10.5").checked_times(2), Some(gtq("21.0")));
        assert_eq!(
            gtq("3").checked_times(0).map(|p| p.display()),
            Some("Q0.00".to_string())
        );
        assert_eq!(gtq("100000000000000000000").checked_times(4_000_000_000), None);
    }

    #[test]
    fn test_checked_add_requires_same_currency() {
        assert_eq!(gtq("21").checked_add(&gtq("3")), Some(gtq("24")));
        assert_eq!(
            gtq("1").checked_add(&Price::new(Decimal::ONE, CurrencyCode::USD)),
            None
        );
        assert_eq!(
            Price::new(Decimal::MAX, CurrencyCode::GTQ).checked_add(&gtq("1")),
            None
        );
    }

    #[test]
    fn test_currency_symbols() {
        assert_eq!(CurrencyCode::GTQ.symbol(), "Q");
        assert_eq!(CurrencyCode::USD.symbol(), "$");
        assert_eq!(
            Price::new(Decimal::new(199, 2), CurrencyCode::EUR).display(),
            "€1.99"
        );
    }

    #[test]
    fn test_currency_code_parse() {
        assert_eq!("gtq".parse::<CurrencyCode>(), Ok(CurrencyCode::GTQ));
        assert_eq!(" USD ".parse::<CurrencyCode>(), Ok(CurrencyCode::USD));
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }
}
