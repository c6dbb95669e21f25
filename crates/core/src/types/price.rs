//! Prices and shop currencies.
//!
//! Amounts are kept as [`Decimal`] in the currency's standard unit (euros, not
//! cents). The CMS sends prices as JSON numbers; they are accepted as numbers or
//! strings and always written back as strings.

use core::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Currencies a shop can be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Currency {
    #[default]
    Euro,
    Dollar,
    Pound,
    Yen,
}

impl Currency {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Euro => "€",
            Self::Dollar => "$",
            Self::Pound => "£",
            Self::Yen => "¥",
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Euro => "EUR",
            Self::Dollar => "USD",
            Self::Pound => "GBP",
            Self::Yen => "JPY",
        }
    }

    /// Number of minor-unit digits shown when formatting.
    #[must_use]
    pub const fn decimal_places(self) -> u32 {
        match self {
            Self::Yen => 0,
            Self::Euro | Self::Dollar | Self::Pound => 2,
        }
    }
}

/// An amount paired with the currency it is displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub amount: Decimal,
    pub currency: Currency,
}

impl Price {
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self::new(Decimal::ZERO, currency)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let places = self.currency.decimal_places();
        let rounded = self
            .amount
            .round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
        let width = usize::try_from(places).unwrap_or(2);
        write!(f, "{}{:.*}", self.currency.symbol(), width, rounded)
    }
}
