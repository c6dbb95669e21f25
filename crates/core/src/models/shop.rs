//! Shop configuration: currency, quantity limit and shipping tiers.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::media::Image;
use crate::types::{Currency, Price};

/// Per-line quantity limit when the shop does not configure one.
pub const DEFAULT_MAX_QUANTITY: u32 = 10;

/// Destination used when no shipping tier lists any country.
pub const DEFAULT_SHIPPING_COUNTRY: &str = "DE";

/// A flat shipping price for a set of destination countries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingTier {
    #[serde(default)]
    pub id: Option<i32>,
    /// Uppercase country codes, in configured order.
    #[serde(default, deserialize_with = "deserialize_countries")]
    pub countries: Vec<String>,
    #[serde(default)]
    pub price: Decimal,
}

impl ShippingTier {
    #[must_use]
    pub fn covers(&self, country: &str) -> bool {
        self.countries
            .iter()
            .any(|c| c.eq_ignore_ascii_case(country.trim()))
    }
}

/// The `shop` single type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConfig {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub max_quantity: Option<u32>,
    #[serde(default)]
    pub checkout_message: Option<String>,
    #[serde(default)]
    pub shipping_info: Option<String>,
    #[serde(default)]
    pub shipping: Vec<ShippingTier>,
    #[serde(default)]
    pub image: Option<Image>,
}

impl ShopConfig {
    /// Effective per-line quantity limit. An unset or zero limit means 10.
    #[must_use]
    pub fn max_quantity(&self) -> u32 {
        match self.max_quantity {
            Some(0) | None => DEFAULT_MAX_QUANTITY,
            Some(max) => max,
        }
    }

    /// Every country any tier ships to, concatenated in tier order.
    #[must_use]
    pub fn available_shipping_countries(&self) -> Vec<&str> {
        self.shipping
            .iter()
            .flat_map(|tier| tier.countries.iter().map(String::as_str))
            .collect()
    }

    #[must_use]
    pub fn default_shipping_country(&self) -> &str {
        self.available_shipping_countries()
            .first()
            .copied()
            .unwrap_or(DEFAULT_SHIPPING_COUNTRY)
    }

    #[must_use]
    pub fn ships_to(&self, country: &str) -> bool {
        self.shipping.iter().any(|tier| tier.covers(country))
    }

    /// Price of the first tier covering `country`; zero when none does.
    #[must_use]
    pub fn shipping_price(&self, country: &str) -> Decimal {
        self.shipping
            .iter()
            .find(|tier| tier.covers(country))
            .map_or(Decimal::ZERO, |tier| tier.price)
    }

    #[must_use]
    pub const fn price(&self, amount: Decimal) -> Price {
        Price::new(amount, self.currency)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CountryList {
    List(Vec<String>),
    Text(String),
}

fn deserialize_countries<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<CountryList>::deserialize(deserializer)?;
    let codes: Vec<String> = match raw {
        None => Vec::new(),
        Some(CountryList::List(list)) => list,
        Some(CountryList::Text(text)) => text
            .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .map(str::to_owned)
            .collect(),
    };

    Ok(codes
        .into_iter()
        .map(|code| code.trim().to_uppercase())
        .filter(|code| !code.is_empty())
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shop() -> ShopConfig {
        serde_json::from_value(serde_json::json!({
            "currency": "Euro",
            "maxQuantity": 3,
            "shipping": [
                { "id": 1, "countries": ["DE", "AT"], "price": 5 },
                { "id": 2, "countries": "us, ca", "price": "20.00" }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_shipping_price_first_matching_tier() {
        let shop = shop();
        assert_eq!(shop.shipping_price("DE"), Decimal::from(5));
        assert_eq!(shop.shipping_price("AT"), Decimal::from(5));
        assert_eq!(shop.shipping_price("US"), Decimal::from(20));
        assert_eq!(shop.shipping_price("FR"), Decimal::ZERO);
        assert!(!shop.ships_to("FR"));
    }

    #[test]
    fn test_overlapping_tiers_use_first() {
        let shop: ShopConfig = serde_json::from_value(serde_json::json!({
            "shipping": [
                { "countries": ["DE"], "price": 4 },
                { "countries": ["DE", "FR"], "price": 9 }
            ]
        }))
        .unwrap();
        assert_eq!(shop.shipping_price("DE"), Decimal::from(4));
        assert_eq!(shop.shipping_price("FR"), Decimal::from(9));
    }

    #[test]
    fn test_available_countries_concatenate_in_order() {
        let shop = shop();
        assert_eq!(shop.available_shipping_countries(), vec!["DE", "AT", "US", "CA"]);
        assert_eq!(shop.default_shipping_country(), "DE");
    }

    #[test]
    fn test_defaults_without_tiers() {
        let shop = ShopConfig::default();
        assert!(shop.available_shipping_countries().is_empty());
        assert_eq!(shop.default_shipping_country(), DEFAULT_SHIPPING_COUNTRY);
        assert_eq!(shop.max_quantity(), DEFAULT_MAX_QUANTITY);
    }

    #[test]
    fn test_zero_max_quantity_means_default() {
        let shop = ShopConfig {
            max_quantity: Some(0),
            ..ShopConfig::default()
        };
        assert_eq!(shop.max_quantity(), 10);
        assert_eq!(self::shop().max_quantity(), 3);
    }
}
