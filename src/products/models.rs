//! Product Models

use std::fmt::{Display, Formatter, Result as FmtResult};

use jiff::{
    Timestamp,
    civil::{Date, DateTime},
    tz::TimeZone,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Product identifier, assigned by the backend and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    /// Wrap a backend identifier.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw backend identifier.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for ProductId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        Display::fmt(&self.0, f)
    }
}

impl From<i64> for ProductId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// A price valid from a given date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Price
    pub price: Decimal,

    /// First day the price applies
    #[serde(deserialize_with = "deserialize_valid_date")]
    pub valid_date: Date,
}

impl PriceEntry {
    /// Create a price entry.
    #[must_use]
    pub const fn new(price: Decimal, valid_date: Date) -> Self {
        Self { price, valid_date }
    }
}

/// Product as pushed by the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Product {
    /// Backend identifier
    pub id: ProductId,

    /// Product name
    #[serde(rename = "product_name")]
    pub name: String,

    /// Product category
    #[serde(rename = "product_category")]
    pub category: String,

    /// Price history, in feed order
    #[serde(rename = "product_prices", default)]
    pub prices: Vec<PriceEntry>,
}

impl Product {
    /// The entry with the most recent `valid_date`, see [`latest_price`].
    #[must_use]
    pub fn latest_price(&self) -> Option<&PriceEntry> {
        latest_price(&self.prices)
    }
}

/// One complete image of the product collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Snapshot {
    /// Every product, in feed order
    #[serde(rename = "product")]
    pub products: Vec<Product>,
}

impl Snapshot {
    /// Build a snapshot from products.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl From<Vec<Product>> for Snapshot {
    fn from(products: Vec<Product>) -> Self {
        Self::new(products)
    }
}

/// Find the price entry with the maximal `valid_date`.
///
/// When several entries share the maximal date the first one in collection
/// order wins. `Iterator::max_by_key` keeps the last maximum, so it is not
/// used here.
#[must_use]
pub fn latest_price(prices: &[PriceEntry]) -> Option<&PriceEntry> {
    prices.iter().fold(None, |latest, candidate| match latest {
        Some(current) if candidate.valid_date <= current.valid_date => Some(current),
        _ => Some(candidate),
    })
}

/// Parse a `valid_date` value.
///
/// Accepts an RFC 3339 timestamp (reduced to its UTC date), a civil datetime
/// or a plain `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns an error when the value matches none of the accepted forms.
pub fn parse_valid_date(raw: &str) -> Result<Date, jiff::Error> {
    if let Ok(timestamp) = raw.parse::<Timestamp>() {
        return Ok(timestamp.to_zoned(TimeZone::UTC).date());
    }

    if let Ok(datetime) = raw.parse::<DateTime>() {
        return Ok(datetime.date());
    }

    raw.parse::<Date>()
}

fn deserialize_valid_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;

    parse_valid_date(&raw).map_err(D::Error::custom)
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn entry(price: i64, valid_date: Date) -> PriceEntry {
        PriceEntry::new(Decimal::from(price), valid_date)
    }

    #[test]
    fn latest_price_empty_is_none() {
        assert_eq!(latest_price(&[]), None);
    }

    #[test]
    fn latest_price_picks_maximal_date_regardless_of_order() {
        let prices = vec![
            entry(12, date(2024, 2, 1)),
            entry(10, date(2024, 1, 1)),
            entry(11, date(2024, 1, 15)),
        ];

        assert_eq!(latest_price(&prices), Some(&entry(12, date(2024, 2, 1))));
    }

    #[test]
    fn latest_price_tie_keeps_first_encountered() {
        let prices = vec![
            entry(10, date(2024, 1, 1)),
            entry(20, date(2024, 3, 1)),
            entry(30, date(2024, 3, 1)),
        ];

        let expected = prices.get(1);

        assert_eq!(
            latest_price(&prices).map(|p| p.price),
            Some(Decimal::from(20))
        );

        for _ in 0..10 {
            assert!(
                matches!(
                    (latest_price(&prices), expected),
                    (Some(found), Some(first)) if std::ptr::eq(found, first)
                ),
                "tie-break must return the same entry on every call"
            );
        }
    }

    #[test]
    fn product_deserializes_wire_names() -> TestResult {
        let product: Product = serde_json::from_value(json!({
            "id": 1,
            "product_name": "Widget",
            "product_category": "Tools",
            "product_prices": [{ "price": 10, "valid_date": "2024-01-01" }]
        }))?;

        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.name, "Widget");
        assert_eq!(product.category, "Tools");
        assert_eq!(product.prices, vec![entry(10, date(2024, 1, 1))]);

        Ok(())
    }

    #[test]
    fn product_without_prices_defaults_to_empty() -> TestResult {
        let product: Product = serde_json::from_value(json!({
            "id": 7,
            "product_name": "Bare",
            "product_category": "Misc"
        }))?;

        assert!(product.prices.is_empty());
        assert_eq!(product.latest_price(), None);

        Ok(())
    }

    #[test]
    fn decimal_prices_keep_precision() -> TestResult {
        let entry: PriceEntry =
            serde_json::from_value(json!({ "price": 12.99, "valid_date": "2024-02-01" }))?;

        assert_eq!(entry.price, Decimal::new(1299, 2));

        Ok(())
    }

    #[test]
    fn valid_date_accepts_timestamps_and_datetimes() -> TestResult {
        assert_eq!(parse_valid_date("2024-01-01")?, date(2024, 1, 1));
        assert_eq!(parse_valid_date("2024-01-01T10:30:00")?, date(2024, 1, 1));
        assert_eq!(
            parse_valid_date("2024-01-31T23:00:00.000Z")?,
            date(2024, 1, 31)
        );
        assert_eq!(
            parse_valid_date("2024-01-31T23:00:00-05:00")?,
            date(2024, 2, 1)
        );

        Ok(())
    }

    #[test]
    fn valid_date_rejects_garbage() {
        assert!(parse_valid_date("first of january").is_err());
    }

    #[test]
    fn snapshot_deserializes_from_subscription_data() -> TestResult {
        let snapshot: Snapshot = serde_json::from_value(json!({
            "product": [
                { "id": 2, "product_name": "B", "product_category": "X", "product_prices": [] },
                { "id": 1, "product_name": "A", "product_category": "Y", "product_prices": [] }
            ]
        }))?;

        let ids: Vec<i64> = snapshot.products.iter().map(|p| p.id.get()).collect();

        assert_eq!(ids, vec![2, 1], "feed order must be preserved");

        Ok(())
    }
}
