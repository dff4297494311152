//! Listing validation and normalisation.

use crate::adapters::coinmarketcap::QUOTE_CURRENCY;
use crate::domain::model::{Listing, QuoteRow, TransformResult};
use chrono::{DateTime, NaiveDateTime};
use rust_decimal::Decimal;

/// Fractional digits kept for every monetary column.
pub const DECIMAL_SCALE: u32 = 10;
pub const MAX_NAME_LEN: usize = 255;
pub const MAX_SYMBOL_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Name, symbol, non-zero price or timestamp missing.
    Incomplete,
    InvalidTimestamp(String),
    TooLong { field: &'static str, max: usize },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Incomplete => write!(f, "incomplete record"),
            SkipReason::InvalidTimestamp(raw) => write!(f, "invalid last_updated '{}'", raw),
            SkipReason::TooLong { field, max } => write!(f, "{} longer than {} chars", field, max),
        }
    }
}

pub fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::try_from(value)
        .ok()
        .map(|d| d.round_dp(DECIMAL_SCALE))
}

/// Parses the API's ISO-8601 timestamp into naive UTC.
pub fn parse_last_updated(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

pub fn to_quote_row(listing: &Listing) -> Result<QuoteRow, SkipReason> {
    let quote = listing.quote.get(QUOTE_CURRENCY);

    let name = non_empty(&listing.name).ok_or(SkipReason::Incomplete)?;
    let symbol = non_empty(&listing.symbol).ok_or(SkipReason::Incomplete)?;
    let price = quote
        .and_then(|q| q.price)
        .filter(|p| *p != 0.0)
        .and_then(to_decimal)
        .ok_or(SkipReason::Incomplete)?;
    let raw_updated = quote
        .and_then(|q| non_empty(&q.last_updated))
        .ok_or(SkipReason::Incomplete)?;

    if name.chars().count() > MAX_NAME_LEN {
        return Err(SkipReason::TooLong {
            field: "name",
            max: MAX_NAME_LEN,
        });
    }
    if symbol.chars().count() > MAX_SYMBOL_LEN {
        return Err(SkipReason::TooLong {
            field: "symbol",
            max: MAX_SYMBOL_LEN,
        });
    }

    let last_updated = parse_last_updated(raw_updated)
        .ok_or_else(|| SkipReason::InvalidTimestamp(raw_updated.to_string()))?;

    Ok(QuoteRow {
        name: name.to_string(),
        symbol: symbol.to_string(),
        rank: listing.cmc_rank.and_then(|r| i32::try_from(r).ok()),
        price_usd: price,
        volume_24h_usd: quote.and_then(|q| q.volume_24h).and_then(to_decimal),
        market_cap_usd: quote.and_then(|q| q.market_cap).and_then(to_decimal),
        last_updated,
    })
}

pub fn transform_listings(listings: Vec<Listing>) -> TransformResult {
    tracing::info!("Processing cryptocurrency data for database insertion");

    let mut result = TransformResult::default();
    for listing in &listings {
        match to_quote_row(listing) {
            Ok(row) => result.rows.push(row),
            Err(reason) => {
                let label = listing.name.as_deref().unwrap_or("N/A");
                match reason {
                    SkipReason::Incomplete => {
                        tracing::warn!("Skipping incomplete record: {}", label)
                    }
                    other => tracing::error!("Error processing item: {} - {}", label, other),
                }
                result.skipped += 1;
            }
        }
    }

    tracing::debug!(
        "Transformed {} listings into {} rows ({} skipped)",
        listings.len(),
        result.rows.len(),
        result.skipped
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Quote;
    use chrono::NaiveDate;
    use std::collections::HashMap;
    use std::str::FromStr;

    fn listing(name: &str, symbol: &str, price: Option<f64>, updated: Option<&str>) -> Listing {
        let mut quote = HashMap::new();
        quote.insert(
            "USD".to_string(),
            Quote {
                price,
                volume_24h: Some(1_500_000.25),
                market_cap: Some(1_300_000_000_000.0),
                last_updated: updated.map(str::to_string),
            },
        );
        Listing {
            name: Some(name.to_string()),
            symbol: Some(symbol.to_string()),
            cmc_rank: Some(1),
            quote,
        }
    }

    #[test]
    fn test_complete_listing_becomes_row() {
        let row = to_quote_row(&listing(
            "Bitcoin",
            "BTC",
            Some(65000.5),
            Some("2024-05-01T12:34:56.000Z"),
        ))
        .unwrap();

        assert_eq!(row.name, "Bitcoin");
        assert_eq!(row.symbol, "BTC");
        assert_eq!(row.rank, Some(1));
        assert_eq!(row.price_usd, Decimal::from_str("65000.5").unwrap());
        assert_eq!(row.volume_24h_usd, Some(Decimal::from_str("1500000.25").unwrap()));
        // Market caps exceed ten integer digits; the column must hold them.
        assert_eq!(
            row.market_cap_usd,
            Some(Decimal::from_str("1300000000000").unwrap())
        );
        assert_eq!(
            row.last_updated,
            NaiveDate::from_ymd_opt(2024, 5, 1)
                .unwrap()
                .and_hms_opt(12, 34, 56)
                .unwrap()
        );
    }

    #[test]
    fn test_missing_required_fields_are_incomplete() {
        let no_price = listing("Bitcoin", "BTC", None, Some("2024-05-01T00:00:00Z"));
        let zero_price = listing("Bitcoin", "BTC", Some(0.0), Some("2024-05-01T00:00:00Z"));
        let no_timestamp = listing("Bitcoin", "BTC", Some(1.0), None);
        let empty_symbol = listing("Bitcoin", "", Some(1.0), Some("2024-05-01T00:00:00Z"));
        let no_usd_quote = Listing {
            name: Some("Bitcoin".to_string()),
            symbol: Some("BTC".to_string()),
            ..Listing::default()
        };

        for l in [no_price, zero_price, no_timestamp, empty_symbol, no_usd_quote] {
            assert_eq!(to_quote_row(&l), Err(SkipReason::Incomplete));
        }
    }

    #[test]
    fn test_name_and_symbol_are_trimmed() {
        let padded = listing(" Bitcoin ", "BTC\n", Some(1.0), Some("2024-05-01T00:00:00Z"));
        let row = to_quote_row(&padded).unwrap();
        assert_eq!(row.name, "Bitcoin");
        assert_eq!(row.symbol, "BTC");

        let blank = listing("   ", "BTC", Some(1.0), Some("2024-05-01T00:00:00Z"));
        assert_eq!(to_quote_row(&blank), Err(SkipReason::Incomplete));
    }

    #[test]
    fn test_optional_fields_may_be_absent() {
        let mut l = listing("Tether", "USDT", Some(1.0), Some("2024-05-01T00:00:00Z"));
        l.cmc_rank = Some(i64::from(i32::MAX) + 1);
        if let Some(q) = l.quote.get_mut("USD") {
            q.volume_24h = None;
            q.market_cap = Some(f64::NAN);
        }

        let row = to_quote_row(&l).unwrap();
        assert_eq!(row.rank, None);
        assert_eq!(row.volume_24h_usd, None);
        assert_eq!(row.market_cap_usd, None);
    }

    #[test]
    fn test_oversized_symbol_is_rejected() {
        let l = listing("Long", "ABCDEFGHIJK", Some(1.0), Some("2024-05-01T00:00:00Z"));
        assert_eq!(
            to_quote_row(&l),
            Err(SkipReason::TooLong {
                field: "symbol",
                max: MAX_SYMBOL_LEN
            })
        );
    }

    #[test]
    fn test_parse_last_updated_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        assert_eq!(parse_last_updated("2024-05-01T10:00:00.000Z"), Some(expected));
        assert_eq!(parse_last_updated("2024-05-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_last_updated("2024-05-01T10:00:00"), Some(expected));
        assert_eq!(parse_last_updated("2024-05-01 10:00:00"), Some(expected));
        assert_eq!(parse_last_updated("yesterday"), None);
    }

    #[test]
    fn test_invalid_timestamp_is_reported() {
        let l = listing("Bitcoin", "BTC", Some(1.0), Some("01/05/2024"));
        assert_eq!(
            to_quote_row(&l),
            Err(SkipReason::InvalidTimestamp("01/05/2024".to_string()))
        );
    }

    #[test]
    fn test_transform_counts_skipped() {
        let listings = vec![
            listing("Bitcoin", "BTC", Some(65000.0), Some("2024-05-01T00:00:00Z")),
            listing("Broken", "BRK", None, Some("2024-05-01T00:00:00Z")),
            listing("Ethereum", "ETH", Some(3000.0), Some("2024-05-01T00:00:00Z")),
        ];

        let result = transform_listings(listings);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.rows[1].symbol, "ETH");
    }

    #[test]
    fn test_to_decimal_rounds_to_scale() {
        assert_eq!(to_decimal(f64::INFINITY), None);
        let d = to_decimal(0.123456789012345).unwrap();
        assert!(d.scale() <= DECIMAL_SCALE);
    }
}
