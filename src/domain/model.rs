use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One entry of the listings endpoint, as returned by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Listing {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub cmc_rank: Option<i64>,
    #[serde(default)]
    pub quote: HashMap<String, Quote>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub volume_24h: Option<f64>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// A listing that passed validation and maps one-to-one onto a table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteRow {
    pub name: String,
    pub symbol: String,
    pub rank: Option<i32>,
    pub price_usd: Decimal,
    pub volume_24h_usd: Option<Decimal>,
    pub market_cap_usd: Option<Decimal>,
    pub last_updated: NaiveDateTime,
}

/// One page of the listings endpoint. `rejected` counts entries that did
/// not decode as a [`Listing`].
#[derive(Debug, Clone, Default)]
pub struct ListingsPage {
    pub listings: Vec<Listing>,
    pub rejected: usize,
}

impl ListingsPage {
    /// Entries the API returned, decodable or not.
    pub fn len(&self) -> usize {
        self.listings.len() + self.rejected
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<Listing>> for ListingsPage {
    fn from(listings: Vec<Listing>) -> Self {
        Self {
            listings,
            rejected: 0,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub rows: Vec<QuoteRow>,
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Rows sent to the store.
    pub attempted: usize,
    /// Rows actually written; duplicates are ignored by the store.
    pub inserted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Success,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Success => write!(f, "SUCCESS"),
            JobStatus::Failed => write!(f, "FAILED"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub status: JobStatus,
    pub extracted: usize,
    pub transformed: usize,
    pub skipped: usize,
    pub attempted: usize,
    pub inserted: u64,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub finished_at: NaiveDateTime,
}

mod duration_millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
