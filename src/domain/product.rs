use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::types::{Asin, Price, Rating};

/// One sales-rank observation prepared for display.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    /// Rank formatted with thousands separators, e.g. `"1,500"`.
    pub rank: String,
    pub category: String,
    /// Set only for the record's primary sales rank.
    pub is_main: bool,
}

/// Whether Amazon itself currently sells the product.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Availability {
    #[serde(rename = "In Stock")]
    InStock,
    #[serde(rename = "Out of Stock")]
    OutOfStock,
}

impl Availability {
    /// Display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Availability::InStock => "In Stock",
            Availability::OutOfStock => "Out of Stock",
        }
    }
}

/// Display model of a single product lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductResult {
    pub asin: String,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub rankings: Vec<RankingEntry>,
    pub price: Option<Price>,
    pub rating: Option<Rating>,
    #[serde(default)]
    pub review_count: i64,
    pub availability: Availability,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

impl ProductResult {
    /// The ranking flagged as the primary sales rank, if any.
    pub fn main_ranking(&self) -> Option<&RankingEntry> {
        self.rankings.iter().find(|ranking| ranking.is_main)
    }
}

/// Remaining Keepa token budget as reported by the latest call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub tokens_left: i64,
    /// Seconds until the token bucket refills.
    pub refill_in: i64,
}

/// Result of a single-identifier lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SingleLookup {
    pub product: ProductResult,
    pub quota: QuotaSnapshot,
}

/// Aggregated result of a multi-batch lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutcome {
    /// Normalized products in batch order.
    pub results: Vec<ProductResult>,
    /// Quota reading of the most recently completed call.
    pub quota: QuotaSnapshot,
    /// Identifiers whose batch call failed and produced no results.
    pub unresolved: Vec<Asin>,
}
