//! Conversion of raw Keepa records into [`ProductResult`] display models.

use chrono::{DateTime, Utc};

use crate::domain::category::{MAIN_CATEGORY_LABEL, resolve_category, resolve_category_key};
use crate::domain::product::{Availability, ProductResult, RankingEntry};
use crate::domain::types::{Price, Rating};
use crate::models::keepa::{
    RawProduct, STAT_AMAZON_PRICE, STAT_RATING, STAT_REVIEW_COUNT, STAT_SALES_RANK,
};

/// Placeholder title for records without one.
pub const MISSING_TITLE: &str = "No title available";
/// Placeholder for missing brand and model.
pub const UNKNOWN: &str = "Unknown";
/// Template prefix for product images; the first `imagesCSV` token is appended.
pub const IMAGE_URL_PREFIX: &str = "https://images-na.ssl-images-amazon.com/images/I/";

/// Keepa code meaning "Amazon has the item in stock".
const AVAILABILITY_IN_STOCK: i64 = 0;

/// Normalizes a raw Keepa record.
///
/// Never fails: every missing or out-of-range field degrades to a placeholder
/// or `None`.
pub fn normalize_product(raw: RawProduct) -> ProductResult {
    let rankings = extract_rankings(&raw);
    let stats = raw.stats.as_ref();

    let price = stats
        .and_then(|s| s.current(STAT_AMAZON_PRICE))
        .and_then(|cents| Price::from_cents(cents).ok());
    let rating = stats
        .and_then(|s| s.avg(STAT_RATING))
        .and_then(|tenths| Rating::from_tenths(tenths).ok());
    let review_count = stats
        .and_then(|s| s.current(STAT_REVIEW_COUNT))
        .filter(|count| *count > 0)
        .unwrap_or(0);

    let availability = match raw.availability_amazon {
        Some(AVAILABILITY_IN_STOCK) => Availability::InStock,
        _ => Availability::OutOfStock,
    };

    ProductResult {
        asin: raw.asin.unwrap_or_default(),
        title: text_or(raw.title, MISSING_TITLE),
        brand: text_or(raw.brand, UNKNOWN),
        model: text_or(raw.model, UNKNOWN),
        rankings,
        price,
        rating,
        review_count,
        availability,
        image_url: raw.images_csv.as_deref().and_then(image_url),
        last_update: raw.last_update.and_then(minutes_to_timestamp),
    }
}

fn text_or(value: Option<String>, placeholder: &str) -> String {
    value
        .filter(|text| !text.trim().is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Main sales rank first, then the latest rank of every sub-category in
/// source order.
fn extract_rankings(raw: &RawProduct) -> Vec<RankingEntry> {
    let mut rankings = Vec::new();

    if let Some(rank) = raw
        .stats
        .as_ref()
        .and_then(|s| s.current(STAT_SALES_RANK))
        .filter(|rank| *rank > 0)
    {
        let category = match raw.category_tree.as_deref() {
            Some([root, ..]) => resolve_category(root.code()),
            _ => MAIN_CATEGORY_LABEL.to_string(),
        };
        rankings.push(RankingEntry {
            rank: format_rank(rank),
            category,
            is_main: true,
        });
    }

    if let Some(sales_ranks) = &raw.sales_ranks {
        for (key, history) in sales_ranks {
            let Some(latest) = history.as_deref().and_then(<[i64]>::last) else {
                continue;
            };
            rankings.push(RankingEntry {
                rank: format_rank(*latest),
                category: resolve_category_key(key),
                is_main: false,
            });
        }
    }

    rankings
}

/// Formats an integer with comma thousands separators.
pub fn format_rank(rank: i64) -> String {
    let digits = rank.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rank < 0 {
        grouped.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

fn image_url(images_csv: &str) -> Option<String> {
    images_csv
        .split(',')
        .next()
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| format!("{IMAGE_URL_PREFIX}{token}"))
}

fn minutes_to_timestamp(minutes: i64) -> Option<DateTime<Utc>> {
    if minutes <= 0 {
        return None;
    }
    minutes
        .checked_mul(60)
        .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
}
