//! Wire types for the subset of the Keepa `/product` response we consume.
//!
//! Every field is optional: Keepa omits or nulls anything it has no data for,
//! and stat arrays use `-1` or `null` as "unknown".

use indexmap::IndexMap;
use serde::Deserialize;

/// Index of the current Amazon price (cents) in `stats.current`.
pub const STAT_AMAZON_PRICE: usize = 0;
/// Index of the primary sales rank in `stats.current`.
pub const STAT_SALES_RANK: usize = 3;
/// Index of the rating (tenths of a star) in `stats.avg`.
pub const STAT_RATING: usize = 16;
/// Index of the review count in `stats.current`.
pub const STAT_REVIEW_COUNT: usize = 17;

/// Top-level response of `GET /product`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    #[serde(default)]
    pub products: Option<Vec<RawProduct>>,
    #[serde(default)]
    pub tokens_left: Option<i64>,
    #[serde(default)]
    pub refill_in: Option<i64>,
}

/// A product record exactly as Keepa returns it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProduct {
    #[serde(default)]
    pub asin: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub stats: Option<RawStats>,
    #[serde(default)]
    pub category_tree: Option<Vec<CategoryNode>>,
    /// Category code to `[time, rank, time, rank, ...]`, in source order.
    #[serde(default)]
    pub sales_ranks: Option<IndexMap<String, Option<Vec<i64>>>>,
    #[serde(default, rename = "imagesCSV")]
    pub images_csv: Option<String>,
    #[serde(default)]
    pub availability_amazon: Option<i64>,
    /// Minutes since the Unix epoch.
    #[serde(default)]
    pub last_update: Option<i64>,
}

/// Statistic arrays indexed by Keepa price-type codes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawStats {
    #[serde(default)]
    pub current: Option<Vec<Option<i64>>>,
    #[serde(default)]
    pub avg: Option<Vec<Option<i64>>>,
}

impl RawStats {
    pub fn current(&self, index: usize) -> Option<i64> {
        stat_at(self.current.as_deref(), index)
    }

    pub fn avg(&self, index: usize) -> Option<i64> {
        stat_at(self.avg.as_deref(), index)
    }
}

fn stat_at(values: Option<&[Option<i64>]>, index: usize) -> Option<i64> {
    values.and_then(|values| values.get(index).copied().flatten())
}

/// One node of the category tree, either an object or a bare code.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CategoryNode {
    Node {
        #[serde(rename = "catId")]
        cat_id: i64,
        #[serde(default)]
        name: Option<String>,
    },
    Code(i64),
}

impl CategoryNode {
    pub fn code(&self) -> i64 {
        match self {
            CategoryNode::Node { cat_id, .. } => *cat_id,
            CategoryNode::Code(code) => *code,
        }
    }
}
