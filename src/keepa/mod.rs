//! Outbound access to the Keepa product API.
//!
//! Services talk to Keepa through the [`ProductApi`] trait so that the lookup
//! pipeline can be exercised against in-memory doubles.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::QuotaSnapshot;
use crate::domain::types::Asin;
use crate::models::keepa::ProductResponse;

pub mod client;

pub use client::KeepaClient;

/// Timeout for a single-identifier lookup call.
pub const SINGLE_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for a batch lookup call.
pub const BATCH_LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);
/// Number of offers requested for single lookups.
pub const SINGLE_LOOKUP_OFFERS: u32 = 20;

/// Parameters of one `/product` call.
#[derive(Debug, Clone, Copy)]
pub struct ProductQuery<'a> {
    pub asins: &'a [Asin],
    pub timeout: Duration,
    pub offers: Option<u32>,
}

impl<'a> ProductQuery<'a> {
    /// Query used by the single-identifier entry point.
    pub fn single(asin: &'a Asin) -> Self {
        Self {
            asins: std::slice::from_ref(asin),
            timeout: SINGLE_LOOKUP_TIMEOUT,
            offers: Some(SINGLE_LOOKUP_OFFERS),
        }
    }

    /// Query covering one batch of identifiers.
    pub fn batch(asins: &'a [Asin]) -> Self {
        Self {
            asins,
            timeout: BATCH_LOOKUP_TIMEOUT,
            offers: None,
        }
    }

    /// Identifiers joined the way Keepa expects them.
    pub fn joined_asins(&self) -> String {
        self.asins
            .iter()
            .map(Asin::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Failures of a Keepa call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("keepa request timed out")]
    Timeout,
    #[error(
        "keepa rate limit exceeded ({} tokens left, refill in {})",
        .0.tokens_left,
        .0.refill_in
    )]
    RateLimited(QuotaSnapshot),
    #[error("keepa rejected the request with status {0}")]
    Status(u16),
    #[error("keepa request failed: {0}")]
    Transport(String),
    #[error("failed to decode keepa response: {0}")]
    Decode(String),
}

/// Source of raw Keepa product records.
#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn fetch_products(&self, query: ProductQuery<'_>)
    -> Result<ProductResponse, ApiError>;
}
