use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::domain::product::QuotaSnapshot;
use crate::models::config::ServerConfig;
use crate::models::keepa::ProductResponse;

use super::{ApiError, ProductApi, ProductQuery};

/// [`ProductApi`] implementation backed by the Keepa HTTP API.
///
/// The inner `reqwest::Client` pools connections and is cheap to clone, so a
/// single instance is shared by every request handler.
#[derive(Clone)]
pub struct KeepaClient {
    http: Client,
    base_url: String,
    api_key: String,
    domain: u8,
}

impl std::fmt::Debug for KeepaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepaClient")
            .field("base_url", &self.base_url)
            .field("domain", &self.domain)
            .finish_non_exhaustive()
    }
}

impl KeepaClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, domain: u8) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            domain,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            config.keepa_base_url.as_str(),
            config.keepa_api_key.as_str(),
            config.keepa_domain,
        )
    }

    fn product_url(&self) -> String {
        format!("{}/product", self.base_url)
    }

    fn query_params(&self, query: &ProductQuery<'_>) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("key", self.api_key.clone()),
            ("domain", self.domain.to_string()),
            ("asin", query.joined_asins()),
            ("stats", "1".to_string()),
            ("history", "0".to_string()),
            ("rating", "1".to_string()),
        ];
        if let Some(offers) = query.offers {
            params.push(("offers", offers.to_string()));
        }
        params
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl ProductApi for KeepaClient {
    async fn fetch_products(
        &self,
        query: ProductQuery<'_>,
    ) -> Result<ProductResponse, ApiError> {
        let response = self
            .http
            .get(self.product_url())
            .query(&self.query_params(&query))
            .timeout(query.timeout)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            // The rejection body still carries the token bucket state.
            let body = response.json::<ProductResponse>().await.unwrap_or_default();
            return Err(ApiError::RateLimited(QuotaSnapshot {
                tokens_left: body.tokens_left.unwrap_or(0),
                refill_in: body.refill_in.unwrap_or(0),
            }));
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        Ok(response.json::<ProductResponse>().await?)
    }
}
