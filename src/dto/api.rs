//! JSON envelopes returned by the `/api` endpoints.

use serde::Serialize;

use crate::domain::product::{BatchOutcome, ProductResult, QuotaSnapshot};
use crate::services::ServiceError;

/// Successful response: payload plus the Keepa quota snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub tokens_left: i64,
    pub refill_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_count: Option<usize>,
    #[serde(rename = "unresolvedASINs", skip_serializing_if = "Vec::is_empty")]
    pub unresolved_asins: Vec<String>,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, quota: QuotaSnapshot) -> Self {
        Self {
            success: true,
            data,
            tokens_left: quota.tokens_left,
            refill_in: quota.refill_in,
            processed_count: None,
            unresolved_asins: Vec::new(),
        }
    }
}

impl ApiResponse<Vec<ProductResult>> {
    /// Envelope of a batch run. `processedCount` is reported for uploads.
    pub fn from_outcome(outcome: BatchOutcome, with_count: bool) -> Self {
        let processed_count = with_count.then_some(outcome.results.len());
        Self {
            processed_count,
            unresolved_asins: outcome
                .unresolved
                .into_iter()
                .map(String::from)
                .collect(),
            ..Self::new(outcome.results, outcome.quota)
        }
    }
}

/// Failed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(rename = "invalidASINs", skip_serializing_if = "Option::is_none")]
    pub invalid_asins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub found_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_left: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refill_in: Option<i64>,
}

impl ApiErrorResponse {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            invalid_asins: None,
            found_count: None,
            tokens_left: None,
            refill_in: None,
        }
    }
}

impl From<&ServiceError> for ApiErrorResponse {
    fn from(err: &ServiceError) -> Self {
        match err {
            ServiceError::InvalidFormat(asins) => Self {
                invalid_asins: Some(asins.clone()),
                ..Self::message("Invalid ASIN format. ASIN must be 10 alphanumeric characters.")
            },
            ServiceError::EmptyRequest => Self::message("Please provide an array of ASINs"),
            ServiceError::CountExceeded { found, max } => Self {
                found_count: Some(*found),
                ..Self::message(format!(
                    "Found {found} ASINs. Maximum {max} ASINs allowed per request."
                ))
            },
            ServiceError::NotFound => Self::message("Product not found"),
            ServiceError::QuotaExceeded(quota) => Self {
                tokens_left: Some(quota.tokens_left),
                refill_in: Some(quota.refill_in),
                ..Self::message("Keepa API rate limit exceeded. Please try again later.")
            },
            ServiceError::Timeout => Self::message("Request timeout. Please try again."),
            ServiceError::Upstream => Self::message("Failed to fetch product data"),
            ServiceError::Form(message) => Self::message(message.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_uses_camel_case() {
        let quota = QuotaSnapshot {
            tokens_left: 12,
            refill_in: 34,
        };
        let json = serde_json::to_value(ApiResponse::new("payload", quota)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], "payload");
        assert_eq!(json["tokensLeft"], 12);
        assert_eq!(json["refillIn"], 34);
        assert!(json.get("processedCount").is_none());
        assert!(json.get("unresolvedASINs").is_none());
    }

    #[test]
    fn invalid_format_lists_offenders() {
        let err = ServiceError::InvalidFormat(vec!["INVALID".into()]);
        let json = serde_json::to_value(ApiErrorResponse::from(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["invalidASINs"][0], "INVALID");
        assert!(json.get("tokensLeft").is_none());
    }

    #[test]
    fn quota_error_carries_telemetry() {
        let err = ServiceError::QuotaExceeded(QuotaSnapshot {
            tokens_left: 0,
            refill_in: 60,
        });
        let json = serde_json::to_value(ApiErrorResponse::from(&err)).unwrap();
        assert_eq!(json["tokensLeft"], 0);
        assert_eq!(json["refillIn"], 60);
    }
}
