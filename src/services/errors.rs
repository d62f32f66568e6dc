use thiserror::Error;

use crate::domain::product::QuotaSnapshot;

/// Generic error type used by service layer functions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// One or more identifiers failed the ASIN format check.
    #[error("invalid ASIN format: {}", .0.join(", "))]
    InvalidFormat(Vec<String>),
    /// The request carried no identifiers.
    #[error("no ASINs provided")]
    EmptyRequest,
    /// The request carried more identifiers than a batch run accepts.
    #[error("{found} ASINs supplied, at most {max} allowed")]
    CountExceeded { found: usize, max: usize },
    /// Keepa returned no product for the identifier.
    #[error("product not found")]
    NotFound,
    /// Keepa rejected the call because the token bucket is empty.
    #[error("keepa rate limit exceeded")]
    QuotaExceeded(QuotaSnapshot),
    /// The Keepa call exceeded its timeout.
    #[error("keepa request timed out")]
    Timeout,
    /// Any other Keepa failure. The cause is logged where it happens.
    #[error("upstream service error")]
    Upstream,
    /// An uploaded or submitted file could not be processed.
    #[error("{0}")]
    Form(String),
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
