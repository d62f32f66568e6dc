//! Cross-cutting HTTP middleware: CORS and the per-client request limiter.

use std::net::IpAddr;
use std::num::NonZeroU32;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::{Error, HttpResponse, web};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::dto::api::ApiErrorResponse;

/// Paths guarded by [`limit_requests`].
const LIMITED_PREFIX: &str = "/api/";

/// Builds the CORS policy for the configured browser origins.
///
/// Requests without an `Origin` header are not affected.
pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .expose_headers(vec![header::CONTENT_DISPOSITION])
        .supports_credentials()
        .max_age(3600);

    for origin in allowed_origins {
        cors = cors.allowed_origin(origin.trim());
    }

    cors
}

/// Per-client-address quota: bursts of up to `max_requests`, replenished
/// evenly over `window`.
pub struct InboundLimiter {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
}

impl InboundLimiter {
    pub fn new(window: Duration, max_requests: NonZeroU32) -> Self {
        let period = window / max_requests.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(max_requests))
            .allow_burst(max_requests);
        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    /// Consumes one request from `client`'s quota.
    pub fn admit(&self, client: IpAddr) -> bool {
        self.limiter.check_key(&client).is_ok()
    }
}

/// Rejects `/api` requests from clients that exhausted their quota.
///
/// Requests without a known peer address, and apps without an
/// [`InboundLimiter`] in their data, pass through.
pub async fn limit_requests<B: MessageBody>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let rejected = req.path().starts_with(LIMITED_PREFIX)
        && match (
            req.app_data::<web::Data<InboundLimiter>>(),
            req.peer_addr(),
        ) {
            (Some(limiter), Some(peer)) => !limiter.admit(peer.ip()),
            _ => false,
        };

    if rejected {
        log::warn!("Rate limit hit for {:?} on {}", req.peer_addr(), req.path());
        let response = HttpResponse::TooManyRequests().json(ApiErrorResponse::message(
            "Too many requests from this IP, please try again later.",
        ));
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
