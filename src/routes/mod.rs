use actix_multipart::MultipartError;
use actix_multipart::form::MultipartFormConfig;
use actix_web::{HttpResponse, error, web};

use crate::dto::api::ApiErrorResponse;
use crate::services::ServiceError;

pub mod api;
pub mod main;

/// Registers every route of the service.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(multipart_config())
        .service(main::health)
        .service(api::get_product)
        .service(api::lookup_products)
        .service(api::upload_asins)
        .service(api::export_products)
        .default_service(web::to(not_found));
}

/// Renders a service error as a JSON failure envelope.
pub fn error_response(err: &ServiceError) -> HttpResponse {
    let body = ApiErrorResponse::from(err);
    match err {
        ServiceError::InvalidFormat(_)
        | ServiceError::EmptyRequest
        | ServiceError::CountExceeded { .. }
        | ServiceError::Form(_) => HttpResponse::BadRequest().json(body),
        ServiceError::NotFound => HttpResponse::NotFound().json(body),
        ServiceError::QuotaExceeded(_) => HttpResponse::TooManyRequests().json(body),
        ServiceError::Timeout => HttpResponse::GatewayTimeout().json(body),
        ServiceError::Upstream => HttpResponse::BadGateway().json(body),
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected JSON payload: {err}");
        let response =
            HttpResponse::BadRequest().json(ApiErrorResponse::message("Malformed JSON payload"));
        error::InternalError::from_response(err, response).into()
    })
}

/// Whole-request cap for uploads; the `file` field itself is capped at 5 MB.
const UPLOAD_TOTAL_LIMIT: usize = 6 * 1024 * 1024;

fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(UPLOAD_TOTAL_LIMIT)
        .error_handler(|err, _req| {
            log::warn!("Rejected upload: {err}");
            let message = match &err {
                MultipartError::MissingField(_) => "No file uploaded".to_string(),
                other => format!("Invalid upload: {other}"),
            };
            let response = HttpResponse::BadRequest().json(ApiErrorResponse::message(message));
            error::InternalError::from_response(err, response).into()
        })
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(ApiErrorResponse::message("Endpoint not found"))
}
