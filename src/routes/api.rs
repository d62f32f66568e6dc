use std::sync::Arc;

use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};

use crate::dto::api::ApiResponse;
use crate::forms::import_export::UploadAsinsForm;
use crate::forms::products::{ExportQueryParams, ExportProductsForm, LookupProductsForm};
use crate::keepa::ProductApi;
use crate::models::config::ServerConfig;
use crate::routes::error_response;
use crate::services::ServiceError;
use crate::services::batches::Pacer;
use crate::services::import_export::{
    download_products as download_products_service, lookup_uploaded as lookup_uploaded_service,
};
use crate::services::products::{
    lookup_product as lookup_product_service, lookup_products as lookup_products_service,
};

#[get("/api/product/{asin}")]
pub async fn get_product(
    asin: web::Path<String>,
    api: web::Data<Arc<dyn ProductApi>>,
) -> impl Responder {
    match lookup_product_service(&asin, api.get_ref().as_ref()).await {
        Ok(lookup) => HttpResponse::Ok().json(ApiResponse::new(lookup.product, lookup.quota)),
        Err(err) => error_response(&err),
    }
}

#[post("/api/products")]
pub async fn lookup_products(
    form: web::Json<LookupProductsForm>,
    api: web::Data<Arc<dyn ProductApi>>,
    pacer: web::Data<Arc<dyn Pacer>>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    match lookup_products_service(
        &form.asins,
        api.get_ref().as_ref(),
        pacer.get_ref().as_ref(),
        &server_config.batch_options(),
    )
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(ApiResponse::from_outcome(outcome, false)),
        Err(err) => error_response(&err),
    }
}

#[post("/api/upload")]
pub async fn upload_asins(
    MultipartForm(mut form): MultipartForm<UploadAsinsForm>,
    api: web::Data<Arc<dyn ProductApi>>,
    pacer: web::Data<Arc<dyn Pacer>>,
    server_config: web::Data<ServerConfig>,
) -> impl Responder {
    log::info!(
        "Processing uploaded file: {}",
        form.file.file_name.as_deref().unwrap_or("<unnamed>")
    );

    let candidates = match form.parse() {
        Ok(candidates) => candidates,
        Err(err) => {
            log::error!("Failed to parse uploaded file: {err}");
            return error_response(&ServiceError::from(err));
        }
    };

    match lookup_uploaded_service(
        candidates,
        api.get_ref().as_ref(),
        pacer.get_ref().as_ref(),
        &server_config.batch_options(),
    )
    .await
    {
        Ok(outcome) => HttpResponse::Ok().json(ApiResponse::from_outcome(outcome, true)),
        Err(err) => error_response(&err),
    }
}

#[post("/api/export")]
pub async fn export_products(
    params: web::Query<ExportQueryParams>,
    form: web::Json<ExportProductsForm>,
) -> impl Responder {
    match download_products_service(&params.format, &form.products) {
        Ok(file) => HttpResponse::Ok()
            .append_header(("Content-Type", file.content_type))
            .append_header((
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", file.file_name),
            ))
            .body(file.bytes),
        Err(err) => error_response(&err),
    }
}
