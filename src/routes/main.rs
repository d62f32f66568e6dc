use actix_web::{HttpResponse, Responder, get, web};

use crate::models::config::ServerConfig;
use crate::services::main::health_status;

#[get("/health")]
pub async fn health(server_config: web::Data<ServerConfig>) -> impl Responder {
    HttpResponse::Ok().json(health_status(&server_config.environment))
}
