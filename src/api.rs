//! HTTP routes and cross-origin headers

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::{get, post, web, Error, HttpResponse};

use crate::app_state::AppState;
use crate::config::ServerConfig;
use crate::service::{preflight_service, root_service, upload_csvs_service};

#[get("/")]
pub async fn index() -> HttpResponse {
    root_service().await
}

#[post("/upload-csvs")]
pub async fn upload_csvs(payload: web::Payload, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    upload_csvs_service(payload, app_state).await
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(upload_csvs)
        .route("/{tail:.*}", web::method(Method::OPTIONS).to(preflight_service));
}

/// Headers opening the API to browser clients from `cors_allow_origin`
pub fn cors_headers(config: &ServerConfig) -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", config.cors_allow_origin.as_str()))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "*"))
}
