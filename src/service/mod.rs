//service/mod.rs
pub mod persist_service;

use actix_web::{web, HttpResponse, Error};
use actix_web::error::ErrorInternalServerError;
use actix_web::http::StatusCode;
use futures::StreamExt;
use bytes::BytesMut;
use chrono::Utc;
use log::{info, error, warn, debug};
use log_mdc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::error::PersistError;
use crate::model::{Batch, BatchResult};

/// JSON body returned by the upload endpoint
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub result: BatchResult,
}

impl UploadResponse {
    fn from_result(result: BatchResult) -> (StatusCode, Self) {
        let (code, status) = if result.all_succeeded() {
            (StatusCode::OK, "success")
        } else if result.succeeded > 0 {
            (StatusCode::MULTI_STATUS, "partial")
        } else {
            (StatusCode::UNPROCESSABLE_ENTITY, "failure")
        };
        let message = format!("{} sheets saved", result.succeeded);
        (code, Self { status, message, result })
    }

    fn storage_unavailable(total: usize, error: &PersistError) -> Self {
        Self {
            status: "error",
            message: error.detail(),
            result: BatchResult {
                total,
                succeeded: 0,
                failed: total,
                outcomes: Vec::new(),
            },
        }
    }
}

/// `batch`/`entries` log context for one upload; both keys are removed on drop
struct MdcScope;

impl MdcScope {
    fn enter(batch_id: &str, entries: Option<usize>) -> Self {
        log_mdc::insert("batch", batch_id);
        if let Some(n) = entries {
            log_mdc::insert("entries", n.to_string());
        }
        MdcScope
    }

    fn set_entries(&self, n: usize) {
        log_mdc::insert("entries", n.to_string());
    }
}

impl Drop for MdcScope {
    fn drop(&mut self) {
        log_mdc::remove("batch");
        log_mdc::remove("entries");
    }
}

fn error_body(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "status": "error", "message": message.into() })
}

pub async fn root_service() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": "Hello World" }))
}

/// Preflight answer; the CORS headers themselves come from the app-wide middleware
pub async fn preflight_service() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

pub async fn upload_csvs_service(mut payload: web::Payload, app_state: web::Data<AppState>) -> Result<HttpResponse, Error> {
    let batch_id = Utc::now().format("%Y%m%dT%H%M%S%.6f").to_string();
    let mdc = MdcScope::enter(&batch_id, None);

    let limit = app_state.config.server.max_payload_size as usize;
    let mut bytes = BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(ErrorInternalServerError)?;
        if bytes.len() + chunk.len() > limit {
            warn!("Upload exceeds {} byte limit", limit);
            return Ok(HttpResponse::PayloadTooLarge()
                .json(error_body(format!("Request body exceeds {} bytes", limit))));
        }
        bytes.extend_from_slice(&chunk);
    }
    debug!("Total received data size: {} bytes", bytes.len());

    let batch: Batch = match serde_json::from_slice(&bytes) {
        Ok(batch) => batch,
        Err(e) => {
            warn!("Invalid upload body: {}", e);
            return Ok(HttpResponse::BadRequest().json(error_body(format!("Invalid request body: {}", e))));
        }
    };
    let total = batch.len();
    mdc.set_entries(total);
    info!("Received batch of {} sheets", total);

    let persister = app_state.persister.clone();
    let block_id = batch_id.clone();
    let outcome = web::block(move || {
        let _mdc = MdcScope::enter(&block_id, Some(total));
        persister.persist_batch(&batch)
    })
    .await
    .map_err(ErrorInternalServerError)?;

    match outcome {
        Ok(result) => {
            let (code, body) = UploadResponse::from_result(result);
            info!("Batch {} finished: {}", batch_id, body.message);
            Ok(HttpResponse::build(code).json(body))
        }
        Err(e) => {
            error!("Batch {} rejected: {}", batch_id, e);
            Ok(HttpResponse::ServiceUnavailable().json(UploadResponse::storage_unavailable(total, &e)))
        }
    }
}
