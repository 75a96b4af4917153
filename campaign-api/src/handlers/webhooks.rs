use actix_web::{web, HttpResponse, Result};
use shared_types::{ErrorResponse, WebhookAck};
use std::sync::Arc;

use crate::ingest::CallWebhookIngestor;

#[derive(Clone)]
pub struct WebhookAppState {
    pub ingestor: Arc<CallWebhookIngestor>,
    pub acknowledge_on_persistence_error: bool,
}

/// Receive a call lifecycle callback from the voice provider.
///
/// Invalid and unhandled deliveries are acknowledged so the provider stops
/// retrying them. Persistence failures are acknowledged unless configured otherwise.
pub async fn receive_call_webhook(
    data: web::Data<WebhookAppState>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let received_at = chrono::Utc::now().timestamp();
    let ingestor = data.ingestor.clone();

    let result = web::block(move || ingestor.ingest(&body, received_at))
        .await
        .map_err(|e| {
            tracing::error!("Call webhook worker failed: {}", e);
            actix_web::error::ErrorInternalServerError(e.to_string())
        })?;

    match result {
        Err(e) if e.is_persistence() && !data.acknowledge_on_persistence_error => {
            Ok(HttpResponse::InternalServerError().json(ErrorResponse {
                error: e.to_string(),
            }))
        }
        _ => Ok(HttpResponse::Ok().json(WebhookAck::received())),
    }
}

pub async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header(("Allow", "POST"))
        .json(ErrorResponse {
            error: "Method not allowed".to_string(),
        })
}
