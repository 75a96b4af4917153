pub mod calls;
pub mod candidates;
pub mod deliveries;
pub mod health;
pub mod webhooks;

use actix_web::web;

/// Register every route. Expects `WebhookAppState` and `DbConnection` in app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health::health))
        .service(
            web::resource(vec!["/api/webhooks/calls", "/webhooks/calls"])
                .route(web::post().to(webhooks::receive_call_webhook))
                .default_service(web::route().to(webhooks::method_not_allowed)),
        )
        .route(
            "/api/webhooks/deliveries",
            web::get().to(deliveries::list_deliveries),
        )
        .route("/api/calls", web::get().to(calls::list_calls))
        .route("/api/calls/{call_id}", web::get().to(calls::get_call))
        .route(
            "/api/calls/{call_id}/analysis",
            web::get().to(calls::get_call_analysis),
        )
        .route(
            "/api/candidates/{candidate_id}/outcome",
            web::get().to(candidates::get_candidate_outcome),
        );
}

/// Run a blocking database read off the async executor
pub(crate) async fn blocking_read<T, F>(f: F) -> actix_web::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f)
        .await
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?
        .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))
}
