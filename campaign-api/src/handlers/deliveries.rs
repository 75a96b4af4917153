use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::{DeliveryStatus, WebhookDeliveriesResponse};

use super::blocking_read;
use super::calls::clamp_limit;
use crate::database::{deliveries as db, DbConnection};

#[derive(Debug, Deserialize)]
pub struct ListDeliveriesQuery {
    pub status: Option<DeliveryStatus>,
    pub limit: Option<usize>,
}

pub async fn list_deliveries(
    db_conn: web::Data<DbConnection>,
    query: web::Query<ListDeliveriesQuery>,
) -> ActixResult<HttpResponse> {
    let db_conn = db_conn.get_ref().clone();
    let status = query.status;
    let limit = clamp_limit(query.limit);

    let deliveries =
        blocking_read(move || db::list_deliveries(&*db_conn.get()?, status, limit)).await?;

    Ok(HttpResponse::Ok().json(WebhookDeliveriesResponse { deliveries }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_list_deliveries_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(&dir.path().join("deliveries.sqlite")).unwrap();

        {
            let conn = db.connection.get().unwrap();
            for (status, received_at) in [
                (DeliveryStatus::Processed, 10),
                (DeliveryStatus::Failed, 20),
                (DeliveryStatus::Ignored, 30),
            ] {
                db::insert_delivery(
                    &conn,
                    &db::NewDelivery {
                        call_id: Some("call_1"),
                        event_type: Some("call.started"),
                        status,
                        error: None,
                        payload: "{}",
                        received_at,
                        processed_at: received_at,
                    },
                )
                .unwrap();
            }
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(db.connection.clone()))
                .route("/api/webhooks/deliveries", web::get().to(list_deliveries)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/webhooks/deliveries")
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["deliveries"].as_array().unwrap().len(), 3);
        assert_eq!(resp["deliveries"][0]["status"], "ignored");

        let req = test::TestRequest::get()
            .uri("/api/webhooks/deliveries?status=failed")
            .to_request();
        let resp: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp["deliveries"].as_array().unwrap().len(), 1);
        assert_eq!(resp["deliveries"][0]["received_at"], 20);

        let req = test::TestRequest::get()
            .uri("/api/webhooks/deliveries?status=lost")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
