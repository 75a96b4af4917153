use actix_web::{web, HttpResponse, Responder};

use crate::database::DbConnection;

pub async fn health(db_conn: web::Data<DbConnection>) -> impl Responder {
    let db_conn = db_conn.get_ref().clone();
    let reachable = web::block(move || {
        db_conn
            .get()
            .and_then(|conn| Ok(conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?))
    })
    .await;

    match reachable {
        Ok(Ok(_)) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Ok(Err(e)) => {
            tracing::error!("Health check failed: {:#}", e);
            HttpResponse::InternalServerError().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
        Err(_) => HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}
