use actix_web::{web, HttpResponse, Result as ActixResult};

use super::blocking_read;
use crate::database::{candidates as db, DbConnection};

pub async fn get_candidate_outcome(
    db_conn: web::Data<DbConnection>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let candidate_id = path.into_inner();
    let db_conn = db_conn.get_ref().clone();

    let lookup_id = candidate_id.clone();
    let outcome =
        blocking_read(move || db::get_candidate_outcome(&*db_conn.get()?, &lookup_id)).await?;

    match outcome {
        Some(outcome) => Ok(HttpResponse::Ok().json(outcome)),
        None => Err(actix_web::error::ErrorNotFound(format!(
            "No outcome recorded for candidate {}",
            candidate_id
        ))),
    }
}
