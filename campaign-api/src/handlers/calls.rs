use actix_web::{web, HttpResponse, Result as ActixResult};
use serde::Deserialize;
use shared_types::CallsResponse;

use super::blocking_read;
use crate::database::{analyses, calls as db, DbConnection};

const DEFAULT_LIMIT: usize = 100;
const MAX_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct ListCallsQuery {
    pub limit: Option<usize>,
}

pub(crate) fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn list_calls(
    db_conn: web::Data<DbConnection>,
    query: web::Query<ListCallsQuery>,
) -> ActixResult<HttpResponse> {
    let db_conn = db_conn.get_ref().clone();
    let limit = clamp_limit(query.limit);

    let calls = blocking_read(move || db::list_call_records(&*db_conn.get()?, limit)).await?;

    Ok(HttpResponse::Ok().json(CallsResponse { calls }))
}

pub async fn get_call(
    db_conn: web::Data<DbConnection>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let call_id = path.into_inner();
    let db_conn = db_conn.get_ref().clone();

    let lookup_id = call_id.clone();
    let call = blocking_read(move || db::get_call_record(&*db_conn.get()?, &lookup_id)).await?;

    match call {
        Some(call) => Ok(HttpResponse::Ok().json(call)),
        None => Err(actix_web::error::ErrorNotFound(format!(
            "Call {} not found",
            call_id
        ))),
    }
}

pub async fn get_call_analysis(
    db_conn: web::Data<DbConnection>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let call_id = path.into_inner();
    let db_conn = db_conn.get_ref().clone();

    let lookup_id = call_id.clone();
    let analysis =
        blocking_read(move || analyses::get_analysis(&*db_conn.get()?, &lookup_id)).await?;

    match analysis {
        Some(analysis) => Ok(HttpResponse::Ok().json(analysis)),
        None => Err(actix_web::error::ErrorNotFound(format!(
            "No analysis for call {}",
            call_id
        ))),
    }
}
