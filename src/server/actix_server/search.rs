//! Code for `/search` (spec.md §6.1, §4.7 overlap search).

use actix_web::{
    get,
    web::{Data, Json, Query},
    Responder,
};

use crate::search::OverlapQuery;

use super::error::ApiError;
use super::AppState;

#[derive(serde::Deserialize, Debug, Clone, utoipa::IntoParams)]
pub struct SearchParams {
    pub accession: String,
    pub start: u64,
    pub end: u64,
}

/// `variations` entries are GA4GH VRS 2.x JSON, matching `GET /variation/{id}`.
#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct SearchResponse {
    pub variations: Vec<serde_json::Value>,
}

/// Return every Allele whose location overlaps the requested interval
/// (spec.md §4.7, §6.1).
#[utoipa::path(
    get,
    path = "/search",
    params(SearchParams),
    responses(
        (status = 200, description = "matching variations", body = SearchResponse),
        (status = 400, description = "bad range"),
    ),
)]
#[get("/search")]
pub async fn search(
    data: Data<AppState>,
    query: Query<SearchParams>,
) -> actix_web::Result<impl Responder, ApiError> {
    let variations = data
        .anyvar
        .search_variations(&OverlapQuery {
            accession: query.accession.clone(),
            start: query.start,
            end: query.end,
        })?
        .iter()
        .map(|object| object.to_vrs_json())
        .collect();
    Ok(Json(SearchResponse { variations }))
}
