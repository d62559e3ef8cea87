//! Code for `/variation` and its mappings/annotations sub-resources
//! (spec.md §6.1).

use actix_web::{
    get, put,
    web::{self, Data, Json, Path},
    Responder,
};

use crate::storage::WriteMode;

use super::error::ApiError;
use super::AppState;

/// Request body for `PUT /variation`.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct PutVariationRequest {
    /// A variant definition string in HGVS, SPDI, or gnomAD/VCF nomenclature.
    pub definition: String,
    /// Write-conflict behavior; defaults to unconditional overwrite.
    #[serde(default)]
    pub merge_strategy: MergeStrategyParam,
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, Default, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategyParam {
    #[default]
    Merge,
    InsertNotin,
    Insert,
}

impl From<MergeStrategyParam> for WriteMode {
    fn from(value: MergeStrategyParam) -> Self {
        match value {
            MergeStrategyParam::Merge => WriteMode::Merge,
            MergeStrategyParam::InsertNotin => WriteMode::InsertIfAbsent,
            MergeStrategyParam::Insert => WriteMode::InsertStrict,
        }
    }
}

#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct PutVariationResponse {
    pub id: String,
}

/// Translate and register a variant.
#[utoipa::path(
    put,
    path = "/variation",
    request_body = PutVariationRequest,
    responses(
        (status = 200, description = "registered", body = PutVariationResponse),
        (status = 400, description = "translation error"),
    )
)]
#[put("/variation")]
pub async fn put_variation(
    data: Data<AppState>,
    body: Json<PutVariationRequest>,
) -> actix_web::Result<impl Responder, ApiError> {
    let id = data
        .anyvar
        .put_variation(&body.definition, body.merge_strategy.into())?;
    Ok(Json(PutVariationResponse { id }))
}

/// Dereference a previously registered VRS object by id. The response
/// body follows the GA4GH VRS 2.x schema verbatim (a `type` discriminator
/// and fully nested sub-objects), not the internal storage representation.
#[utoipa::path(
    get,
    path = "/variation/{id}",
    responses(
        (status = 200, description = "the VRS object, GA4GH VRS 2.x JSON"),
        (status = 404, description = "unknown id"),
    )
)]
#[get("/variation/{id}")]
pub async fn get_variation(
    data: Data<AppState>,
    path: Path<String>,
) -> actix_web::Result<impl Responder, ApiError> {
    let object = data.anyvar.get_object(&path.into_inner())?;
    Ok(Json(object.to_vrs_json()))
}

#[derive(serde::Deserialize, Debug, Clone, utoipa::IntoParams)]
pub struct PutMappingRequest {
    pub dest_id: String,
    pub mapping_type: String,
}

/// Record a mapping from `id` to another object id.
#[utoipa::path(
    put,
    path = "/variation/{id}/mappings",
    responses((status = 200, description = "recorded")),
)]
#[put("/variation/{id}/mappings")]
pub async fn put_mapping(
    data: Data<AppState>,
    path: Path<String>,
    body: Json<PutMappingRequest>,
) -> actix_web::Result<impl Responder, ApiError> {
    data.anyvar
        .put_mapping(&path.into_inner(), &body.dest_id, &body.mapping_type)?;
    Ok(HttpOk)
}

/// List mappings recorded for `id`, optionally filtered by `mapping_type`.
#[utoipa::path(
    get,
    path = "/variation/{id}/mappings/{mapping_type}",
    responses((status = 200, description = "mappings")),
)]
#[get("/variation/{id}/mappings/{mapping_type}")]
pub async fn get_mappings(
    data: Data<AppState>,
    path: Path<(String, String)>,
) -> actix_web::Result<impl Responder, ApiError> {
    let (id, mapping_type) = path.into_inner();
    let mappings = data.anyvar.get_object_mappings(&id, Some(&mapping_type))?;
    Ok(Json(mappings))
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct PostAnnotationRequest {
    pub annotation_type: String,
    pub value: serde_json::Value,
}

/// Attach an opaque annotation to `id`.
#[utoipa::path(
    post,
    path = "/variation/{id}/annotations",
    responses((status = 200, description = "recorded")),
)]
#[actix_web::post("/variation/{id}/annotations")]
pub async fn post_annotation(
    data: Data<AppState>,
    path: Path<String>,
    body: Json<PostAnnotationRequest>,
) -> actix_web::Result<impl Responder, ApiError> {
    data.anyvar
        .put_annotation(&path.into_inner(), &body.annotation_type, body.value.clone())?;
    Ok(HttpOk)
}

/// List annotations recorded against `id`, optionally filtered by type.
#[utoipa::path(
    get,
    path = "/variation/{id}/annotations",
    responses((status = 200, description = "annotations")),
)]
#[get("/variation/{id}/annotations")]
pub async fn get_annotations(
    data: Data<AppState>,
    path: Path<String>,
    query: web::Query<std::collections::HashMap<String, String>>,
) -> actix_web::Result<impl Responder, ApiError> {
    let annotation_type = query.get("annotation_type").map(String::as_str);
    let annotations = data
        .anyvar
        .get_object_annotations(&path.into_inner(), annotation_type)?;
    Ok(Json(annotations))
}

/// A bare `200 OK` with no body, for write endpoints whose result is
/// simply "accepted" (spec.md §6.1 representative subset does not spell
/// out a response body for mapping/annotation writes).
struct HttpOk;

impl Responder for HttpOk {
    type Body = actix_web::body::BoxBody;

    fn respond_to(self, _req: &actix_web::HttpRequest) -> actix_web::HttpResponse<Self::Body> {
        actix_web::HttpResponse::Ok().finish()
    }
}
