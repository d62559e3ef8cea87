//! `GET /service-info` (spec.md §6.1): a small, static descriptor of this
//! deployment, modeled on the GA4GH service-info convention.

use actix_web::{get, web::Json, Responder};

#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub environment: String,
    pub version: String,
}

/// Describe this deployment.
#[utoipa::path(
    get,
    path = "/service-info",
    responses((status = 200, description = "service descriptor", body = ServiceInfo)),
)]
#[get("/service-info")]
pub async fn service_info() -> actix_web::Result<impl Responder> {
    Ok(Json(ServiceInfo {
        id: "org.ga4gh.anyvar".to_string(),
        name: "AnyVar".to_string(),
        service_type: ServiceType {
            group: "org.ga4gh".to_string(),
            artifact: "anyvar".to_string(),
            version: "1.0.0".to_string(),
        },
        environment: std::env::var("ANYVAR_ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()),
        version: crate::common::version().to_string(),
    }))
}
