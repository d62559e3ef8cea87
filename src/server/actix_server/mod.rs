//! Implementation of the actix server (spec.md §6.1).

pub mod error;
pub mod search;
pub mod service_info;
pub mod variation;
pub mod vcf;

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use utoipa::OpenApi as _;

use crate::anyvar::AnyVar;
use crate::queue::{ChannelBroker, InMemoryResultBackend};

use super::Args;

/// Shared state handed to every handler.
pub struct AppState {
    pub anyvar: Arc<AnyVar>,
    /// `None` when this deployment has no `async_work_dir` configured;
    /// `PUT /vcf` with `enable_async=true` is then rejected.
    pub broker: Option<Arc<ChannelBroker>>,
    pub results: InMemoryResultBackend,
    pub async_work_dir: Option<PathBuf>,
    /// Status code `GET /vcf/{run_id}` returns for a `FAILED` run
    /// (spec.md §6.3, configurable per deployment).
    pub run_failure_status_code: u16,
    /// Advisory `Retry-After` seconds for a `PENDING`/`RUNNING` poll.
    pub retry_after_secs: u64,
}

/// Utoipa-based `OpenAPI` generation helper.
#[derive(utoipa::OpenApi)]
#[openapi(
    paths(
        variation::put_variation,
        variation::get_variation,
        variation::put_mapping,
        variation::get_mappings,
        variation::post_annotation,
        variation::get_annotations,
        search::search,
        vcf::put_vcf,
        vcf::get_vcf_run,
        service_info::service_info,
    ),
    components(schemas(
        variation::PutVariationRequest,
        variation::MergeStrategyParam,
        variation::PutVariationResponse,
        search::SearchResponse,
        vcf::PutVcfRequest,
        vcf::VcfSyncResponse,
        vcf::VcfAsyncResponse,
        service_info::ServiceInfo,
        service_info::ServiceType,
        crate::vrs::VrsObject,
        crate::vrs::Allele,
        crate::vrs::AlleleState,
        crate::vrs::SequenceLocation,
        crate::vrs::SequenceReference,
        crate::vrs::CopyNumberChange,
        crate::vrs::CopyNumberCount,
        crate::vrs::mapping::VariationMapping,
        crate::vrs::annotation::Annotation,
    ))
)]
pub struct ApiDoc;

/// Main entry point for the actix server.
///
/// # Errors
///
/// If the server cannot be started.
#[actix_web::main]
pub async fn main(args: &Args, state: Data<AppState>) -> std::io::Result<()> {
    let openapi = ApiDoc::openapi();

    HttpServer::new(move || {
        let app = App::new()
            .app_data(state.clone())
            .service(variation::put_variation)
            .service(variation::get_variation)
            .service(variation::put_mapping)
            .service(variation::get_mappings)
            .service(variation::post_annotation)
            .service(variation::get_annotations)
            .service(search::search)
            .service(vcf::put_vcf)
            .service(vcf::get_vcf_run)
            .service(service_info::service_info)
            .service(
                utoipa_swagger_ui::SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            );
        app.wrap(Logger::default())
    })
    .bind((args.listen_host.as_str(), args.listen_port))?
    .run()
    .await
}
