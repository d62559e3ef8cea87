//! `PUT /vcf` and `GET /vcf/{run_id}` (spec.md §4.9, §6.1): bulk-VCF
//! ingestion, synchronous by default, or dispatched to the async queue
//! when `enable_async` is set and an async work directory is configured.

use actix_web::{get, http::header, put, web::Data, web::Json, web::Path, HttpResponse, Responder};

use crate::error::Error;
use crate::queue::{self, Broker, RunStatus, Task};
use crate::storage::WriteMode;
use crate::vcf;

use super::error::ApiError;
use super::AppState;

#[derive(serde::Deserialize, Debug, Clone, utoipa::ToSchema)]
pub struct PutVcfRequest {
    /// Path to the input VCF file, readable by this process.
    pub input_path: String,
    /// Path the annotated output VCF should be written to.
    pub output_path: String,
    /// Dispatch to the async queue instead of blocking the request.
    #[serde(default)]
    pub enable_async: bool,
    /// Caller-supplied run id for the async path; a UUID is generated if
    /// omitted.
    pub run_id: Option<String>,
}

#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct VcfSyncResponse {
    pub records_read: u64,
    pub alleles_translated: u64,
    pub translation_failures: u64,
}

#[derive(serde::Serialize, Debug, Clone, utoipa::ToSchema)]
pub struct VcfAsyncResponse {
    pub run_id: String,
}

/// Ingest a VCF file (spec.md §4.8), synchronously or as a queued async
/// run depending on `enable_async` (spec.md §4.9).
#[utoipa::path(
    put,
    path = "/vcf",
    request_body = PutVcfRequest,
    responses(
        (status = 200, description = "ingested synchronously", body = VcfSyncResponse),
        (status = 202, description = "accepted for async ingestion", body = VcfAsyncResponse),
        (status = 409, description = "run id already in use"),
        (status = 400, description = "async requested but not configured"),
    )
)]
#[put("/vcf")]
pub async fn put_vcf(
    data: Data<AppState>,
    body: Json<PutVcfRequest>,
) -> actix_web::Result<impl Responder, ApiError> {
    let body = body.into_inner();

    if !body.enable_async {
        let anyvar = data.anyvar.clone();
        let input_path = body.input_path.clone();
        let output_path = body.output_path.clone();
        let stats = actix_web::web::block(move || {
            vcf::ingest(&anyvar, &input_path, &output_path, WriteMode::Merge)
        })
        .await
        .map_err(|e| ApiError(Error::Other(anyhow::anyhow!(e))))??;
        return Ok(HttpResponse::Ok().json(VcfSyncResponse {
            records_read: stats.records_read,
            alleles_translated: stats.alleles_translated,
            translation_failures: stats.translation_failures,
        }));
    }

    let broker = data.broker.as_ref().ok_or_else(|| {
        ApiError(Error::Other(anyhow::anyhow!(
            "async ingestion is not configured on this deployment"
        )))
    })?;

    let run_id = body.run_id.unwrap_or_else(queue::generate_run_id);
    let run = queue::Run::new(
        run_id.clone(),
        body.input_path.clone(),
        body.output_path.clone(),
        queue::DEFAULT_RUN_TTL,
    );
    data.results.create(run)?;
    broker.submit(Task {
        run_id: run_id.clone(),
        input_path: body.input_path,
        output_path: body.output_path,
    })?;

    Ok(HttpResponse::Accepted().json(VcfAsyncResponse { run_id }))
}

/// Poll the status of a previously-submitted async run. A completed run
/// returns the annotated VCF itself, not a status wrapper.
#[utoipa::path(
    get,
    path = "/vcf/{run_id}",
    responses(
        (status = 200, description = "run completed; body is the annotated VCF"),
        (status = 202, description = "run pending or running"),
        (status = 404, description = "unknown or expired run"),
    )
)]
#[get("/vcf/{run_id}")]
pub async fn get_vcf_run(
    data: Data<AppState>,
    path: Path<String>,
) -> actix_web::Result<impl Responder, ApiError> {
    let run_id = path.into_inner();
    let run = data
        .results
        .get(&run_id)
        .ok_or_else(|| ApiError(Error::RunUnknown(run_id.clone())))?;

    Ok(match run.status {
        RunStatus::Pending | RunStatus::Running => HttpResponse::Accepted()
            .insert_header((header::RETRY_AFTER, data.retry_after_secs.to_string()))
            .json(VcfAsyncResponse { run_id }),
        RunStatus::Completed => {
            let output_path = run.output_path.clone();
            let body = actix_web::web::block(move || std::fs::read(&output_path))
                .await
                .map_err(|e| ApiError(Error::Other(anyhow::anyhow!(e))))?
                .map_err(Error::Io)?;
            HttpResponse::Ok()
                .content_type("text/x-vcf")
                .body(body)
        }
        RunStatus::Failed => {
            let status = actix_web::http::StatusCode::from_u16(data.run_failure_status_code)
                .unwrap_or(actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
            HttpResponse::build(status).json(serde_json::json!({
                "run_id": run_id,
                "error": run.error_message.unwrap_or_default(),
            }))
        }
        RunStatus::Expired => return Err(ApiError(Error::RunUnknown(run_id))),
    })
}
