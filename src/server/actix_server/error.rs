//! Errors for the Actix server (spec.md §7: propagation is per-request,
//! mapped to the status codes spec.md §6.1 names).

use actix_web::{http::StatusCode, HttpResponse, ResponseError};

use crate::error::Error;

/// Wraps a crate `Error` so it can be returned directly from a handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            Error::Translation(_)
            | Error::UnknownNomenclature(_)
            | Error::RangeOutOfBounds(..) => StatusCode::BAD_REQUEST,
            Error::UnknownAccession(_) | Error::UnresolvedAlias(_) => StatusCode::BAD_REQUEST,
            Error::BadRange(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) | Error::RunUnknown(_) => StatusCode::NOT_FOUND,
            Error::RunIdConflict(_) | Error::StorageConflict(_) => StatusCode::CONFLICT,
            Error::Unavailable(_) | Error::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::RunFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::BackpressureTimeout(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::BatchAborted(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Io(_)
            | Error::RocksDb(_)
            | Error::Json(_)
            | Error::Vcf(_)
            | Error::Csv(_)
            | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.0.to_string(),
        }))
    }
}
