use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::io::IoError;
use crate::optimiser::OptimiserError;
use crate::runner::JobError;

/// Every failure a handler can surface, one variant per response kind.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Input file not found: {0}")]
    InputFileMissing(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Workbook format error: {0}")]
    WorkbookFormat(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid battery parameter: {0}")]
    InvalidParameter(String),

    #[error("Price series misaligned: {0}")]
    DataAlignment(String),

    #[error("Optimisation model is infeasible")]
    ModelInfeasible,

    #[error("Optimisation model is unbounded")]
    ModelUnbounded,

    #[error("Solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("Solve timed out with no feasible solution")]
    SolveTimedOut,

    #[error("Internal server error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InputFileMissing(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::WorkbookFormat(_) | ApiError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::InvalidParameter(_)
            | ApiError::DataAlignment(_)
            | ApiError::ModelInfeasible
            | ApiError::ModelUnbounded => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::SolverUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::SolveTimedOut => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InputFileMissing(_) => "InputFileMissing",
            ApiError::BadRequest(_) => "BadRequest",
            ApiError::WorkbookFormat(_) => "WorkbookFormat",
            ApiError::Validation(_) => "ValidationError",
            ApiError::InvalidParameter(_) => "InvalidParameter",
            ApiError::DataAlignment(_) => "DataAlignment",
            ApiError::ModelInfeasible => "ModelInfeasible",
            ApiError::ModelUnbounded => "ModelUnbounded",
            ApiError::SolverUnavailable(_) => "SolverUnavailable",
            ApiError::SolveTimedOut => "SolveTimedOut",
            ApiError::Internal(_) => "InternalServerError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = self.error_type();

        let message = match &self {
            ApiError::Internal(_) => {
                tracing::error!(error = %self, "API error occurred");
                "An internal error occurred".to_string()
            }
            ApiError::SolverUnavailable(_) => {
                tracing::warn!(error = %self, "solver unavailable");
                self.to_string()
            }
            _ => {
                tracing::debug!(error = %self, "client-visible error");
                self.to_string()
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(error: JobError) -> Self {
        match error {
            JobError::Io(io) => io.into(),
            JobError::Optimiser(opt) => opt.into(),
        }
    }
}

impl From<IoError> for ApiError {
    fn from(error: IoError) -> Self {
        match &error {
            IoError::InputFileMissing(path) => {
                ApiError::InputFileMissing(path.display().to_string())
            }
            IoError::InvalidFileType { .. } | IoError::OutputPath { .. } => {
                ApiError::BadRequest(error.to_string())
            }
            IoError::WorkbookFormat { .. } => ApiError::WorkbookFormat(error.to_string()),
            IoError::Report { .. } => ApiError::Internal(error.to_string()),
        }
    }
}

impl From<OptimiserError> for ApiError {
    fn from(error: OptimiserError) -> Self {
        match error {
            OptimiserError::DataAlignment(msg) => ApiError::DataAlignment(msg),
            OptimiserError::InvalidParameter(msg) => ApiError::InvalidParameter(msg),
            OptimiserError::Infeasible => ApiError::ModelInfeasible,
            OptimiserError::Unbounded => ApiError::ModelUnbounded,
            OptimiserError::SolverUnavailable(msg) => ApiError::SolverUnavailable(msg),
            OptimiserError::TimedOut => ApiError::SolveTimedOut,
            OptimiserError::Solver(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}
