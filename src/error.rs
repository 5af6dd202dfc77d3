use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

use crate::leave::attachment::AttachmentError;
use crate::leave::validation::{SubmissionError, ValidationError};
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Attachment(#[from] AttachmentError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("Internal Server Error")]
    Store(#[from] StoreError),

    #[error("Internal Server Error")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Submission(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Attachment(AttachmentError::TimedOut(_)) => StatusCode::REQUEST_TIMEOUT,
            ApiError::Attachment(AttachmentError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Attachment(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(ValidationError::IncompleteFields { missing }) => json!({
                "message": self.to_string(),
                "error": "incomplete_fields",
                "missing": missing,
            }),
            ApiError::Validation(ValidationError::InvalidDateRange { start, end }) => json!({
                "message": self.to_string(),
                "error": "invalid_date_range",
                "start_date": start,
                "end_date": end,
            }),
            ApiError::Submission(SubmissionError::OverBalanceNotConfirmed {
                requested_days,
                available,
            }) => json!({
                "message": format!("{self}. Resubmit with confirm_over_balance to proceed."),
                "error": "over_balance",
                "requested_days": requested_days,
                "available": available,
            }),
            ApiError::Store(e) => {
                tracing::error!(error = %e, "Store operation failed");
                json!({ "message": self.to_string() })
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %e, "Request failed");
                json!({ "message": self.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}
