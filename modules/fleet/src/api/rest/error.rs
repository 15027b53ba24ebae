//! RFC 9457 problem responses for domain errors.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Serialize, Serializer};

use crate::domain::error::DomainError;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

#[allow(clippy::trivially_copy_pass_by_ref)] // serde requires &T signature
fn serialize_status_code<S>(status: &StatusCode, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u16(status.as_u16())
}

/// RFC 9457 Problem Details body.
///
/// The body never names the requested id, so a hidden resource and a missing
/// one produce byte-identical responses.
#[derive(Debug, Clone, Serialize)]
#[must_use]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_url: String,
    pub title: String,
    #[serde(serialize_with = "serialize_status_code")]
    pub status: StatusCode,
    pub detail: String,
    pub code: String,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_owned(),
            title: title.into(),
            status,
            detail: detail.into(),
            code: String::new(),
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.type_url = format!("urn:botfleet:problem:{code}");
        self.code = code.to_owned();
        self
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = self.status;
        let mut resp = axum::Json(self).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp
    }
}

/// Map domain error to an RFC 9457 Problem
pub fn domain_error_to_problem(e: &DomainError) -> Problem {
    match e {
        DomainError::NotFound { .. } => Problem::new(
            StatusCode::NOT_FOUND,
            "Not Found",
            "The requested resource was not found",
        )
        .with_code("not_found"),
        DomainError::Validation { .. } => {
            Problem::new(StatusCode::UNPROCESSABLE_ENTITY, "Validation Failed", e.to_string())
                .with_code("validation")
        }
        DomainError::Conflict { message } => {
            Problem::new(StatusCode::CONFLICT, "Conflict", message.clone()).with_code("conflict")
        }
        DomainError::Forbidden { .. } => Problem::new(
            StatusCode::FORBIDDEN,
            "Forbidden",
            "The operation is not permitted",
        )
        .with_code("forbidden"),
        DomainError::Database { .. } => {
            // Internal detail stays in the logs.
            tracing::error!(error = %e, "Database error occurred");
            Problem::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error",
                "An internal database error occurred",
            )
            .with_code("internal")
        }
    }
}

impl From<DomainError> for Problem {
    fn from(e: DomainError) -> Self {
        domain_error_to_problem(&e)
    }
}

pub type ApiResult<T> = Result<T, Problem>;
