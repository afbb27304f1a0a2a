use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

use crate::db::repository::StoreError;
use crate::services::itinerary_generation_service::PipelineError;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Errors returned by route handlers.
///
/// Only validation failures carry detail back to the client; storage and
/// internal errors are logged and answered with a generic message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("The given data was invalid.")]
    Validation(FieldErrors),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Upstream(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ApiError::Validation(errors)
    }

    pub fn not_found(what: &str) -> Self {
        ApiError::NotFound(format!("{} not found", what))
    }
}

fn flatten_errors(prefix: &str, errors: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    // Struct level checks are reported under their error code.
                    let key = if field == "__all__" {
                        err.code.to_string()
                    } else {
                        field.clone()
                    };
                    let key = if prefix.is_empty() {
                        key
                    } else {
                        format!("{}.{}", prefix, key)
                    };
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("The {} field is invalid.", key));
                    out.entry(key).or_default().push(message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                let key = join(prefix, &field);
                flatten_errors(&key, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    let key = format!("{}.{}", join(prefix, &field), index);
                    flatten_errors(&key, nested, out);
                }
            }
        }
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        flatten_errors("", &errors, &mut out);
        ApiError::Validation(out)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        ApiError::Internal(format!("token error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing failed: {}", err))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            ApiError::Validation(errors) => HttpResponse::build(status).json(json!({
                "message": self.to_string(),
                "errors": errors,
            })),
            ApiError::Store(_) | ApiError::Internal(_) => {
                log::error!("Request failed: {}", self);
                HttpResponse::build(status).json(json!({ "message": "Server Error" }))
            }
            _ => HttpResponse::build(status).json(json!({ "message": self.to_string() })),
        }
    }
}
