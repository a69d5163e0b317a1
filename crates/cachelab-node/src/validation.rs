//! Input validation for update requests.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use validator::{ValidationError, ValidationErrors};

/// Maximum accepted resource content length in bytes.
pub const MAX_CONTENT_LENGTH: usize = 65536;

/// Maximum accepted request body size in bytes.
pub const MAX_BODY_BYTES: usize = 2 * MAX_CONTENT_LENGTH;

/// Validation error response.
#[derive(Debug, Serialize)]
pub struct ValidationErrorResponse {
    /// Error type.
    pub error: String,
    /// Human-readable message.
    pub message: String,
    /// Field-level error details.
    pub details: Vec<FieldError>,
}

/// Field-level validation error.
#[derive(Debug, Serialize)]
pub struct FieldError {
    /// Field name.
    pub field: String,
    /// Error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (StatusCode::UNPROCESSABLE_ENTITY, Json(self)).into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(errors: ValidationErrors) -> Self {
        let details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| FieldError {
                    field: field.to_string(),
                    code: e.code.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Validation failed for field '{}'", field)),
                })
            })
            .collect();

        ValidationErrorResponse {
            error: "validation_error".to_string(),
            message: "Validation failed".to_string(),
            details,
        }
    }
}

/// Validate replacement content for the resource.
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.len() > MAX_CONTENT_LENGTH {
        let mut err = ValidationError::new("length");
        err.message = Some(format!("Content must be at most {MAX_CONTENT_LENGTH} bytes").into());
        return Err(err);
    }

    if content.contains('\0') {
        let mut err = ValidationError::new("security");
        err.message = Some("Content cannot contain null bytes".into());
        return Err(err);
    }

    Ok(())
}

/// Validate the optional `content` field of an update request.
pub fn validate_update(content: Option<&str>) -> Result<(), ValidationErrors> {
    let Some(content) = content else {
        return Ok(());
    };
    validate_content(content).map_err(|err| {
        let mut errors = ValidationErrors::new();
        errors.add("content", err);
        errors
    })
}
