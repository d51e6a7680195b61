use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;

/// Custom error types for business logic validation and application errors
#[derive(Debug, Clone, Error)]
pub enum BusinessError {
    /// Validation errors for user input (400 Bad Request)
    #[error("Validation error in field '{field}': {message}")]
    ValidationError { field: String, message: String },
    /// Business rule violations (400 Bad Request)
    #[error("Business rule '{rule}' violated: {message}")]
    BusinessRuleViolation { rule: String, message: String },
    /// Resource not found (404 Not Found)
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: String },
    /// Duplicate resource (400 Bad Request)
    #[error("{resource} with this {field} already exists")]
    Duplicate { resource: String, field: String },
    /// Missing or unusable caller identity (401 Unauthorized)
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },
    /// Permission denied (403 Forbidden)
    #[error("Not authorized to {action} {resource}")]
    Forbidden { action: String, resource: String },
    /// External service errors (502 Bad Gateway)
    #[error("External service '{service}' error: {message}")]
    ExternalServiceError { service: String, message: String },
    /// Generic application error (500 Internal Server Error)
    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl BusinessError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BusinessError::ValidationError { .. }
            | BusinessError::BusinessRuleViolation { .. }
            | BusinessError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            BusinessError::NotFound { .. } => StatusCode::NOT_FOUND,
            BusinessError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            BusinessError::Forbidden { .. } => StatusCode::FORBIDDEN,
            BusinessError::ExternalServiceError { .. } => StatusCode::BAD_GATEWAY,
            BusinessError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            BusinessError::ValidationError { .. } => "VALIDATION_ERROR",
            BusinessError::BusinessRuleViolation { .. } => "BUSINESS_RULE_VIOLATION",
            BusinessError::NotFound { .. } => "RESOURCE_NOT_FOUND",
            BusinessError::Duplicate { .. } => "DUPLICATE_RESOURCE",
            BusinessError::Unauthorized { .. } => "UNAUTHORIZED",
            BusinessError::Forbidden { .. } => "FORBIDDEN",
            BusinessError::ExternalServiceError { .. } => "EXTERNAL_SERVICE_ERROR",
            BusinessError::InternalError { .. } => "INTERNAL_ERROR",
        }
    }

    /// Message shown to API clients. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            BusinessError::ValidationError { field, message } => {
                format!("Validation failed for field '{field}': {message}")
            }
            BusinessError::BusinessRuleViolation { message, .. }
            | BusinessError::Unauthorized { message } => message.clone(),
            BusinessError::InternalError { message } => {
                tracing::error!("Internal error: {message}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Convert `BusinessError` to HTTP responses
impl IntoResponse for BusinessError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "success": false,
            "code": self.error_code(),
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

impl From<JsonRejection> for BusinessError {
    fn from(rejection: JsonRejection) -> Self {
        BusinessError::ValidationError {
            field: "body".to_string(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for BusinessError {
    fn from(rejection: QueryRejection) -> Self {
        BusinessError::ValidationError {
            field: "query".to_string(),
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for BusinessError {
    fn from(rejection: PathRejection) -> Self {
        BusinessError::ValidationError {
            field: "path".to_string(),
            message: rejection.body_text(),
        }
    }
}

/// Maps database errors onto the business error taxonomy
pub struct ErrorMapper;

impl ErrorMapper {
    pub fn map_db_error(err: DbErr, context: &str) -> BusinessError {
        match err {
            DbErr::RecordNotFound(msg) => BusinessError::NotFound {
                resource: Self::extract_resource_from_context(context),
                id: Self::extract_id_from_message(&msg),
            },
            DbErr::Conn(conn_err) => BusinessError::ExternalServiceError {
                service: "database".to_string(),
                message: conn_err.to_string(),
            },
            DbErr::Exec(exec_err) => {
                let err_msg = exec_err.to_string();
                if err_msg.contains("UNIQUE constraint") || err_msg.contains("duplicate key") {
                    BusinessError::Duplicate {
                        resource: Self::extract_resource_from_context(context),
                        field: Self::extract_field_from_constraint(&err_msg),
                    }
                } else {
                    BusinessError::InternalError { message: err_msg }
                }
            }
            _ => BusinessError::InternalError {
                message: format!("{context}: {err}"),
            },
        }
    }

    fn extract_resource_from_context(context: &str) -> String {
        context.replace('_', " ")
    }

    fn extract_id_from_message(msg: &str) -> String {
        // Look for patterns like "id 'value'"
        if let Some(start_pos) = msg.find(" id '") {
            let after_id = &msg[start_pos + 5..];
            if let Some(end_pos) = after_id.find('\'') {
                return after_id[..end_pos].to_string();
            }
        }
        "unknown".to_string()
    }

    fn extract_field_from_constraint(msg: &str) -> String {
        if msg.contains("unique_id") {
            "unique_id".to_string()
        } else if msg.contains("name") {
            "name".to_string()
        } else {
            "field".to_string()
        }
    }
}

/// Convenience macros for creating business errors
#[macro_export]
macro_rules! validation_error {
    ($field:expr, $message:expr) => {
        $crate::common::errors::BusinessError::ValidationError {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! business_rule_violation {
    ($rule:expr, $message:expr) => {
        $crate::common::errors::BusinessError::BusinessRuleViolation {
            rule: $rule.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::BusinessError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

#[macro_export]
macro_rules! duplicate_resource {
    ($resource:expr, $field:expr) => {
        $crate::common::errors::BusinessError::Duplicate {
            resource: $resource.to_string(),
            field: $field.to_string(),
        }
    };
}

#[macro_export]
macro_rules! forbidden {
    ($action:expr, $resource:expr) => {
        $crate::common::errors::BusinessError::Forbidden {
            action: $action.to_string(),
            resource: $resource.to_string(),
        }
    };
}

/// Extension trait to add business error conversion to `DbErr`
pub trait DbErrorExt {
    fn to_business_error(self, context: &str) -> BusinessError;
}

impl DbErrorExt for DbErr {
    fn to_business_error(self, context: &str) -> BusinessError {
        ErrorMapper::map_db_error(self, context)
    }
}

/// Result type alias for business operations
pub type BusinessResult<T> = Result<T, BusinessError>;
