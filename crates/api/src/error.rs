use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("validation error")]
    Validation {
        developer_message: Option<String>,
        fields: Vec<FieldError>,
    },
    #[error("user not found")]
    UserNotFound,
    #[error("category not found")]
    CategoryNotFound,
    #[error("system error")]
    Internal,
}

impl ApiError {
    pub fn validation(developer_message: impl Into<String>) -> Self {
        ApiError::Validation {
            developer_message: Some(developer_message.into()),
            fields: Vec::new(),
        }
    }

    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation {
            developer_message: None,
            fields: vec![FieldError {
                field: field.into(),
                message: message.into(),
            }],
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::UserNotFound | ApiError::CategoryNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "CS-00010",
            ApiError::CategoryNotFound => "CS-00008",
            ApiError::UserNotFound => "CS-00009",
            ApiError::Internal => "CS-00001",
        }
    }

    fn developer_message(&self) -> Option<String> {
        match self {
            ApiError::Validation {
                developer_message, ..
            } => developer_message.clone(),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
    developer_message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorEnvelope {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                developer_message: self.developer_message(),
                fields: match self {
                    ApiError::Validation { fields, .. } => fields,
                    _ => Vec::new(),
                },
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_and_statuses_are_stable() {
        let cases = [
            (ApiError::validation("bad"), StatusCode::BAD_REQUEST, "CS-00010"),
            (ApiError::UserNotFound, StatusCode::NOT_FOUND, "CS-00009"),
            (ApiError::CategoryNotFound, StatusCode::NOT_FOUND, "CS-00008"),
            (
                ApiError::Internal,
                StatusCode::INTERNAL_SERVER_ERROR,
                "CS-00001",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status);
            assert_eq!(err.error_code(), code);
        }
    }

    #[test]
    fn internal_error_has_no_developer_message() {
        assert_eq!(ApiError::Internal.developer_message(), None);
        assert_eq!(ApiError::Internal.to_string(), "system error");
    }
}
