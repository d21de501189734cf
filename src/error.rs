use axum::extract::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::fmt::Debug;

#[derive(Debug)]
pub struct Error {
    pub code: i32,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn is_invalid_input_error(&self) -> bool {
        self.code == 101
    }

    pub fn is_unauthorized_error(&self) -> bool {
        self.code == 102
    }

    pub fn is_invalid_sort_field_error(&self) -> bool {
        self.code == 103
    }

    pub fn is_validation_error(&self) -> bool {
        self.code == 104
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        database_error(err)
    }
}

impl From<oso::OsoError> for Error {
    fn from(err: oso::OsoError) -> Self {
        authorizor_error(err)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_message) = match self.code {
            1..=99 => (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"),
            102 => (StatusCode::FORBIDDEN, self.message.as_str()),
            _ => (StatusCode::BAD_REQUEST, self.message.as_str()),
        };

        let body = Json(json!({
            "code": self.code,
            "error": error_message,
            "details": self.details,
        }));

        (status, body).into_response()
    }
}

pub fn invalid_invocation_error() -> Error {
    Error::new(100, "invalid invocation")
}

pub fn invalid_input_error() -> Error {
    Error::new(101, "invalid input")
}

pub fn unauthorized_error() -> Error {
    Error::new(102, "unauthorized")
}

pub fn invalid_sort_field_error(field: &str) -> Error {
    Error::new(103, format!("invalid sort field: {}", field))
}

/// Carries the per-field messages so callers can render them inline.
pub fn validation_error<T: Serialize>(violations: &T) -> Error {
    Error {
        details: serde_json::to_value(violations).ok(),
        ..Error::new(104, "validation failed")
    }
}

pub fn invalid_config_error(key: &str) -> Error {
    Error::new(105, format!("invalid configuration value for {}", key))
}

pub fn unimplemented_error() -> Error {
    Error::new(0, "unimplemented error")
}

pub fn missing_config_error(key: &str) -> Error {
    Error::new(1, format!("missing environment variable {}", key))
}

pub fn database_error<T: Debug>(err: T) -> Error {
    tracing::error!(?err, "database error");
    Error::new(2, "database error")
}

pub fn authorizor_error<T: Debug>(err: T) -> Error {
    tracing::error!(?err, "authorizor error");
    Error::new(3, "authorizor error")
}

pub fn server_error<T: Debug>(err: T) -> Error {
    tracing::error!(?err, "server error");
    Error::new(4, "server error")
}

pub fn unexpected_error() -> Error {
    Error::new(5, "unexpected error")
}

#[test]
fn validation_error_carries_details() {
    use std::collections::BTreeMap;

    let mut violations = BTreeMap::new();
    violations.insert("chat", "Minimum chat diagnostic price is $19");

    let err = validation_error(&violations);
    assert!(err.is_validation_error());
    assert_eq!(
        err.details,
        Some(json!({ "chat": "Minimum chat diagnostic price is $19" }))
    );
}

#[test]
fn internal_errors_hide_their_message() {
    let response = database_error("connection reset").into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let response = unauthorized_error().into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = invalid_sort_field_error("price").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
