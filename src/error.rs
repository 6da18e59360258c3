//! Error handler for userbase.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::ValidationErrors;

pub type Result<T> = std::result::Result<T, Error>;

const INVALID_ARGUMENT: &str = "invalid-argument";
const NOT_BOUND: &str = "not-bound";
const ALREADY_BOUND: &str = "already-bound";
const VALIDATION: &str = "validation";

/// Every failure a caller of the user store can observe.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("invalid update key: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Axum(#[from] JsonRejection),
}

/// Failures raised by the remote-call mechanism itself.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("remote call failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("name `{0}` is not bound in the directory")]
    NotBound(String),

    #[error("name `{0}` is already bound in the directory")]
    AlreadyBound(String),

    #[error("peer answered with status {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("store call aborted: {0}")]
    Aborted(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether this error comes from the transport rather than the application.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(TransportError::Http(err))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Transport(TransportError::Io(err))
    }
}

/// Structure for detailed error responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseError {
    r#type: Option<String>,
    title: String,
    status: u16,
    detail: String,
    instance: Option<String>,
    errors: Option<Vec<FieldError>>,
}

impl ResponseError {
    /// Update error status code.
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code.as_u16();
        self
    }

    /// Update `type` field.
    pub fn kind(mut self, kind: &str) -> Self {
        self.r#type = Some(kind.into());
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed error.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Identify the offending key or name.
    pub fn instance(mut self, instance: &str) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = Some(parse_validation_errors(errors));
        self
    }

    /// Transform [`ResponseError`] into axum [`Response`].
    pub fn into_response(self) -> std::result::Result<Response, axum::http::Error> {
        if let Ok(body) = serde_json::to_string(&self) {
            Response::builder()
                .status(self.status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
        } else {
            Ok(internal_server_error())
        }
    }

    /// Rebuild the caller-side error from a problem body sent by a peer.
    pub fn into_error(self) -> Error {
        let instance = self.instance.unwrap_or_default();

        match self.r#type.as_deref() {
            Some(INVALID_ARGUMENT) => Error::InvalidArgument(instance),
            Some(NOT_BOUND) => TransportError::NotBound(instance).into(),
            Some(ALREADY_BOUND) => TransportError::AlreadyBound(instance).into(),
            _ => TransportError::Status {
                status: self.status,
                detail: if self.detail.is_empty() {
                    self.title
                } else {
                    self.detail
                },
            }
            .into(),
        }
    }
}

impl Default for ResponseError {
    fn default() -> Self {
        Self {
            r#type: None,
            title: "Internal server error.".to_owned(),
            status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            detail: String::default(),
            instance: None,
            errors: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FieldError {
    field: String,
    message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect()
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let response = ResponseError::default()
            .title("There were validation errors with your request.")
            .details(&self.to_string())
            .status(StatusCode::BAD_REQUEST);

        let response = match &self {
            Error::Validation(validation_errors) => {
                response.kind(VALIDATION).errors(validation_errors)
            },

            Error::InvalidArgument(key) => response
                .kind(INVALID_ARGUMENT)
                .title("Unknown update key.")
                .instance(key),

            Error::Axum(rejection) => response
                .title("Malformed request body.")
                .details(&rejection.body_text())
                .status(rejection.status()),

            Error::Transport(TransportError::NotBound(name)) => response
                .kind(NOT_BOUND)
                .title("Name not bound.")
                .instance(name)
                .status(StatusCode::NOT_FOUND),

            Error::Transport(TransportError::AlreadyBound(name)) => response
                .kind(ALREADY_BOUND)
                .title("Name already bound.")
                .instance(name)
                .status(StatusCode::CONFLICT),

            Error::Transport(err) => {
                tracing::error!(error = %err, "server returned 500 status");

                ResponseError::default()
            },
        };

        response
            .into_response()
            .unwrap_or_else(|_| internal_server_error())
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({
                "type": null,
                "title": "Internal server error.",
                "status": StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                "detail": null,
                "instance": null,
                "errors": null,
            })
            .to_string()
            .into(),
        )
        .unwrap_or_else(|_| Response::new("Internal server error".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_survives_the_wire() {
        let body = ResponseError::default()
            .kind(INVALID_ARGUMENT)
            .instance("bogus")
            .status(StatusCode::BAD_REQUEST);
        let json = serde_json::to_string(&body).unwrap();
        let body: ResponseError = serde_json::from_str(&json).unwrap();

        match body.into_error() {
            Error::InvalidArgument(key) => assert_eq!(key, "bogus"),
            err => panic!("unexpected error: {err:?}"),
        }
    }

    #[test]
    fn test_unknown_problem_is_transport() {
        let body = ResponseError::default().details("boom");
        let err = body.into_error();

        assert!(err.is_transport());
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_not_bound_status() {
        let response =
            Error::from(TransportError::NotBound("UserManager".into())).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
