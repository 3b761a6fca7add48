use crate::database::StoreError;

use actix_web::error::BlockingError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use std::collections::BTreeMap;

/// Field name to the list of messages for that field.
#[derive(Serialize, Debug, Default, Clone, PartialEq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> FieldErrors {
        FieldErrors::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.0.get(field)
    }
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("The given data was invalid.")]
    Validation(FieldErrors),

    #[error("Unauthenticated.")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("{0}")]
    NotImplemented(&'static str),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("upload failed: {0}")]
    Upload(#[from] std::io::Error),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("blocking task was cancelled")]
    Blocking(#[from] BlockingError),

    #[error("server misconfigured: {0}")]
    Misconfigured(&'static str),
}

impl From<FieldErrors> for ServiceError {
    fn from(errors: FieldErrors) -> Self {
        ServiceError::Validation(errors)
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Unauthenticated | ServiceError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            ServiceError::Store(_)
            | ServiceError::Upload(_)
            | ServiceError::Hashing(_)
            | ServiceError::Blocking(_)
            | ServiceError::Misconfigured(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED {
            error!("[main] request failed: {}", self);
            String::from("Server error")
        } else {
            self.to_string()
        };

        let errors = match self {
            ServiceError::Validation(errors) => Some(errors),
            _ => None,
        };

        HttpResponse::build(status).json(ErrorBody {
            status: "error",
            message,
            errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_group_by_field() {
        let mut errors = FieldErrors::new();
        errors.add("price", "The price field is required.");
        errors.add("price", "The price field must be an integer.");
        errors.add("name", "The name field is required.");

        assert_eq!(errors.get("price").map(Vec::len), Some(2));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["name"][0], "The name field is required.");
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            ServiceError::Validation(FieldErrors::new()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ServiceError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ServiceError::Forbidden("no").status_code(), StatusCode::FORBIDDEN);
        assert_eq!(ServiceError::NotFound("gone").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Store(StoreError::Corrupt(String::from("x"))).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let response =
            ServiceError::Store(StoreError::Corrupt(String::from("secret detail"))).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
