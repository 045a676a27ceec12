//! API error taxonomy and [`axum::response::IntoResponse`] implementation.
//!
//! Every handler returns `Result<_, ApiError>`; store errors convert via
//! `From`, so `?` works end to end. 4xx responses carry the message (and a
//! field list for validation failures); 5xx responses carry a generic
//! message and the cause is logged server-side.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use nivaran_core::Error as CoreError;
use nivaran_store_sqlite::Error as StoreError;

/// One failed field in a validation error.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
  pub field:   String,
  pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed")]
  Validation(Vec<FieldError>),

  #[error("{0}")]
  Unauthorized(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  /// A required external collaborator (file storage) failed. Notification
  /// channel failures never produce this — they are logged and swallowed.
  #[error("{0}")]
  ExternalService(String),

  #[error("internal error")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// A single-field validation failure.
  pub fn validation(field: &str, message: impl Into<String>) -> Self {
    ApiError::Validation(vec![FieldError {
      field:   field.to_string(),
      message: message.into(),
    }])
  }

  pub fn unauthorized() -> Self {
    ApiError::Unauthorized("authentication required".to_string())
  }

  pub fn forbidden() -> Self {
    ApiError::Forbidden("you do not have access to this resource".to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::Validation(fields) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "validation failed", "fields": fields })),
      )
        .into_response(),
      ApiError::Unauthorized(m) => (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "error": m })),
      )
        .into_response(),
      ApiError::Forbidden(m) => {
        (StatusCode::FORBIDDEN, Json(json!({ "error": m }))).into_response()
      }
      ApiError::NotFound(m) => {
        (StatusCode::NOT_FOUND, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Conflict(m) => {
        (StatusCode::CONFLICT, Json(json!({ "error": m }))).into_response()
      }
      ApiError::ExternalService(m) => {
        tracing::error!(error = %m, "external service failure");
        (
          StatusCode::BAD_GATEWAY,
          Json(json!({ "error": "an upstream service failed" })),
        )
          .into_response()
      }
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "internal error");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": "internal error" })),
        )
          .into_response()
      }
    }
  }
}

impl From<StoreError> for ApiError {
  fn from(e: StoreError) -> Self {
    match e {
      StoreError::Core(CoreError::Validation(m)) => {
        ApiError::validation("body", m)
      }
      StoreError::Core(core @ CoreError::Conflict(_)) => {
        ApiError::Conflict(core.to_string())
      }
      StoreError::Core(core @ CoreError::CategoryInactive(_)) => {
        ApiError::validation("category_id", core.to_string())
      }
      StoreError::Core(CoreError::InvalidOrExpiredOtp) => {
        ApiError::Unauthorized("invalid or expired code".to_string())
      }
      StoreError::Core(CoreError::AccountNotFound(id))
      | StoreError::AccountNotFound(id) => {
        ApiError::NotFound(format!("account {id} not found"))
      }
      StoreError::Core(CoreError::CategoryNotFound(id))
      | StoreError::CategoryNotFound(id) => {
        ApiError::NotFound(format!("category {id} not found"))
      }
      StoreError::Core(CoreError::GrievanceNotFound(id))
      | StoreError::GrievanceNotFound(id) => {
        ApiError::NotFound(format!("grievance {id} not found"))
      }
      StoreError::NotificationNotFound(id) => {
        ApiError::NotFound(format!("notification {id} not found"))
      }
      other => ApiError::Internal(Box::new(other)),
    }
  }
}
