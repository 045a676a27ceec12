//! Error types for `nivaran-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("category {0:?} is not active")]
  CategoryInactive(String),

  #[error("grievance not found: {0}")]
  GrievanceNotFound(String),

  #[error("{0} is already registered")]
  Conflict(String),

  #[error("one-time code is invalid or expired")]
  InvalidOrExpiredOtp,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
