//! Error type for `nivaran-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] nivaran_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("column decode error: {0}")]
  Decode(String),

  #[error("account not found: {0}")]
  AccountNotFound(Uuid),

  #[error("category not found: {0}")]
  CategoryNotFound(Uuid),

  #[error("grievance not found: {0}")]
  GrievanceNotFound(String),

  #[error("notification not found: {0}")]
  NotificationNotFound(Uuid),

  /// Grievance-id generation kept colliding with the UNIQUE constraint.
  #[error("could not allocate a unique grievance id")]
  GrievanceIdExhausted,
}

impl Error {
  /// Whether the underlying database error is a UNIQUE constraint violation.
  pub fn is_unique_violation(&self) -> bool {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => e.code == rusqlite::ErrorCode::ConstraintViolation,
      _ => false,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
