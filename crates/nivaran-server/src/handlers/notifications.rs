//! The caller's in-app inbox.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/notifications` | latest 50, newest first |
//! | `POST` | `/notifications/:id/read` | 404 unless it belongs to the caller |

use axum::{
  Json,
  extract::{Path, State},
};
use serde_json::json;
use uuid::Uuid;

use nivaran_core::{notification::Notification, store::GrievanceStore};

use crate::{AppState, auth::Identity, error::ApiError};

const INBOX_LIMIT: usize = 50;

pub async fn list<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
) -> Result<Json<Vec<Notification>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let inbox = state
    .store
    .list_notifications(account.account_id, INBOX_LIMIT)
    .await?;
  Ok(Json(inbox))
}

pub async fn mark_read<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  state
    .store
    .mark_notification_read(id, account.account_id)
    .await?;
  Ok(Json(json!({ "message": "notification marked read" })))
}
