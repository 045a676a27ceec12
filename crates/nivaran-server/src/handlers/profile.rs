//! The caller's own profile.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`   | `/profile/me` | |
//! | `PATCH` | `/profile/me` | allow-listed fields only |
//! | `PUT`   | `/profile/push-token` | `{"push_token": "..." \| null}` |

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::json;

use nivaran_core::{account::ProfileUpdate, store::GrievanceStore};

use crate::{AppState, auth::Identity, error::ApiError, handlers::AccountView};

pub async fn get_me<S>(
  Identity(account): Identity,
) -> Result<Json<AccountView>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  Ok(Json(AccountView::from(&account)))
}

/// Role, department, and managed categories are absent from
/// [`ProfileUpdate`] by construction — they change only through the admin
/// role endpoint.
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Json(update): Json<ProfileUpdate>,
) -> Result<Json<AccountView>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  if let Some(email) = &update.email
    && !email.contains('@')
  {
    return Err(ApiError::validation("email", "email must be a valid address"));
  }

  let updated = state
    .store
    .update_profile(account.account_id, update)
    .await?;
  Ok(Json(AccountView::from(&updated)))
}

#[derive(Debug, Deserialize)]
pub struct PushTokenBody {
  /// `null` clears the registered token.
  pub push_token: Option<String>,
}

pub async fn set_push_token<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Json(body): Json<PushTokenBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  state
    .store
    .set_push_token(account.account_id, body.push_token)
    .await?;
  Ok(Json(json!({ "message": "push token updated" })))
}
