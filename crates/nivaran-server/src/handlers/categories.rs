//! Category registry endpoints.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET`    | `/categories` | none (active only; `?include_inactive=true` for superadmin) |
//! | `POST`   | `/categories` | superadmin |
//! | `PUT`    | `/categories/:id` | superadmin |
//! | `DELETE` | `/categories/:id` | superadmin (soft delete) |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use nivaran_core::{
  account::Role,
  category::{Category, CategoryUpdate, NewCategory},
  store::GrievanceStore,
};

use crate::{
  AppState,
  auth::{Identity, MaybeIdentity},
  error::ApiError,
  handlers::require_superadmin,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_inactive: bool,
}

pub async fn list<S>(
  State(state): State<AppState<S>>,
  MaybeIdentity(identity): MaybeIdentity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Category>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let is_superadmin = identity.is_some_and(|a| a.role == Role::Superadmin);
  let active_only = !(params.include_inactive && is_superadmin);
  let categories = state.store.list_categories(active_only).await?;
  Ok(Json(categories))
}

pub async fn create<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Json(body): Json<NewCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_superadmin(&account)?;

  if body.name.trim().is_empty() {
    return Err(ApiError::validation("name", "name is required"));
  }
  let key_ok = !body.key.is_empty()
    && body
      .key
      .chars()
      .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
  if !key_ok {
    return Err(ApiError::validation(
      "key",
      "key must be non-empty lowercase alphanumeric (with - or _)",
    ));
  }

  let category = state.store.create_category(body).await?;
  Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<Uuid>,
  Json(update): Json<CategoryUpdate>,
) -> Result<Json<Category>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_superadmin(&account)?;
  let category = state.store.update_category(id, update).await?;
  Ok(Json(category))
}

/// Soft delete: historic grievances keep referencing the key.
pub async fn remove<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_superadmin(&account)?;
  let category = state.store.deactivate_category(id).await?;
  Ok(Json(category))
}
