//! Triage and administration endpoints.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `GET`  | `/admin/grievances` | privileged, scoped by managed categories |
//! | `GET`  | `/admin/grievances/summary` | privileged, same scope |
//! | `PUT`  | `/admin/grievances/:id/status` | access policy |
//! | `POST` | `/admin/grievances/:id/assign` | access policy |
//! | `POST` | `/admin/grievances/:id/comment` | access policy |
//! | `GET`  | `/admin/officials` | privileged |
//! | `PUT`  | `/admin/accounts/:id/role` | superadmin |
//!
//! Every read and write here goes through [`nivaran_core::policy`] — no
//! endpoint applies its own ad-hoc role check against grievance data.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use nivaran_core::{
  account::Role,
  grievance::{Grievance, GrievanceSummary, HistoryEntry, Status, StatusSummary},
  notification::NotificationIntent,
  policy::{self, Operation},
  store::GrievanceStore,
};

use crate::{
  AppState,
  auth::Identity,
  error::ApiError,
  handlers::{AccountView, require_privileged, require_superadmin},
};

use super::grievances::ListParams;

// ─── Scoped listing and summary ───────────────────────────────────────────────

pub async fn list<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GrievanceSummary>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_privileged(&account)?;
  let filter = params.into_filter()?;
  let rows = state
    .store
    .list_grievances(policy::list_scope(&account), filter)
    .await?;
  Ok(Json(rows))
}

pub async fn summary<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
) -> Result<Json<StatusSummary>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_privileged(&account)?;
  let counts = state.store.summary(policy::list_scope(&account)).await?;
  Ok(Json(counts))
}

// ─── Status / assignment / comments ───────────────────────────────────────────

async fn load_checked<S>(
  state: &AppState<S>,
  account: &nivaran_core::account::Account,
  op: Operation,
  id: &str,
) -> Result<Grievance, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let grievance = state
    .store
    .get_grievance(id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("grievance {id} not found")))?;
  if !policy::can_access(account, op, &grievance) {
    return Err(ApiError::forbidden());
  }
  Ok(grievance)
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: String,
  pub note:   Option<String>,
}

pub async fn update_status<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let new_status = Status::parse(&body.status).ok_or_else(|| {
    ApiError::validation("status", format!("unknown status {:?}", body.status))
  })?;
  load_checked(&state, &account, Operation::UpdateStatus, &id).await?;

  let updated = state
    .store
    .update_status(&id, new_status, account.account_id, body.note)
    .await?;

  if let Some(owner) = updated.user_id {
    let intent = NotificationIntent::new(
      owner,
      "Grievance Update",
      format!(
        "Status of {} changed to {}",
        updated.grievance_id,
        new_status.as_str()
      ),
      json!({
        "grievance_id": updated.grievance_id,
        "status": new_status.as_str(),
      }),
    );
    state.dispatcher.dispatch(state.store.as_ref(), intent).await;
  }

  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct AssignBody {
  pub official_id: Uuid,
}

pub async fn assign<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
  Json(body): Json<AssignBody>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  load_checked(&state, &account, Operation::Assign, &id).await?;

  let official = state
    .store
    .find_account(body.official_id)
    .await?
    .ok_or_else(|| {
      ApiError::NotFound(format!("account {} not found", body.official_id))
    })?;
  if !official.role.is_privileged() {
    return Err(ApiError::validation(
      "official_id",
      "account is not an official",
    ));
  }

  // Forces the status to Assigned regardless of its prior value.
  let updated = state
    .store
    .assign_official(&id, official.account_id, account.account_id)
    .await?;

  let meta = json!({
    "grievance_id": updated.grievance_id,
    "status": updated.status.as_str(),
  });
  if let Some(owner) = updated.user_id {
    let intent = NotificationIntent::new(
      owner,
      "Grievance Update",
      format!(
        "{} has been assigned to {}",
        updated.grievance_id,
        official.display_name()
      ),
      meta.clone(),
    );
    state.dispatcher.dispatch(state.store.as_ref(), intent).await;
  }
  let intent = NotificationIntent::new(
    official.account_id,
    "Grievance Assigned",
    format!("{} has been assigned to you", updated.grievance_id),
    meta,
  );
  state.dispatcher.dispatch(state.store.as_ref(), intent).await;

  Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub note: String,
}

pub async fn comment<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
  Json(body): Json<CommentBody>,
) -> Result<Json<HistoryEntry>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  if body.note.trim().is_empty() {
    return Err(ApiError::validation("note", "note is required"));
  }
  load_checked(&state, &account, Operation::Comment, &id).await?;

  let entry = state
    .store
    .add_comment(&id, account.account_id, body.note)
    .await?;
  Ok(Json(entry))
}

// ─── Account administration ───────────────────────────────────────────────────

pub async fn officials<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
) -> Result<Json<Vec<AccountView>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_privileged(&account)?;
  let officials = state.store.list_officials().await?;
  Ok(Json(officials.iter().map(AccountView::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role:               String,
  #[serde(default)]
  pub managed_categories: Vec<String>,
  pub department:         Option<String>,
}

pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<Uuid>,
  Json(body): Json<RoleBody>,
) -> Result<Json<AccountView>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  require_superadmin(&account)?;
  let role = Role::parse(&body.role).ok_or_else(|| {
    ApiError::validation("role", format!("unknown role {:?}", body.role))
  })?;

  let updated = state
    .store
    .set_role(id, role, body.managed_categories, body.department)
    .await?;
  Ok(Json(AccountView::from(&updated)))
}
