//! Citizen-facing grievance endpoints.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `POST` | `/grievances` | bearer, or none for anonymous submissions |
//! | `GET`  | `/grievances/me` | bearer |
//! | `GET`  | `/grievances/:id` | bearer, access policy |
//! | `GET`  | `/grievances/:id/history` | bearer, access policy |
//! | `POST` | `/grievances/:id/attachments` | bearer, access policy |
//!
//! Creation is multipart: text fields (`title`, `description`, `category_id`,
//! `priority`, `location`, `is_anonymous`) plus up to five images and one PDF.
//! The detail read resolves attachment locators into short-lived signed URLs.

use axum::{
  Json,
  body::Bytes,
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
};
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use nivaran_core::{
  grievance::{
    CategoryRef, Grievance, GrievanceSummary, HistoryEntry, NewGrievance,
    Priority, Status, SubmitterSnapshot,
  },
  notification::NotificationIntent,
  policy::{self, ListScope, Operation},
  store::{GrievanceFilter, GrievanceStore},
};

use crate::{
  AppState,
  auth::{Identity, MaybeIdentity},
  error::ApiError,
  storage::{
    AttachmentKind, MAX_IMAGES_PER_GRIEVANCE, MAX_PDFS_PER_GRIEVANCE,
  },
};

// ─── Multipart helpers ────────────────────────────────────────────────────────

struct UploadedFile {
  kind:  AttachmentKind,
  name:  String,
  bytes: Bytes,
}

fn multipart_err(e: axum::extract::multipart::MultipartError) -> ApiError {
  ApiError::validation("body", format!("malformed multipart body: {e}"))
}

/// Read one multipart stream into text fields and validated files.
async fn read_multipart(
  multipart: &mut Multipart,
  max_file_bytes: usize,
) -> Result<(Vec<(String, String)>, Vec<UploadedFile>), ApiError> {
  let mut fields = Vec::new();
  let mut files = Vec::new();

  while let Some(field) = multipart.next_field().await.map_err(multipart_err)? {
    let name = field.name().unwrap_or_default().to_string();
    if let Some(filename) = field.file_name().map(str::to_string) {
      let content_type = field.content_type().unwrap_or_default().to_string();
      let kind = AttachmentKind::from_content_type(&content_type).ok_or_else(|| {
        ApiError::validation(
          "attachments",
          format!("unsupported file type {content_type:?}: only images and PDF are accepted"),
        )
      })?;
      let bytes = field.bytes().await.map_err(multipart_err)?;
      if bytes.len() > max_file_bytes {
        return Err(ApiError::validation(
          "attachments",
          format!("{filename} exceeds the {max_file_bytes}-byte limit"),
        ));
      }
      files.push(UploadedFile {
        kind,
        name: filename,
        bytes,
      });
    } else {
      fields.push((name, field.text().await.map_err(multipart_err)?));
    }
  }

  let images = files
    .iter()
    .filter(|f| f.kind == AttachmentKind::Image)
    .count();
  let pdfs = files.iter().filter(|f| f.kind == AttachmentKind::Pdf).count();
  if images > MAX_IMAGES_PER_GRIEVANCE {
    return Err(ApiError::validation(
      "attachments",
      format!("at most {MAX_IMAGES_PER_GRIEVANCE} images per grievance"),
    ));
  }
  if pdfs > MAX_PDFS_PER_GRIEVANCE {
    return Err(ApiError::validation(
      "attachments",
      format!("at most {MAX_PDFS_PER_GRIEVANCE} PDF per grievance"),
    ));
  }

  Ok((fields, files))
}

fn store_files<S>(
  state: &AppState<S>,
  files: &[UploadedFile],
) -> Result<Vec<String>, ApiError> {
  let mut locators = Vec::with_capacity(files.len());
  for file in files {
    locators.push(state.attachments.put(file.kind, &file.name, &file.bytes)?);
  }
  Ok(locators)
}

// ─── Create ───────────────────────────────────────────────────────────────────

pub async fn create<S>(
  State(state): State<AppState<S>>,
  MaybeIdentity(identity): MaybeIdentity,
  mut multipart: Multipart,
) -> Result<(StatusCode, Json<Grievance>), ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let (fields, files) =
    read_multipart(&mut multipart, state.config.max_upload_bytes).await?;

  let mut title = None;
  let mut description = None;
  let mut category_id = None;
  let mut priority = Priority::default();
  let mut location = None;
  let mut is_anonymous = false;
  for (name, value) in fields {
    match name.as_str() {
      "title" => title = Some(value),
      "description" => description = Some(value),
      "category_id" => category_id = Some(value),
      "priority" => {
        priority = Priority::parse(&value).ok_or_else(|| {
          ApiError::validation("priority", "priority must be Low, Medium, or High")
        })?;
      }
      "location" => location = Some(value),
      "is_anonymous" => is_anonymous = matches!(value.as_str(), "true" | "1"),
      _ => {}
    }
  }

  let title = title
    .filter(|t| !t.trim().is_empty())
    .ok_or_else(|| ApiError::validation("title", "title is required"))?;
  let description = description
    .filter(|d| !d.trim().is_empty())
    .ok_or_else(|| ApiError::validation("description", "description is required"))?;
  let category_id = category_id
    .as_deref()
    .and_then(|v| Uuid::parse_str(v).ok())
    .ok_or_else(|| {
      ApiError::validation("category_id", "category_id must be a valid id")
    })?;

  let category = state
    .store
    .get_category(category_id)
    .await?
    .ok_or_else(|| ApiError::validation("category_id", "unknown category"))?;
  if !category.is_active {
    return Err(ApiError::validation(
      "category_id",
      "category is not accepting new submissions",
    ));
  }

  // Anonymous submissions need no session; everything else does.
  let (user_id, created_by) = if is_anonymous {
    (None, SubmitterSnapshot::anonymous())
  } else {
    let account = identity.ok_or_else(ApiError::unauthorized)?;
    (
      Some(account.account_id),
      SubmitterSnapshot {
        name:            account.display_name(),
        email:           account.email.clone(),
        primary_contact: account.primary_contact.clone(),
      },
    )
  };

  let attachments = store_files(&state, &files)?;

  let grievance = state
    .store
    .create_grievance(NewGrievance {
      user_id,
      created_by,
      category: CategoryRef {
        key:  category.key,
        name: category.name,
      },
      title,
      description,
      attachments,
      priority,
      location: location.filter(|l| !l.trim().is_empty()),
      is_anonymous,
    })
    .await?;

  tracing::info!(grievance_id = %grievance.grievance_id, "grievance created");
  if let Some(owner) = grievance.user_id {
    let intent = NotificationIntent::new(
      owner,
      "Grievance Submitted",
      format!("Your grievance {} has been received", grievance.grievance_id),
      json!({
        "grievance_id": grievance.grievance_id,
        "status": grievance.status.as_str(),
      }),
    );
    state.dispatcher.dispatch(state.store.as_ref(), intent).await;
  }

  Ok((StatusCode::CREATED, Json(grievance)))
}

// ─── List mine ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<String>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

impl ListParams {
  pub fn into_filter(self) -> Result<GrievanceFilter, ApiError> {
    let status = match self.status.as_deref() {
      None => None,
      Some(s) => Some(Status::parse(s).ok_or_else(|| {
        ApiError::validation("status", format!("unknown status {s:?}"))
      })?),
    };
    Ok(GrievanceFilter {
      status,
      limit: self.limit,
      offset: self.offset,
    })
  }
}

pub async fn list_mine<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<GrievanceSummary>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let filter = params.into_filter()?;
  let rows = state
    .store
    .list_grievances(ListScope::Owner(account.account_id), filter)
    .await?;
  Ok(Json(rows))
}

// ─── Detail / history ─────────────────────────────────────────────────────────

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let mut grievance = state
    .store
    .get_grievance(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("grievance {id} not found")))?;
  if !policy::can_access(&account, Operation::View, &grievance) {
    return Err(ApiError::forbidden());
  }

  // Readers get short-lived URLs, never raw storage locators.
  grievance.attachments = grievance
    .attachments
    .iter()
    .map(|locator| state.attachments.sign_for_read(locator, Duration::hours(1)))
    .collect::<Result<_, _>>()?;

  Ok(Json(grievance))
}

pub async fn history<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
) -> Result<Json<Vec<HistoryEntry>>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let grievance = state
    .store
    .get_grievance(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("grievance {id} not found")))?;
  if !policy::can_access(&account, Operation::View, &grievance) {
    return Err(ApiError::forbidden());
  }
  let entries = state.store.get_history(&id).await?;
  Ok(Json(entries))
}

// ─── Attachments ──────────────────────────────────────────────────────────────

pub async fn add_attachments<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Path(id): Path<String>,
  mut multipart: Multipart,
) -> Result<Json<Grievance>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let grievance = state
    .store
    .get_grievance(&id)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("grievance {id} not found")))?;
  if !policy::can_access(&account, Operation::Attach, &grievance) {
    return Err(ApiError::forbidden());
  }

  let (_, files) =
    read_multipart(&mut multipart, state.config.max_upload_bytes).await?;
  if files.is_empty() {
    return Err(ApiError::validation("attachments", "no files in request"));
  }

  let locators = store_files(&state, &files)?;
  let updated = state.store.add_attachments(&id, locators).await?;
  Ok(Json(updated))
}
