//! HTTP surface for the Nivaran public grievance system.
//!
//! Exposes an axum [`Router`] backed by any
//! [`nivaran_core::store::GrievanceStore`] whose error converts into
//! [`ApiError`]. Authentication is JWT bearer tokens; authorization is the
//! pure policy in [`nivaran_core::policy`], consulted before every restricted
//! read or write.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod otp;
pub mod storage;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post, put},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use nivaran_core::store::GrievanceStore;

use auth::JwtKeys;
use notify::Dispatcher;
use storage::{AttachmentStorage, MAX_IMAGES_PER_GRIEVANCE, MAX_PDFS_PER_GRIEVANCE};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with
/// `NIVARAN_`-prefixed environment overrides.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  pub store_path:         PathBuf,
  #[serde(default = "default_upload_dir")]
  pub upload_dir:         PathBuf,
  /// HS256 signing secret for session tokens.
  pub jwt_secret:         String,
  #[serde(default = "default_token_expiry_hours")]
  pub token_expiry_hours: i64,
  /// Per-file upload cap in bytes.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes:   usize,
  /// Sender identity for outbound email; channel disabled when absent.
  #[serde(default)]
  pub email_sender:       Option<String>,
  /// Sender number for outbound SMS; channel disabled when absent.
  #[serde(default)]
  pub sms_sender:         Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_token_expiry_hours() -> i64 { 24 }
fn default_max_upload_bytes() -> usize { 10 * 1024 * 1024 }

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:       Arc<S>,
  pub config:      Arc<ServerConfig>,
  pub jwt:         Arc<JwtKeys>,
  pub dispatcher:  Arc<Dispatcher>,
  pub attachments: Arc<dyn AttachmentStorage>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:       self.store.clone(),
      config:      self.config.clone(),
      jwt:         self.jwt.clone(),
      dispatcher:  self.dispatcher.clone(),
      attachments: self.attachments.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the grievance API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: GrievanceStore + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  // The whole multipart body: every file slot at the cap, plus field slack.
  let body_limit = state.config.max_upload_bytes
    * (MAX_IMAGES_PER_GRIEVANCE + MAX_PDFS_PER_GRIEVANCE)
    + 1024 * 1024;

  Router::new()
    // Auth
    .route("/auth/register", post(handlers::auth::register::<S>))
    .route("/auth/login", post(handlers::auth::login::<S>))
    .route(
      "/auth/password-reset/request",
      post(handlers::auth::password_reset_request::<S>),
    )
    .route(
      "/auth/password-reset/confirm",
      post(handlers::auth::password_reset_confirm::<S>),
    )
    .route(
      "/auth/phone-verification/request",
      post(handlers::auth::phone_verification_request::<S>),
    )
    .route(
      "/auth/phone-verification/confirm",
      post(handlers::auth::phone_verification_confirm::<S>),
    )
    // Profile
    .route(
      "/profile/me",
      get(handlers::profile::get_me::<S>).patch(handlers::profile::update_me::<S>),
    )
    .route("/profile/push-token", put(handlers::profile::set_push_token::<S>))
    // Categories
    .route(
      "/categories",
      get(handlers::categories::list::<S>).post(handlers::categories::create::<S>),
    )
    .route(
      "/categories/{id}",
      put(handlers::categories::update::<S>).delete(handlers::categories::remove::<S>),
    )
    // Grievances
    .route("/grievances", post(handlers::grievances::create::<S>))
    .route("/grievances/me", get(handlers::grievances::list_mine::<S>))
    .route("/grievances/{id}", get(handlers::grievances::get_one::<S>))
    .route(
      "/grievances/{id}/history",
      get(handlers::grievances::history::<S>),
    )
    .route(
      "/grievances/{id}/attachments",
      post(handlers::grievances::add_attachments::<S>),
    )
    // Triage
    .route("/admin/grievances", get(handlers::admin::list::<S>))
    .route("/admin/grievances/summary", get(handlers::admin::summary::<S>))
    .route(
      "/admin/grievances/{id}/status",
      put(handlers::admin::update_status::<S>),
    )
    .route(
      "/admin/grievances/{id}/assign",
      post(handlers::admin::assign::<S>),
    )
    .route(
      "/admin/grievances/{id}/comment",
      post(handlers::admin::comment::<S>),
    )
    .route("/admin/officials", get(handlers::admin::officials::<S>))
    .route("/admin/accounts/{id}/role", put(handlers::admin::set_role::<S>))
    // Notifications
    .route("/notifications", get(handlers::notifications::list::<S>))
    .route(
      "/notifications/{id}/read",
      post(handlers::notifications::mark_read::<S>),
    )
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

#[cfg(test)]
mod tests;
