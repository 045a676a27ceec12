//! The `GrievanceStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g. `nivaran-store-sqlite`).
//! The HTTP layer depends on this abstraction, not on any concrete backend.
//! Authorization is *not* enforced here — callers consult
//! [`crate::policy`] before every restricted read or write.

use std::future::Future;

use uuid::Uuid;

use crate::{
  account::{Account, NewAccount, OtpChallenge, OtpKind, ProfileUpdate, Role},
  category::{Category, CategoryUpdate, NewCategory},
  grievance::{
    Grievance, GrievanceSummary, HistoryEntry, NewGrievance, Status,
    StatusSummary,
  },
  notification::{NewNotification, Notification},
  policy::ListScope,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`GrievanceStore::list_grievances`], applied on top of the
/// caller's [`ListScope`].
#[derive(Debug, Clone, Default)]
pub struct GrievanceFilter {
  pub status: Option<Status>,
  pub limit:  Option<usize>,
  pub offset: Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Nivaran storage backend.
///
/// Grievance status mutations are mirrored by exactly one append-only history
/// row each; history rows are never updated or deleted. Accounts and
/// categories are soft-deleted only.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait GrievanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Accounts ──────────────────────────────────────────────────────────

  /// Create an account. Fails if the email or primary contact is taken.
  fn create_account(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Retrieve an account by id. Returns `None` if not found.
  fn find_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Retrieve an account by email or primary contact.
  fn find_account_by_identifier<'a>(
    &'a self,
    identifier: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  /// Apply an allow-listed profile mutation and return the updated account.
  fn update_profile(
    &self,
    id: Uuid,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// Replace the stored password hash (used by the reset flow).
  fn set_password_hash(
    &self,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Set or clear one of the account's OTP slots.
  fn set_otp(
    &self,
    id: Uuid,
    kind: OtpKind,
    challenge: Option<OtpChallenge>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn set_phone_verified(
    &self,
    id: Uuid,
    verified: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Register or clear a device push token.
  fn set_push_token(
    &self,
    id: Uuid,
    token: Option<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Admin-driven role/department mutation; replaces the managed-category set.
  fn set_role(
    &self,
    id: Uuid,
    role: Role,
    managed_categories: Vec<String>,
    department: Option<String>,
  ) -> impl Future<Output = Result<Account, Self::Error>> + Send + '_;

  /// All accounts with a triage role, for the assignment picker.
  fn list_officials(
    &self,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  // ── Categories ────────────────────────────────────────────────────────

  /// Create a category. Fails if the name or key is taken.
  fn create_category(
    &self,
    input: NewCategory,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  fn get_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Category>, Self::Error>> + Send + '_;

  /// List categories, optionally restricted to active ones, sorted by name.
  fn list_categories(
    &self,
    active_only: bool,
  ) -> impl Future<Output = Result<Vec<Category>, Self::Error>> + Send + '_;

  /// Apply a partial update. The key is immutable.
  fn update_category(
    &self,
    id: Uuid,
    update: CategoryUpdate,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  /// Soft delete: flips `is_active` to false, preserving referential
  /// integrity with historic grievances.
  fn deactivate_category(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + '_;

  // ── Grievances ────────────────────────────────────────────────────────

  /// Persist a new grievance with a freshly generated `grievance_id`,
  /// retrying generation if the UNIQUE constraint trips.
  fn create_grievance(
    &self,
    input: NewGrievance,
  ) -> impl Future<Output = Result<Grievance, Self::Error>> + Send + '_;

  fn get_grievance<'a>(
    &'a self,
    grievance_id: &'a str,
  ) -> impl Future<Output = Result<Option<Grievance>, Self::Error>> + Send + 'a;

  /// Scoped listing, newest-first, with category and assignee display names
  /// resolved (the read-model projection lives here, not in call sites).
  fn list_grievances(
    &self,
    scope: ListScope,
    filter: GrievanceFilter,
  ) -> impl Future<Output = Result<Vec<GrievanceSummary>, Self::Error>> + Send + '_;

  /// Audit trail for one grievance, newest-first, with actor names resolved.
  fn get_history<'a>(
    &'a self,
    grievance_id: &'a str,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + 'a;

  /// Set the status (any value is accepted from any current value) and
  /// append exactly one history row capturing old → new.
  fn update_status<'a>(
    &'a self,
    grievance_id: &'a str,
    new_status: Status,
    actor: Uuid,
    note: Option<String>,
  ) -> impl Future<Output = Result<Grievance, Self::Error>> + Send + 'a;

  /// Assign an official and force the status to `Assigned` regardless of the
  /// prior value; appends one history row with a synthesized note.
  fn assign_official<'a>(
    &'a self,
    grievance_id: &'a str,
    official_id: Uuid,
    actor: Uuid,
  ) -> impl Future<Output = Result<Grievance, Self::Error>> + Send + 'a;

  /// Append a comment row (`old_status == new_status`, `is_comment` set)
  /// without mutating the grievance itself.
  fn add_comment<'a>(
    &'a self,
    grievance_id: &'a str,
    actor: Uuid,
    text: String,
  ) -> impl Future<Output = Result<HistoryEntry, Self::Error>> + Send + 'a;

  /// Append locators to the attachment list; never replaces existing ones.
  fn add_attachments<'a>(
    &'a self,
    grievance_id: &'a str,
    locators: Vec<String>,
  ) -> impl Future<Output = Result<Grievance, Self::Error>> + Send + 'a;

  /// Dashboard counts by status bucket, under the caller's scope.
  fn summary(
    &self,
    scope: ListScope,
  ) -> impl Future<Output = Result<StatusSummary, Self::Error>> + Send + '_;

  // ── Notifications ─────────────────────────────────────────────────────

  /// Append an in-app inbox record. Written regardless of outbound delivery.
  fn record_notification(
    &self,
    input: NewNotification,
  ) -> impl Future<Output = Result<Notification, Self::Error>> + Send + '_;

  /// The account's inbox, newest-first, capped at `limit`.
  fn list_notifications(
    &self,
    account_id: Uuid,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<Notification>, Self::Error>> + Send + '_;

  /// Flip `is_read`. The account id guards against marking another user's
  /// notification.
  fn mark_notification_read(
    &self,
    notification_id: Uuid,
    account_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
