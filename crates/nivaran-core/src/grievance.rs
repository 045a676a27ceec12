//! Grievance types — the central entity — and the append-only status history.

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Lifecycle status. The informal progression is `Submitted → In Review →
/// Assigned → Resolved → Closed`, but transitions are *not* enforced: any
/// value is accepted from any current value (free transitions support
/// corrections, e.g. reopening a closed grievance). The one exception is
/// assignment, which always forces `Assigned`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
  #[default]
  Submitted,
  #[serde(rename = "In Review")]
  InReview,
  Assigned,
  Resolved,
  Closed,
}

impl Status {
  /// The wire string stored in the database and shown to clients.
  pub fn as_str(self) -> &'static str {
    match self {
      Status::Submitted => "Submitted",
      Status::InReview => "In Review",
      Status::Assigned => "Assigned",
      Status::Resolved => "Resolved",
      Status::Closed => "Closed",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "Submitted" => Some(Status::Submitted),
      "In Review" => Some(Status::InReview),
      "Assigned" => Some(Status::Assigned),
      "Resolved" => Some(Status::Resolved),
      "Closed" => Some(Status::Closed),
      _ => None,
    }
  }

  /// Statuses counted as "pending" on the admin dashboard.
  pub fn is_pending(self) -> bool {
    matches!(self, Status::Submitted | Status::InReview | Status::Assigned)
  }
}

// ─── Priority ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Priority {
  Low,
  #[default]
  Medium,
  High,
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      Priority::Low => "Low",
      Priority::Medium => "Medium",
      Priority::High => "High",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "Low" => Some(Priority::Low),
      "Medium" => Some(Priority::Medium),
      "High" => Some(Priority::High),
      _ => None,
    }
  }
}

// ─── Submitter snapshot ──────────────────────────────────────────────────────

/// Denormalised submitter identity, captured at submission time so later
/// profile edits don't rewrite history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitterSnapshot {
  pub name:            String,
  pub email:           String,
  pub primary_contact: String,
}

impl SubmitterSnapshot {
  /// The fixed placeholder stored for anonymous submissions. No field of the
  /// caller's real account may appear here.
  pub fn anonymous() -> Self {
    Self {
      name:            "Anonymous".to_string(),
      email:           String::new(),
      primary_contact: String::new(),
    }
  }
}

/// Denormalised category snapshot carried on every grievance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
  pub key:  String,
  pub name: String,
}

// ─── Grievance ───────────────────────────────────────────────────────────────

/// A citizen-submitted complaint. Never deleted; every status mutation is
/// mirrored by a [`HistoryEntry`].
#[derive(Debug, Clone, Serialize)]
pub struct Grievance {
  /// Human-readable unique identifier, e.g. `PGS-LX3K9A-7F2Q`. Immutable.
  pub grievance_id: String,
  /// Owning account; `None` iff `is_anonymous`.
  pub user_id:      Option<Uuid>,
  pub created_by:   SubmitterSnapshot,
  pub category:     CategoryRef,
  pub title:        String,
  pub description:  String,
  /// Storage locators, in upload order. The store holds references, not bytes.
  pub attachments:  Vec<String>,
  pub status:       Status,
  pub priority:     Priority,
  pub location:     Option<String>,
  pub assigned_to:  Option<Uuid>,
  pub is_anonymous: bool,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::GrievanceStore::create_grievance`]. The
/// `grievance_id`, status, and timestamps are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewGrievance {
  pub user_id:      Option<Uuid>,
  pub created_by:   SubmitterSnapshot,
  pub category:     CategoryRef,
  pub title:        String,
  pub description:  String,
  pub attachments:  Vec<String>,
  pub priority:     Priority,
  pub location:     Option<String>,
  pub is_anonymous: bool,
}

/// Listing row with the read-model projection already applied: category
/// display name and assignee display name are resolved by the store.
#[derive(Debug, Clone, Serialize)]
pub struct GrievanceSummary {
  pub grievance_id:  String,
  pub title:         String,
  pub category_key:  String,
  pub category_name: String,
  pub status:        Status,
  pub priority:      Priority,
  pub assigned_name: Option<String>,
  pub created_at:    DateTime<Utc>,
}

// ─── Status history ──────────────────────────────────────────────────────────

/// One row of the append-only audit trail. Comments are stored here too, with
/// `old_status == new_status` and `is_comment` set.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
  pub entry_id:     Uuid,
  pub grievance_id: String,
  /// `None` for creation-time entries.
  pub old_status:   Option<Status>,
  pub new_status:   Status,
  pub actor_id:     Option<Uuid>,
  /// Actor display name, resolved at read time.
  pub actor_name:   Option<String>,
  pub note:         Option<String>,
  pub is_comment:   bool,
  pub created_at:   DateTime<Utc>,
}

/// Dashboard counts, computed under the caller's list scope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
  pub total:     u64,
  /// Submitted + In Review + Assigned.
  pub pending:   u64,
  pub submitted: u64,
  pub in_review: u64,
  pub assigned:  u64,
  pub resolved:  u64,
  pub closed:    u64,
}

// ─── Grievance id generation ─────────────────────────────────────────────────

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn base36_upper(mut n: u64) -> String {
  if n == 0 {
    return "0".to_string();
  }
  let mut digits = Vec::new();
  while n > 0 {
    digits.push(BASE36[(n % 36) as usize]);
    n /= 36;
  }
  digits.iter().rev().map(|&b| b as char).collect()
}

/// Generate a grievance identifier: `PGS-<base36 millis>-<4 random base36>`,
/// all uppercase. Collisions are improbable but not impossible; the store's
/// UNIQUE constraint is the actual guard and insertion retries on conflict.
pub fn generate_grievance_id() -> String {
  let millis = Utc::now().timestamp_millis().max(0) as u64;
  let mut bytes = [0u8; 4];
  OsRng.fill_bytes(&mut bytes);
  let suffix: String = bytes
    .iter()
    .map(|&b| BASE36[(b as usize) % 36] as char)
    .collect();
  format!("PGS-{}-{}", base36_upper(millis), suffix)
}
