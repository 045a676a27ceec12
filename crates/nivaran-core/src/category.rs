//! Grievance categories — the routing table between complaints and the
//! officials who manage them.
//!
//! A category is never removed once grievances reference its key; deletion
//! flips `is_active` so historic records keep resolving.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A classification tag, e.g. key `"water"`, name `"Water Supply"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
  pub category_id: Uuid,
  /// Unique display name, e.g. "Electricity & Power".
  pub name:        String,
  /// Unique machine identifier, e.g. "electricity". Immutable after creation.
  pub key:         String,
  pub description: Option<String>,
  /// Only active categories are offered for new submissions.
  pub is_active:   bool,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

/// Input to [`crate::store::GrievanceStore::create_category`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
  pub name:        String,
  pub key:         String,
  pub description: Option<String>,
}

/// Partial category mutation. The key is immutable and has no field here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryUpdate {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub is_active:   Option<bool>,
}
