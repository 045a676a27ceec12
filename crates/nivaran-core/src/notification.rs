//! Notification types — the in-app inbox record and the dispatch intent.
//!
//! A [`Notification`] row is written once per dispatch event regardless of
//! whether any outbound channel succeeded; delivery is best-effort and its
//! outcome is observability data, not state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery channel recorded on a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
  Email,
  Sms,
  Push,
  Inapp,
}

impl Channel {
  pub fn as_str(self) -> &'static str {
    match self {
      Channel::Email => "email",
      Channel::Sms => "sms",
      Channel::Push => "push",
      Channel::Inapp => "inapp",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "email" => Some(Channel::Email),
      "sms" => Some(Channel::Sms),
      "push" => Some(Channel::Push),
      "inapp" => Some(Channel::Inapp),
      _ => None,
    }
  }
}

/// An in-app inbox entry. Mutated only to flip `is_read`.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
  pub notification_id: Uuid,
  pub account_id:      Uuid,
  /// The primary channel attempted for this dispatch event.
  pub channel:         Channel,
  pub title:           String,
  pub message:         String,
  /// Arbitrary metadata for deep-linking, e.g. `{"grievanceId": "...", "status": "..."}`.
  pub meta:            serde_json::Value,
  pub is_read:         bool,
  pub created_at:      DateTime<Utc>,
}

/// Input to [`crate::store::GrievanceStore::record_notification`].
#[derive(Debug, Clone)]
pub struct NewNotification {
  pub account_id: Uuid,
  pub channel:    Channel,
  pub title:      String,
  pub message:    String,
  pub meta:       serde_json::Value,
}

/// A pending side effect produced by a grievance mutation. The mutation
/// commits first; the dispatcher consumes the intent afterwards and is the
/// only code that talks to the outbound channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
  pub account_id: Uuid,
  pub title:      String,
  pub message:    String,
  pub meta:       serde_json::Value,
}

impl NotificationIntent {
  pub fn new(
    account_id: Uuid,
    title: impl Into<String>,
    message: impl Into<String>,
    meta: serde_json::Value,
  ) -> Self {
    Self {
      account_id,
      title: title.into(),
      message: message.into(),
      meta,
    }
  }
}
