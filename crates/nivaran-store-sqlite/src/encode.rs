//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings, dates as ISO 8601 dates.
//! Enums are stored as their wire strings, lists and metadata as compact
//! JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use nivaran_core::{
  account::{Account, Gender, OtpChallenge, Role},
  category::Category,
  grievance::{
    CategoryRef, Grievance, GrievanceSummary, HistoryEntry, Priority, Status,
    SubmitterSnapshot,
  },
  notification::{Channel, Notification},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime / NaiveDate ────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::Decode(e.to_string()))
}

// ─── Enum wire strings ───────────────────────────────────────────────────────

pub fn decode_role(s: &str) -> Result<Role> {
  Role::parse(s).ok_or_else(|| Error::Decode(format!("unknown role: {s:?}")))
}

pub fn decode_gender(s: &str) -> Result<Gender> {
  Gender::parse(s).ok_or_else(|| Error::Decode(format!("unknown gender: {s:?}")))
}

pub fn decode_status(s: &str) -> Result<Status> {
  Status::parse(s).ok_or_else(|| Error::Decode(format!("unknown status: {s:?}")))
}

pub fn decode_priority(s: &str) -> Result<Priority> {
  Priority::parse(s).ok_or_else(|| Error::Decode(format!("unknown priority: {s:?}")))
}

pub fn decode_channel(s: &str) -> Result<Channel> {
  Channel::parse(s).ok_or_else(|| Error::Decode(format!("unknown channel: {s:?}")))
}

// ─── Lists / metadata ────────────────────────────────────────────────────────

pub fn encode_string_list(list: &[String]) -> Result<String> {
  Ok(serde_json::to_string(list)?)
}

pub fn decode_string_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:         String,
  pub first_name:         String,
  pub middle_name:        Option<String>,
  pub last_name:          String,
  pub gender:             String,
  pub dob:                String,
  pub primary_contact:    String,
  pub secondary_contact:  Option<String>,
  pub email:              String,
  pub password_hash:      String,
  pub role:               String,
  pub department:         Option<String>,
  pub managed_categories: String,
  pub push_token:         Option<String>,
  pub is_active:          bool,
  pub is_phone_verified:  bool,
  pub reset_otp_code:     Option<String>,
  pub reset_otp_expires:  Option<String>,
  pub phone_otp_code:     Option<String>,
  pub phone_otp_expires:  Option<String>,
  pub created_at:         String,
  pub updated_at:         String,
}

fn decode_otp(
  code: Option<String>,
  expires: Option<String>,
) -> Result<Option<OtpChallenge>> {
  match (code, expires) {
    (Some(code), Some(expires)) => Ok(Some(OtpChallenge {
      code,
      expires_at: decode_dt(&expires)?,
    })),
    _ => Ok(None),
  }
}

impl RawAccount {
  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      account_id:             decode_uuid(&self.account_id)?,
      first_name:             self.first_name,
      middle_name:            self.middle_name,
      last_name:              self.last_name,
      gender:                 decode_gender(&self.gender)?,
      dob:                    decode_date(&self.dob)?,
      primary_contact:        self.primary_contact,
      secondary_contact:      self.secondary_contact,
      email:                  self.email,
      password_hash:          self.password_hash,
      role:                   decode_role(&self.role)?,
      department:             self.department,
      managed_categories:     decode_string_list(&self.managed_categories)?,
      push_token:             self.push_token,
      is_active:              self.is_active,
      is_phone_verified:      self.is_phone_verified,
      password_reset_otp:     decode_otp(self.reset_otp_code, self.reset_otp_expires)?,
      phone_verification_otp: decode_otp(self.phone_otp_code, self.phone_otp_expires)?,
      created_at:             decode_dt(&self.created_at)?,
      updated_at:             decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `categories` row.
pub struct RawCategory {
  pub category_id: String,
  pub name:        String,
  pub key:         String,
  pub description: Option<String>,
  pub is_active:   bool,
  pub created_at:  String,
  pub updated_at:  String,
}

impl RawCategory {
  pub fn into_category(self) -> Result<Category> {
    Ok(Category {
      category_id: decode_uuid(&self.category_id)?,
      name:        self.name,
      key:         self.key,
      description: self.description,
      is_active:   self.is_active,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings read directly from a `grievances` row.
pub struct RawGrievance {
  pub grievance_id:       String,
  pub user_id:            Option<String>,
  pub created_by_name:    String,
  pub created_by_email:   String,
  pub created_by_contact: String,
  pub category_key:       String,
  pub category_name:      String,
  pub title:              String,
  pub description:        String,
  pub attachments:        String,
  pub status:             String,
  pub priority:           String,
  pub location:           Option<String>,
  pub assigned_to:        Option<String>,
  pub is_anonymous:       bool,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawGrievance {
  pub fn into_grievance(self) -> Result<Grievance> {
    Ok(Grievance {
      grievance_id: self.grievance_id,
      user_id:      self.user_id.as_deref().map(decode_uuid).transpose()?,
      created_by:   SubmitterSnapshot {
        name:            self.created_by_name,
        email:           self.created_by_email,
        primary_contact: self.created_by_contact,
      },
      category:     CategoryRef {
        key:  self.category_key,
        name: self.category_name,
      },
      title:        self.title,
      description:  self.description,
      attachments:  decode_string_list(&self.attachments)?,
      status:       decode_status(&self.status)?,
      priority:     decode_priority(&self.priority)?,
      location:     self.location,
      assigned_to:  self.assigned_to.as_deref().map(decode_uuid).transpose()?,
      is_anonymous: self.is_anonymous,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw listing row: grievance columns joined with the assignee's name.
pub struct RawSummary {
  pub grievance_id:   String,
  pub title:          String,
  pub category_key:   String,
  pub category_name:  String,
  pub status:         String,
  pub priority:       String,
  pub assignee_first: Option<String>,
  pub assignee_last:  Option<String>,
  pub created_at:     String,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<GrievanceSummary> {
    let assigned_name = match (self.assignee_first, self.assignee_last) {
      (Some(first), Some(last)) => Some(format!("{first} {last}")),
      _ => None,
    };
    Ok(GrievanceSummary {
      grievance_id:  self.grievance_id,
      title:         self.title,
      category_key:  self.category_key,
      category_name: self.category_name,
      status:        decode_status(&self.status)?,
      priority:      decode_priority(&self.priority)?,
      assigned_name,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}

/// Raw history row joined with the actor's name.
pub struct RawHistoryEntry {
  pub entry_id:     String,
  pub grievance_id: String,
  pub old_status:   Option<String>,
  pub new_status:   String,
  pub actor_id:     Option<String>,
  pub actor_first:  Option<String>,
  pub actor_last:   Option<String>,
  pub note:         Option<String>,
  pub is_comment:   bool,
  pub created_at:   String,
}

impl RawHistoryEntry {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    let actor_name = match (self.actor_first, self.actor_last) {
      (Some(first), Some(last)) => Some(format!("{first} {last}")),
      _ => None,
    };
    Ok(HistoryEntry {
      entry_id:     decode_uuid(&self.entry_id)?,
      grievance_id: self.grievance_id,
      old_status:   self.old_status.as_deref().map(decode_status).transpose()?,
      new_status:   decode_status(&self.new_status)?,
      actor_id:     self.actor_id.as_deref().map(decode_uuid).transpose()?,
      actor_name,
      note:         self.note,
      is_comment:   self.is_comment,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

/// Raw strings read directly from a `notifications` row.
pub struct RawNotification {
  pub notification_id: String,
  pub account_id:      String,
  pub channel:         String,
  pub title:           String,
  pub message:         String,
  pub meta:            String,
  pub is_read:         bool,
  pub created_at:      String,
}

impl RawNotification {
  pub fn into_notification(self) -> Result<Notification> {
    Ok(Notification {
      notification_id: decode_uuid(&self.notification_id)?,
      account_id:      decode_uuid(&self.account_id)?,
      channel:         decode_channel(&self.channel)?,
      title:           self.title,
      message:         self.message,
      meta:            serde_json::from_str(&self.meta)?,
      is_read:         self.is_read,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}
