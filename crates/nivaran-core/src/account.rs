//! Account types — citizens, officials, and administrators.
//!
//! An account is never hard-deleted; deactivation flips `is_active`. The
//! password is stored only as an argon2 PHC hash, produced and verified by
//! the server crate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Role ────────────────────────────────────────────────────────────────────

/// Access-control role. `Staff` is treated like `Official` by the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  #[default]
  Citizen,
  Official,
  Staff,
  Admin,
  Superadmin,
}

impl Role {
  /// Roles that triage grievances (everything except `Citizen`).
  pub fn is_privileged(self) -> bool {
    !matches!(self, Role::Citizen)
  }

  /// The wire string stored in the database and embedded in session tokens.
  pub fn as_str(self) -> &'static str {
    match self {
      Role::Citizen => "citizen",
      Role::Official => "official",
      Role::Staff => "staff",
      Role::Admin => "admin",
      Role::Superadmin => "superadmin",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "citizen" => Some(Role::Citizen),
      "official" => Some(Role::Official),
      "staff" => Some(Role::Staff),
      "admin" => Some(Role::Admin),
      "superadmin" => Some(Role::Superadmin),
      _ => None,
    }
  }
}

// ─── Gender ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
  Male,
  Female,
  Transgender,
  Other,
}

impl Gender {
  pub fn as_str(self) -> &'static str {
    match self {
      Gender::Male => "male",
      Gender::Female => "female",
      Gender::Transgender => "transgender",
      Gender::Other => "other",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "male" => Some(Gender::Male),
      "female" => Some(Gender::Female),
      "transgender" => Some(Gender::Transgender),
      "other" => Some(Gender::Other),
      _ => None,
    }
  }
}

// ─── One-time passwords ──────────────────────────────────────────────────────

/// Which OTP slot on the account a code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpKind {
  PasswordReset,
  PhoneVerification,
}

/// A pending one-time code. Cleared (set to `None`) after a successful
/// confirmation, so each code is single-use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
  pub code:       String,
  pub expires_at: DateTime<Utc>,
}

impl OtpChallenge {
  /// A challenge matches only if the code is equal and the window is open.
  pub fn matches(&self, code: &str, now: DateTime<Utc>) -> bool {
    self.code == code && now <= self.expires_at
  }
}

// ─── Account ─────────────────────────────────────────────────────────────────

/// A registered identity. `managed_categories` is empty for citizens; an
/// official with an empty set can access nothing (fail-closed).
#[derive(Debug, Clone)]
pub struct Account {
  pub account_id:             Uuid,
  pub first_name:             String,
  pub middle_name:            Option<String>,
  pub last_name:              String,
  pub gender:                 Gender,
  pub dob:                    NaiveDate,
  pub primary_contact:        String,
  pub secondary_contact:      Option<String>,
  pub email:                  String,
  /// Argon2 PHC string, e.g. `$argon2id$v=19$…`. Never the raw password.
  pub password_hash:          String,
  pub role:                   Role,
  pub department:             Option<String>,
  pub managed_categories:     Vec<String>,
  pub push_token:             Option<String>,
  pub is_active:              bool,
  pub is_phone_verified:      bool,
  pub password_reset_otp:     Option<OtpChallenge>,
  pub phone_verification_otp: Option<OtpChallenge>,
  pub created_at:             DateTime<Utc>,
  pub updated_at:             DateTime<Utc>,
}

impl Account {
  /// "First Last", as shown in listings and notification notes.
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
  }
}

// ─── NewAccount ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::GrievanceStore::create_account`]. Timestamps and
/// the account id are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub first_name:      String,
  pub middle_name:     Option<String>,
  pub last_name:       String,
  pub gender:          Gender,
  pub dob:             NaiveDate,
  pub primary_contact: String,
  pub email:           String,
  pub password_hash:   String,
  pub role:            Role,
}

// ─── ProfileUpdate ───────────────────────────────────────────────────────────

/// Allow-listed profile mutation; absent fields are left untouched. The
/// nullable fields are double-wrapped so an explicit JSON `null` clears the
/// stored value while a missing key leaves it alone. Role, department, and
/// managed categories are deliberately absent — those change only through
/// [`crate::store::GrievanceStore::set_role`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub first_name:        Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub middle_name:       Option<Option<String>>,
  pub last_name:         Option<String>,
  pub gender:            Option<Gender>,
  pub dob:               Option<NaiveDate>,
  pub primary_contact:   Option<String>,
  #[serde(default, deserialize_with = "nullable")]
  pub secondary_contact: Option<Option<String>>,
  pub email:             Option<String>,
}

/// Deserialize a field that was present in the input, keeping `null` as
/// `Some(None)`. Combined with `#[serde(default)]`, a missing key stays
/// `None`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  T: Deserialize<'de>,
  D: serde::Deserializer<'de>,
{
  Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Duration;

  #[test]
  fn otp_matches_within_window() {
    let now = Utc::now();
    let otp = OtpChallenge {
      code:       "123456".into(),
      expires_at: now + Duration::minutes(10),
    };
    assert!(otp.matches("123456", now));
    assert!(!otp.matches("654321", now));
  }

  #[test]
  fn otp_rejects_after_expiry() {
    let now = Utc::now();
    let otp = OtpChallenge {
      code:       "123456".into(),
      expires_at: now - Duration::seconds(1),
    };
    assert!(!otp.matches("123456", now));
  }

  #[test]
  fn profile_update_distinguishes_null_from_absent() {
    let absent: ProfileUpdate = serde_json::from_str("{}").unwrap();
    assert_eq!(absent.secondary_contact, None);

    let cleared: ProfileUpdate =
      serde_json::from_str(r#"{"secondary_contact": null}"#).unwrap();
    assert_eq!(cleared.secondary_contact, Some(None));

    let set: ProfileUpdate =
      serde_json::from_str(r#"{"secondary_contact": "9876500099"}"#).unwrap();
    assert_eq!(set.secondary_contact, Some(Some("9876500099".to_string())));
  }

  #[test]
  fn role_wire_strings_round_trip() {
    for role in [
      Role::Citizen,
      Role::Official,
      Role::Staff,
      Role::Admin,
      Role::Superadmin,
    ] {
      assert_eq!(Role::parse(role.as_str()), Some(role));
    }
  }
}
