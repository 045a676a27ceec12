//! Request handlers, grouped by resource.

pub mod admin;
pub mod auth;
pub mod categories;
pub mod grievances;
pub mod notifications;
pub mod profile;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use nivaran_core::account::{Account, Gender, Role};

use crate::error::ApiError;

/// The public projection of an [`Account`] — never the password hash, OTP
/// slots, or push token.
#[derive(Debug, Serialize)]
pub struct AccountView {
  pub account_id:         Uuid,
  pub first_name:         String,
  pub middle_name:        Option<String>,
  pub last_name:          String,
  pub gender:             Gender,
  pub dob:                NaiveDate,
  pub primary_contact:    String,
  pub secondary_contact:  Option<String>,
  pub email:              String,
  pub role:               Role,
  pub department:         Option<String>,
  pub managed_categories: Vec<String>,
  pub is_active:          bool,
  pub is_phone_verified:  bool,
  pub created_at:         DateTime<Utc>,
}

impl From<&Account> for AccountView {
  fn from(a: &Account) -> Self {
    Self {
      account_id:         a.account_id,
      first_name:         a.first_name.clone(),
      middle_name:        a.middle_name.clone(),
      last_name:          a.last_name.clone(),
      gender:             a.gender,
      dob:                a.dob,
      primary_contact:    a.primary_contact.clone(),
      secondary_contact:  a.secondary_contact.clone(),
      email:              a.email.clone(),
      role:               a.role,
      department:         a.department.clone(),
      managed_categories: a.managed_categories.clone(),
      is_active:          a.is_active,
      is_phone_verified:  a.is_phone_verified,
      created_at:         a.created_at,
    }
  }
}

pub(crate) fn require_privileged(account: &Account) -> Result<(), ApiError> {
  if account.role.is_privileged() {
    Ok(())
  } else {
    Err(ApiError::forbidden())
  }
}

pub(crate) fn require_superadmin(account: &Account) -> Result<(), ApiError> {
  if account.role == Role::Superadmin {
    Ok(())
  } else {
    Err(ApiError::forbidden())
  }
}
