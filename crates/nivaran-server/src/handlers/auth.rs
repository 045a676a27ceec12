//! Registration, login, and the OTP flows.
//!
//! | Method | Path | Auth |
//! |--------|------|------|
//! | `POST` | `/auth/register` | none |
//! | `POST` | `/auth/login` | none |
//! | `POST` | `/auth/password-reset/request` | none |
//! | `POST` | `/auth/password-reset/confirm` | none |
//! | `POST` | `/auth/phone-verification/request` | bearer |
//! | `POST` | `/auth/phone-verification/confirm` | bearer |

use axum::{Json, extract::State, http::StatusCode};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use nivaran_core::{
  account::{Gender, NewAccount, OtpKind, Role},
  store::GrievanceStore,
};

use crate::{
  AppState,
  auth::{Identity, check_password_strength, hash_password, issue_token, verify_password},
  error::{ApiError, FieldError},
  handlers::AccountView,
  otp,
};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
  pub token:   String,
  pub account: AccountView,
}

// ─── Register ─────────────────────────────────────────────────────────────────

/// All fields optional at the serde level so one response can report every
/// missing or malformed field at once.
#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub first_name:      Option<String>,
  pub middle_name:     Option<String>,
  pub last_name:       Option<String>,
  pub gender:          Option<String>,
  pub dob:             Option<String>,
  pub primary_contact: Option<String>,
  pub email:           Option<String>,
  pub password:        Option<String>,
}

fn require<'a>(
  errors: &mut Vec<FieldError>,
  field: &str,
  value: &'a Option<String>,
) -> Option<&'a str> {
  match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
    Some(v) => Some(v),
    None => {
      errors.push(FieldError {
        field:   field.to_string(),
        message: format!("{field} is required"),
      });
      None
    }
  }
}

pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let mut errors = Vec::new();

  let first_name = require(&mut errors, "first_name", &body.first_name);
  let last_name = require(&mut errors, "last_name", &body.last_name);
  let email = require(&mut errors, "email", &body.email);
  let primary_contact = require(&mut errors, "primary_contact", &body.primary_contact);
  let password = require(&mut errors, "password", &body.password);

  let gender = require(&mut errors, "gender", &body.gender).and_then(|g| {
    let parsed = Gender::parse(g);
    if parsed.is_none() {
      errors.push(FieldError {
        field:   "gender".to_string(),
        message: "gender must be one of male, female, transgender, other".to_string(),
      });
    }
    parsed
  });
  let dob = require(&mut errors, "dob", &body.dob).and_then(|d| {
    let parsed = NaiveDate::parse_from_str(d, "%Y-%m-%d").ok();
    if parsed.is_none() {
      errors.push(FieldError {
        field:   "dob".to_string(),
        message: "date of birth must be a valid YYYY-MM-DD date".to_string(),
      });
    }
    parsed
  });

  if let Some(email) = email
    && !email.contains('@')
  {
    errors.push(FieldError {
      field:   "email".to_string(),
      message: "email must be a valid address".to_string(),
    });
  }
  if let Some(contact) = primary_contact
    && contact.chars().filter(|c| c.is_ascii_digit()).count() < 10
  {
    errors.push(FieldError {
      field:   "primary_contact".to_string(),
      message: "primary contact must be a valid phone number".to_string(),
    });
  }
  if let Some(password) = password
    && let Err(ApiError::Validation(mut field_errors)) =
      check_password_strength(password)
  {
    errors.append(&mut field_errors);
  }

  if !errors.is_empty() {
    return Err(ApiError::Validation(errors));
  }
  // All Somes past this point; the emptiness check above guarantees it.
  let (Some(first_name), Some(last_name), Some(email), Some(contact), Some(password), Some(gender), Some(dob)) =
    (first_name, last_name, email, primary_contact, password, gender, dob)
  else {
    return Err(ApiError::Internal("register validation desync".into()));
  };

  let account = state
    .store
    .create_account(NewAccount {
      first_name:      first_name.to_string(),
      middle_name:     body.middle_name.clone().filter(|m| !m.trim().is_empty()),
      last_name:       last_name.to_string(),
      gender,
      dob,
      primary_contact: contact.to_string(),
      email:           email.to_string(),
      password_hash:   hash_password(password)?,
      role:            Role::Citizen,
    })
    .await?;

  let token = issue_token(&state.jwt, &account, state.config.token_expiry_hours)?;
  tracing::info!(account_id = %account.account_id, "account registered");
  Ok((
    StatusCode::CREATED,
    Json(AuthResponse {
      token,
      account: AccountView::from(&account),
    }),
  ))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Email address or primary contact number.
  pub identifier: String,
  pub password:   String,
}

pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<AuthResponse>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let account = state
    .store
    .find_account_by_identifier(body.identifier.trim())
    .await?
    .ok_or_else(|| ApiError::NotFound("no account matches that identifier".to_string()))?;

  if !account.is_active {
    return Err(ApiError::Unauthorized("account is deactivated".to_string()));
  }
  if !verify_password(&body.password, &account.password_hash) {
    return Err(ApiError::Unauthorized("incorrect password".to_string()));
  }

  let token = issue_token(&state.jwt, &account, state.config.token_expiry_hours)?;
  Ok(Json(AuthResponse {
    token,
    account: AccountView::from(&account),
  }))
}

// ─── Password reset ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ResetRequestBody {
  pub identifier: String,
}

pub async fn password_reset_request<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ResetRequestBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let account = state
    .store
    .find_account_by_identifier(body.identifier.trim())
    .await?
    .ok_or_else(|| ApiError::NotFound("no account matches that identifier".to_string()))?;

  let challenge = otp::generate_challenge();
  state
    .store
    .set_otp(account.account_id, OtpKind::PasswordReset, Some(challenge.clone()))
    .await?;

  // Delivery is best-effort: the code stays valid even if the SMS fails.
  if let Some(sms) = &state.dispatcher.sms {
    if let Err(e) = sms.send(
      &account.primary_contact,
      &format!("Your Nivaran password reset code is {}", challenge.code),
    ) {
      tracing::warn!(error = %e, account_id = %account.account_id, "reset otp sms failed");
    }
  }

  Ok(Json(json!({ "message": "a reset code has been sent" })))
}

#[derive(Debug, Deserialize)]
pub struct ResetConfirmBody {
  pub identifier:   String,
  pub code:         String,
  pub new_password: String,
}

pub async fn password_reset_confirm<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<ResetConfirmBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let account = state
    .store
    .find_account_by_identifier(body.identifier.trim())
    .await?
    .ok_or_else(|| ApiError::NotFound("no account matches that identifier".to_string()))?;

  let valid = account
    .password_reset_otp
    .as_ref()
    .is_some_and(|c| c.matches(&body.code, Utc::now()));
  if !valid {
    return Err(ApiError::Unauthorized("invalid or expired code".to_string()));
  }

  check_password_strength(&body.new_password)?;
  state
    .store
    .set_password_hash(account.account_id, hash_password(&body.new_password)?)
    .await?;
  // Single use.
  state
    .store
    .set_otp(account.account_id, OtpKind::PasswordReset, None)
    .await?;

  Ok(Json(json!({ "message": "password updated" })))
}

// ─── Phone verification ───────────────────────────────────────────────────────

pub async fn phone_verification_request<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let challenge = otp::generate_challenge();
  state
    .store
    .set_otp(
      account.account_id,
      OtpKind::PhoneVerification,
      Some(challenge.clone()),
    )
    .await?;

  if let Some(sms) = &state.dispatcher.sms {
    if let Err(e) = sms.send(
      &account.primary_contact,
      &format!("Your Nivaran verification code is {}", challenge.code),
    ) {
      tracing::warn!(error = %e, account_id = %account.account_id, "verification otp sms failed");
    }
  }

  Ok(Json(json!({ "message": "a verification code has been sent" })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyConfirmBody {
  pub code: String,
}

pub async fn phone_verification_confirm<S>(
  State(state): State<AppState<S>>,
  Identity(account): Identity,
  Json(body): Json<VerifyConfirmBody>,
) -> Result<Json<serde_json::Value>, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let valid = account
    .phone_verification_otp
    .as_ref()
    .is_some_and(|c| c.matches(&body.code, Utc::now()));
  if !valid {
    return Err(ApiError::Unauthorized("invalid or expired code".to_string()));
  }

  state
    .store
    .set_phone_verified(account.account_id, true)
    .await?;
  state
    .store
    .set_otp(account.account_id, OtpKind::PhoneVerification, None)
    .await?;

  Ok(Json(json!({ "message": "phone number verified" })))
}
