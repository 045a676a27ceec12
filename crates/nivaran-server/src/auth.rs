//! Password hashing, session tokens, and the authenticated-identity
//! extractors.
//!
//! Passwords are stored as argon2 PHC strings. Session tokens are HS256 JWTs
//! carrying `{sub, role, iat, exp}`; verification re-fetches the account so a
//! deactivated or deleted account is rejected even with a valid token.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use nivaran_core::{account::Account, store::GrievanceStore};

use crate::{AppState, error::ApiError};

// ─── Passwords ───────────────────────────────────────────────────────────────

pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Internal(format!("argon2 error: {e}").into()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// Minimum strength: 8+ characters with a letter, a digit, and a symbol.
pub fn check_password_strength(password: &str) -> Result<(), ApiError> {
  let long_enough = password.chars().count() >= 8;
  let has_letter = password.chars().any(|c| c.is_alphabetic());
  let has_digit = password.chars().any(|c| c.is_ascii_digit());
  let has_symbol = password.chars().any(|c| !c.is_alphanumeric());
  if long_enough && has_letter && has_digit && has_symbol {
    Ok(())
  } else {
    Err(ApiError::validation(
      "password",
      "password must be at least 8 characters and include a letter, a digit, and a symbol",
    ))
  }
}

// ─── Session tokens ──────────────────────────────────────────────────────────

/// Signing and verification keys derived from the configured secret.
pub struct JwtKeys {
  encoding: EncodingKey,
  decoding: DecodingKey,
}

impl JwtKeys {
  pub fn new(secret: &str) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
  pub sub:  Uuid,
  pub role: String,
  pub iat:  i64,
  pub exp:  i64,
}

pub fn issue_token(
  keys: &JwtKeys,
  account: &Account,
  expiry_hours: i64,
) -> Result<String, ApiError> {
  let now = Utc::now();
  let claims = Claims {
    sub:  account.account_id,
    role: account.role.as_str().to_string(),
    iat:  now.timestamp(),
    exp:  (now + Duration::hours(expiry_hours)).timestamp(),
  };
  jsonwebtoken::encode(&Header::default(), &claims, &keys.encoding)
    .map_err(|e| ApiError::Internal(Box::new(e)))
}

/// Decode and validate a token (signature + expiry). Does not touch storage.
pub fn decode_token(keys: &JwtKeys, token: &str) -> Result<Claims, ApiError> {
  jsonwebtoken::decode::<Claims>(token, &keys.decoding, &Validation::default())
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized("invalid or expired token".to_string()))
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// The authenticated account, re-fetched from the store on every request so
/// role changes and deactivation take effect immediately.
pub struct Identity(pub Account);

/// Optional variant for endpoints that accept anonymous callers. A present
/// but invalid token is still rejected.
pub struct MaybeIdentity(pub Option<Account>);

fn bearer_token(parts: &Parts) -> Option<&str> {
  parts
    .headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
}

async fn resolve_identity<S>(
  parts: &Parts,
  state: &AppState<S>,
) -> Result<Account, ApiError>
where
  S: GrievanceStore,
  ApiError: From<S::Error>,
{
  let token = bearer_token(parts).ok_or_else(ApiError::unauthorized)?;
  let claims = decode_token(&state.jwt, token)?;
  let account = state
    .store
    .find_account(claims.sub)
    .await?
    .ok_or_else(ApiError::unauthorized)?;
  if !account.is_active {
    return Err(ApiError::Unauthorized("account is deactivated".to_string()));
  }
  Ok(account)
}

impl<S> FromRequestParts<AppState<S>> for Identity
where
  S: GrievanceStore + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    resolve_identity(parts, state).await.map(Identity)
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeIdentity
where
  S: GrievanceStore + Send + Sync + 'static,
  ApiError: From<S::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if bearer_token(parts).is_none() {
      return Ok(MaybeIdentity(None));
    }
    resolve_identity(parts, state)
      .await
      .map(|a| MaybeIdentity(Some(a)))
  }
}
