//! One-time-password generation for the reset and phone-verification flows.

use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};

use nivaran_core::account::OtpChallenge;

/// Codes stay valid for ten minutes and are cleared after one successful use.
pub const OTP_TTL_MINUTES: i64 = 10;

/// A fresh 6-digit challenge.
pub fn generate_challenge() -> OtpChallenge {
  let mut bytes = [0u8; 4];
  OsRng.fill_bytes(&mut bytes);
  let code = u32::from_le_bytes(bytes) % 1_000_000;
  OtpChallenge {
    code:       format!("{code:06}"),
    expires_at: Utc::now() + Duration::minutes(OTP_TTL_MINUTES),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn challenge_is_six_digits() {
    for _ in 0..32 {
      let c = generate_challenge();
      assert_eq!(c.code.len(), 6);
      assert!(c.code.bytes().all(|b| b.is_ascii_digit()));
    }
  }

  #[test]
  fn challenge_expires_in_the_future() {
    let c = generate_challenge();
    assert!(c.expires_at > Utc::now());
  }
}
