//! Best-effort notification dispatch.
//!
//! Grievance mutations commit first and hand a [`NotificationIntent`] to the
//! dispatcher afterwards. Dispatch never fails the triggering operation:
//! channel errors are logged at `warn` and recorded in the returned
//! [`DispatchSummary`], and the in-app inbox record is written regardless of
//! outbound outcomes.

use std::sync::Arc;

use thiserror::Error;

use nivaran_core::{
  notification::{Channel, NewNotification, NotificationIntent},
  store::GrievanceStore,
};

#[derive(Debug, Error)]
pub enum ChannelError {
  #[error("provider error: {0}")]
  Provider(String),
}

// ─── Channel traits ──────────────────────────────────────────────────────────

pub trait EmailChannel: Send + Sync {
  fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError>;
}

pub trait SmsChannel: Send + Sync {
  fn send(&self, to: &str, body: &str) -> Result<(), ChannelError>;
}

pub trait PushChannel: Send + Sync {
  fn send(&self, token: &str, title: &str, body: &str) -> Result<(), ChannelError>;
}

// ─── Logging implementations ─────────────────────────────────────────────────

// Provider wiring is deployment-specific; these stand-ins log the send so the
// dispatch path is fully exercised without external credentials.

pub struct LogEmail {
  pub sender: String,
}

impl EmailChannel for LogEmail {
  fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ChannelError> {
    tracing::info!(from = %self.sender, %to, %subject, %body, "email send");
    Ok(())
  }
}

pub struct LogSms {
  pub sender: String,
}

impl SmsChannel for LogSms {
  fn send(&self, to: &str, body: &str) -> Result<(), ChannelError> {
    tracing::info!(from = %self.sender, %to, %body, "sms send");
    Ok(())
  }
}

pub struct LogPush;

impl PushChannel for LogPush {
  fn send(&self, token: &str, title: &str, body: &str) -> Result<(), ChannelError> {
    tracing::info!(%token, %title, %body, "push send");
    Ok(())
  }
}

// ─── Dispatcher ──────────────────────────────────────────────────────────────

/// Per-channel outcome of one dispatch event. `None` means the channel was
/// not configured or not applicable (e.g. no push token on the account).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct DispatchSummary {
  pub email:          Option<bool>,
  pub sms:            Option<bool>,
  pub push:           Option<bool>,
  pub inapp_recorded: bool,
}

pub struct Dispatcher {
  pub email: Option<Arc<dyn EmailChannel>>,
  pub sms:   Option<Arc<dyn SmsChannel>>,
  pub push:  Option<Arc<dyn PushChannel>>,
}

impl Dispatcher {
  /// A dispatcher with no outbound channels; only the inbox record is written.
  pub fn inapp_only() -> Self {
    Self {
      email: None,
      sms:   None,
      push:  None,
    }
  }

  /// Deliver `intent` to the recipient over every configured channel and
  /// record it in the in-app inbox. Infallible by design.
  pub async fn dispatch<S>(&self, store: &S, intent: NotificationIntent) -> DispatchSummary
  where
    S: GrievanceStore,
  {
    let mut summary = DispatchSummary::default();

    let account = match store.find_account(intent.account_id).await {
      Ok(Some(account)) => account,
      Ok(None) => {
        tracing::warn!(account_id = %intent.account_id, "notification recipient missing");
        return summary;
      }
      Err(e) => {
        tracing::warn!(error = %e, "notification recipient lookup failed");
        return summary;
      }
    };

    if let Some(email) = &self.email {
      summary.email = Some(
        match email.send(&account.email, &intent.title, &intent.message) {
          Ok(()) => true,
          Err(e) => {
            tracing::warn!(error = %e, account_id = %account.account_id, "email dispatch failed");
            false
          }
        },
      );
    }

    if let Some(sms) = &self.sms {
      summary.sms = Some(
        match sms.send(&account.primary_contact, &intent.message) {
          Ok(()) => true,
          Err(e) => {
            tracing::warn!(error = %e, account_id = %account.account_id, "sms dispatch failed");
            false
          }
        },
      );
    }

    if let (Some(push), Some(token)) = (&self.push, &account.push_token) {
      summary.push = Some(match push.send(token, &intent.title, &intent.message) {
        Ok(()) => true,
        Err(e) => {
          tracing::warn!(error = %e, account_id = %account.account_id, "push dispatch failed");
          false
        }
      });
    }

    // The inbox record reflects the primary channel attempted.
    let channel = if self.email.is_some() {
      Channel::Email
    } else if self.sms.is_some() {
      Channel::Sms
    } else if summary.push.is_some() {
      Channel::Push
    } else {
      Channel::Inapp
    };

    let record = NewNotification {
      account_id: intent.account_id,
      channel,
      title: intent.title,
      message: intent.message,
      meta: intent.meta,
    };
    match store.record_notification(record).await {
      Ok(_) => summary.inapp_recorded = true,
      Err(e) => {
        tracing::warn!(error = %e, "in-app notification record failed");
      }
    }

    summary
  }
}
