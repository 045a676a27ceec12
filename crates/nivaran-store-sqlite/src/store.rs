//! [`SqliteStore`] — the SQLite implementation of [`GrievanceStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use nivaran_core::{
  Error as CoreError,
  account::{Account, NewAccount, OtpChallenge, OtpKind, ProfileUpdate, Role},
  category::{Category, CategoryUpdate, NewCategory},
  grievance::{
    Grievance, GrievanceSummary, HistoryEntry, NewGrievance, Status,
    StatusSummary, SubmitterSnapshot, generate_grievance_id,
  },
  notification::{NewNotification, Notification},
  policy::ListScope,
  store::{GrievanceFilter, GrievanceStore},
};

use crate::{
  Error, Result,
  encode::{
    RawAccount, RawCategory, RawGrievance, RawHistoryEntry, RawNotification,
    RawSummary, encode_date, encode_dt, encode_string_list, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Column lists and row mappers ────────────────────────────────────────────

const ACCOUNT_COLS: &str = "account_id, first_name, middle_name, last_name, \
   gender, dob, primary_contact, secondary_contact, email, password_hash, \
   role, department, managed_categories, push_token, is_active, \
   is_phone_verified, reset_otp_code, reset_otp_expires, phone_otp_code, \
   phone_otp_expires, created_at, updated_at";

fn account_row(row: &rusqlite::Row) -> rusqlite::Result<RawAccount> {
  Ok(RawAccount {
    account_id:         row.get(0)?,
    first_name:         row.get(1)?,
    middle_name:        row.get(2)?,
    last_name:          row.get(3)?,
    gender:             row.get(4)?,
    dob:                row.get(5)?,
    primary_contact:    row.get(6)?,
    secondary_contact:  row.get(7)?,
    email:              row.get(8)?,
    password_hash:      row.get(9)?,
    role:               row.get(10)?,
    department:         row.get(11)?,
    managed_categories: row.get(12)?,
    push_token:         row.get(13)?,
    is_active:          row.get(14)?,
    is_phone_verified:  row.get(15)?,
    reset_otp_code:     row.get(16)?,
    reset_otp_expires:  row.get(17)?,
    phone_otp_code:     row.get(18)?,
    phone_otp_expires:  row.get(19)?,
    created_at:         row.get(20)?,
    updated_at:         row.get(21)?,
  })
}

const CATEGORY_COLS: &str =
  "category_id, name, key, description, is_active, created_at, updated_at";

fn category_row(row: &rusqlite::Row) -> rusqlite::Result<RawCategory> {
  Ok(RawCategory {
    category_id: row.get(0)?,
    name:        row.get(1)?,
    key:         row.get(2)?,
    description: row.get(3)?,
    is_active:   row.get(4)?,
    created_at:  row.get(5)?,
    updated_at:  row.get(6)?,
  })
}

const GRIEVANCE_COLS: &str = "grievance_id, user_id, created_by_name, \
   created_by_email, created_by_contact, category_key, category_name, title, \
   description, attachments, status, priority, location, assigned_to, \
   is_anonymous, created_at, updated_at";

fn grievance_row(row: &rusqlite::Row) -> rusqlite::Result<RawGrievance> {
  Ok(RawGrievance {
    grievance_id:       row.get(0)?,
    user_id:            row.get(1)?,
    created_by_name:    row.get(2)?,
    created_by_email:   row.get(3)?,
    created_by_contact: row.get(4)?,
    category_key:       row.get(5)?,
    category_name:      row.get(6)?,
    title:              row.get(7)?,
    description:        row.get(8)?,
    attachments:        row.get(9)?,
    status:             row.get(10)?,
    priority:           row.get(11)?,
    location:           row.get(12)?,
    assigned_to:        row.get(13)?,
    is_anonymous:       row.get(14)?,
    created_at:         row.get(15)?,
    updated_at:         row.get(16)?,
  })
}

const NOTIFICATION_COLS: &str = "notification_id, account_id, channel, title, \
   message, meta, is_read, created_at";

fn notification_row(row: &rusqlite::Row) -> rusqlite::Result<RawNotification> {
  Ok(RawNotification {
    notification_id: row.get(0)?,
    account_id:      row.get(1)?,
    channel:         row.get(2)?,
    title:           row.get(3)?,
    message:         row.get(4)?,
    meta:            row.get(5)?,
    is_read:         row.get(6)?,
    created_at:      row.get(7)?,
  })
}

/// Build the scope predicate for listing queries. Returns `None` for
/// [`ListScope::Nothing`] (caller short-circuits to an empty result).
fn scope_condition(scope: &ListScope, params: &mut Vec<String>) -> Option<String> {
  match scope {
    ListScope::All => Some(String::new()),
    ListScope::Nothing => None,
    ListScope::Owner(id) => {
      params.push(encode_uuid(*id));
      Some(format!("g.user_id = ?{}", params.len()))
    }
    ListScope::Categories(keys) => {
      let placeholders: Vec<String> = keys
        .iter()
        .map(|key| {
          params.push(key.clone());
          format!("?{}", params.len())
        })
        .collect();
      Some(format!("g.category_key IN ({})", placeholders.join(", ")))
    }
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Nivaran store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single UPDATE against an account; 0 affected rows means the
  /// account does not exist.
  async fn account_update(
    &self,
    id: Uuid,
    sql: &'static str,
    params: Vec<Option<String>>,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        let mut all: Vec<Option<String>> = params;
        all.push(Some(id_str));
        Ok(conn.execute(sql, rusqlite::params_from_iter(all.iter()))?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::AccountNotFound(id));
    }
    Ok(())
  }

  /// Insert a fully-built [`Grievance`] into the `grievances` table.
  async fn insert_grievance(&self, grievance: &Grievance) -> Result<()> {
    let grievance_id = grievance.grievance_id.clone();
    let user_id = grievance.user_id.map(encode_uuid);
    let created_by_name = grievance.created_by.name.clone();
    let created_by_email = grievance.created_by.email.clone();
    let created_by_contact = grievance.created_by.primary_contact.clone();
    let category_key = grievance.category.key.clone();
    let category_name = grievance.category.name.clone();
    let title = grievance.title.clone();
    let description = grievance.description.clone();
    let attachments = encode_string_list(&grievance.attachments)?;
    let status = grievance.status.as_str().to_owned();
    let priority = grievance.priority.as_str().to_owned();
    let location = grievance.location.clone();
    let assigned_to = grievance.assigned_to.map(encode_uuid);
    let is_anonymous = grievance.is_anonymous;
    let created_at = encode_dt(grievance.created_at);
    let updated_at = encode_dt(grievance.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO grievances (
             grievance_id, user_id, created_by_name, created_by_email,
             created_by_contact, category_key, category_name, title,
             description, attachments, status, priority, location,
             assigned_to, is_anonymous, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17)",
          rusqlite::params![
            grievance_id,
            user_id,
            created_by_name,
            created_by_email,
            created_by_contact,
            category_key,
            category_name,
            title,
            description,
            attachments,
            status,
            priority,
            location,
            assigned_to,
            is_anonymous,
            created_at,
            updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── GrievanceStore impl ─────────────────────────────────────────────────────

impl GrievanceStore for SqliteStore {
  type Error = Error;

  // ── Accounts ──────────────────────────────────────────────────────────────

  async fn create_account(&self, input: NewAccount) -> Result<Account> {
    let now = Utc::now();
    let account = Account {
      account_id:             Uuid::new_v4(),
      first_name:             input.first_name,
      middle_name:            input.middle_name,
      last_name:              input.last_name,
      gender:                 input.gender,
      dob:                    input.dob,
      primary_contact:        input.primary_contact,
      secondary_contact:      None,
      email:                  input.email,
      password_hash:          input.password_hash,
      role:                   input.role,
      department:             None,
      managed_categories:     Vec::new(),
      push_token:             None,
      is_active:              true,
      is_phone_verified:      false,
      password_reset_otp:     None,
      phone_verification_otp: None,
      created_at:             now,
      updated_at:             now,
    };

    // Pre-check so the caller learns which identifier clashed; the UNIQUE
    // constraints remain the backstop for races.
    let email = account.email.clone();
    let contact = account.primary_contact.clone();
    let clash: Option<(bool, bool)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT email = ?1, primary_contact = ?2 FROM accounts
               WHERE email = ?1 OR primary_contact = ?2 LIMIT 1",
              rusqlite::params![email, contact],
              |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?,
        )
      })
      .await?;
    if let Some((email_taken, _)) = clash {
      let which = if email_taken { "email" } else { "primary contact" };
      return Err(Error::Core(CoreError::Conflict(which.to_string())));
    }

    let id_str = encode_uuid(account.account_id);
    let first_name = account.first_name.clone();
    let middle_name = account.middle_name.clone();
    let last_name = account.last_name.clone();
    let gender = account.gender.as_str().to_owned();
    let dob = encode_date(account.dob);
    let primary_contact = account.primary_contact.clone();
    let email = account.email.clone();
    let password_hash = account.password_hash.clone();
    let role = account.role.as_str().to_owned();
    let at_str = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO accounts (
             account_id, first_name, middle_name, last_name, gender, dob,
             primary_contact, email, password_hash, role,
             managed_categories, is_active, is_phone_verified,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, '[]', 1, 0,
                     ?11, ?11)",
          rusqlite::params![
            id_str,
            first_name,
            middle_name,
            last_name,
            gender,
            dob,
            primary_contact,
            email,
            password_hash,
            role,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from);
    match inserted {
      Ok(()) => Ok(account),
      Err(e) if e.is_unique_violation() => Err(Error::Core(CoreError::Conflict(
        "email or primary contact".to_string(),
      ))),
      Err(e) => Err(e),
    }
  }

  async fn find_account(&self, id: Uuid) -> Result<Option<Account>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {ACCOUNT_COLS} FROM accounts WHERE account_id = ?1"),
              rusqlite::params![id_str],
              account_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAccount::into_account).transpose()
  }

  async fn find_account_by_identifier(
    &self,
    identifier: &str,
  ) -> Result<Option<Account>> {
    let ident = identifier.to_owned();
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACCOUNT_COLS} FROM accounts
                 WHERE email = ?1 OR primary_contact = ?1"
              ),
              rusqlite::params![ident],
              account_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAccount::into_account).transpose()
  }

  async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<Account> {
    let mut account = self
      .find_account(id)
      .await?
      .ok_or(Error::AccountNotFound(id))?;

    if let Some(v) = update.first_name {
      account.first_name = v;
    }
    if let Some(v) = update.middle_name {
      account.middle_name = v;
    }
    if let Some(v) = update.last_name {
      account.last_name = v;
    }
    if let Some(v) = update.gender {
      account.gender = v;
    }
    if let Some(v) = update.dob {
      account.dob = v;
    }
    if let Some(v) = update.primary_contact {
      account.primary_contact = v;
    }
    if let Some(v) = update.secondary_contact {
      account.secondary_contact = v;
    }
    if let Some(v) = update.email {
      account.email = v;
    }
    account.updated_at = Utc::now();

    let id_str = encode_uuid(id);
    let first_name = account.first_name.clone();
    let middle_name = account.middle_name.clone();
    let last_name = account.last_name.clone();
    let gender = account.gender.as_str().to_owned();
    let dob = encode_date(account.dob);
    let primary_contact = account.primary_contact.clone();
    let secondary_contact = account.secondary_contact.clone();
    let email = account.email.clone();
    let updated_at = encode_dt(account.updated_at);

    let written = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET first_name = ?1, middle_name = ?2,
             last_name = ?3, gender = ?4, dob = ?5, primary_contact = ?6,
             secondary_contact = ?7, email = ?8, updated_at = ?9
           WHERE account_id = ?10",
          rusqlite::params![
            first_name,
            middle_name,
            last_name,
            gender,
            dob,
            primary_contact,
            secondary_contact,
            email,
            updated_at,
            id_str,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from);
    match written {
      Ok(()) => Ok(account),
      Err(e) if e.is_unique_violation() => Err(Error::Core(CoreError::Conflict(
        "email or primary contact".to_string(),
      ))),
      Err(e) => Err(e),
    }
  }

  async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
    self
      .account_update(
        id,
        "UPDATE accounts SET password_hash = ?1, updated_at = ?2
         WHERE account_id = ?3",
        vec![Some(password_hash), Some(encode_dt(Utc::now()))],
      )
      .await
  }

  async fn set_otp(
    &self,
    id: Uuid,
    kind: OtpKind,
    challenge: Option<OtpChallenge>,
  ) -> Result<()> {
    let (code, expires) = match challenge {
      Some(c) => (Some(c.code), Some(encode_dt(c.expires_at))),
      None => (None, None),
    };
    let sql = match kind {
      OtpKind::PasswordReset => {
        "UPDATE accounts SET reset_otp_code = ?1, reset_otp_expires = ?2,
           updated_at = ?3 WHERE account_id = ?4"
      }
      OtpKind::PhoneVerification => {
        "UPDATE accounts SET phone_otp_code = ?1, phone_otp_expires = ?2,
           updated_at = ?3 WHERE account_id = ?4"
      }
    };
    self
      .account_update(id, sql, vec![code, expires, Some(encode_dt(Utc::now()))])
      .await
  }

  async fn set_phone_verified(&self, id: Uuid, verified: bool) -> Result<()> {
    let flag = if verified { "1" } else { "0" };
    self
      .account_update(
        id,
        "UPDATE accounts SET is_phone_verified = ?1, updated_at = ?2
         WHERE account_id = ?3",
        vec![Some(flag.to_string()), Some(encode_dt(Utc::now()))],
      )
      .await
  }

  async fn set_push_token(&self, id: Uuid, token: Option<String>) -> Result<()> {
    self
      .account_update(
        id,
        "UPDATE accounts SET push_token = ?1, updated_at = ?2
         WHERE account_id = ?3",
        vec![token, Some(encode_dt(Utc::now()))],
      )
      .await
  }

  async fn set_role(
    &self,
    id: Uuid,
    role: Role,
    managed_categories: Vec<String>,
    department: Option<String>,
  ) -> Result<Account> {
    let managed = encode_string_list(&managed_categories)?;
    self
      .account_update(
        id,
        "UPDATE accounts SET role = ?1, managed_categories = ?2,
           department = ?3, updated_at = ?4 WHERE account_id = ?5",
        vec![
          Some(role.as_str().to_owned()),
          Some(managed),
          department,
          Some(encode_dt(Utc::now())),
        ],
      )
      .await?;
    self
      .find_account(id)
      .await?
      .ok_or(Error::AccountNotFound(id))
  }

  async fn list_officials(&self) -> Result<Vec<Account>> {
    let raws: Vec<RawAccount> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACCOUNT_COLS} FROM accounts
           WHERE role IN ('official', 'staff', 'admin') AND is_active = 1
           ORDER BY first_name, last_name"
        ))?;
        let rows = stmt
          .query_map([], account_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAccount::into_account).collect()
  }

  // ── Categories ────────────────────────────────────────────────────────────

  async fn create_category(&self, input: NewCategory) -> Result<Category> {
    let now = Utc::now();
    let category = Category {
      category_id: Uuid::new_v4(),
      name:        input.name,
      key:         input.key,
      description: input.description,
      is_active:   true,
      created_at:  now,
      updated_at:  now,
    };

    let id_str = encode_uuid(category.category_id);
    let name = category.name.clone();
    let key = category.key.clone();
    let description = category.description.clone();
    let at_str = encode_dt(now);

    let inserted = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO categories (category_id, name, key, description,
             is_active, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, 1, ?5, ?5)",
          rusqlite::params![id_str, name, key, description, at_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from);
    match inserted {
      Ok(()) => Ok(category),
      Err(e) if e.is_unique_violation() => Err(Error::Core(CoreError::Conflict(
        "category name or key".to_string(),
      ))),
      Err(e) => Err(e),
    }
  }

  async fn get_category(&self, id: Uuid) -> Result<Option<Category>> {
    let id_str = encode_uuid(id);
    let raw: Option<RawCategory> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CATEGORY_COLS} FROM categories WHERE category_id = ?1"),
              rusqlite::params![id_str],
              category_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCategory::into_category).transpose()
  }

  async fn list_categories(&self, active_only: bool) -> Result<Vec<Category>> {
    let raws: Vec<RawCategory> = self
      .conn
      .call(move |conn| {
        let sql = if active_only {
          format!(
            "SELECT {CATEGORY_COLS} FROM categories WHERE is_active = 1 ORDER BY name"
          )
        } else {
          format!("SELECT {CATEGORY_COLS} FROM categories ORDER BY name")
        };
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], category_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawCategory::into_category).collect()
  }

  async fn update_category(&self, id: Uuid, update: CategoryUpdate) -> Result<Category> {
    let mut category = self
      .get_category(id)
      .await?
      .ok_or(Error::CategoryNotFound(id))?;

    if let Some(v) = update.name {
      category.name = v;
    }
    if let Some(v) = update.description {
      category.description = Some(v);
    }
    if let Some(v) = update.is_active {
      category.is_active = v;
    }
    category.updated_at = Utc::now();

    let id_str = encode_uuid(id);
    let name = category.name.clone();
    let description = category.description.clone();
    let is_active = category.is_active;
    let updated_at = encode_dt(category.updated_at);

    let written = self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE categories SET name = ?1, description = ?2, is_active = ?3,
             updated_at = ?4 WHERE category_id = ?5",
          rusqlite::params![name, description, is_active, updated_at, id_str],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::from);
    match written {
      Ok(()) => Ok(category),
      Err(e) if e.is_unique_violation() => {
        Err(Error::Core(CoreError::Conflict("category name".to_string())))
      }
      Err(e) => Err(e),
    }
  }

  async fn deactivate_category(&self, id: Uuid) -> Result<Category> {
    self
      .update_category(
        id,
        CategoryUpdate {
          is_active: Some(false),
          ..CategoryUpdate::default()
        },
      )
      .await
  }

  // ── Grievances ────────────────────────────────────────────────────────────

  async fn create_grievance(&self, input: NewGrievance) -> Result<Grievance> {
    let now = Utc::now();
    // Anonymity invariant: no account reference, placeholder snapshot.
    let (user_id, created_by) = if input.is_anonymous {
      (None, SubmitterSnapshot::anonymous())
    } else {
      (input.user_id, input.created_by)
    };

    // The UNIQUE constraint on grievance_id is the real uniqueness guard;
    // regenerate and retry on the (improbable) collision.
    for _ in 0..3 {
      let grievance = Grievance {
        grievance_id: generate_grievance_id(),
        user_id,
        created_by: created_by.clone(),
        category: input.category.clone(),
        title: input.title.clone(),
        description: input.description.clone(),
        attachments: input.attachments.clone(),
        status: Status::Submitted,
        priority: input.priority,
        location: input.location.clone(),
        assigned_to: None,
        is_anonymous: input.is_anonymous,
        created_at: now,
        updated_at: now,
      };

      match self.insert_grievance(&grievance).await {
        Ok(()) => return Ok(grievance),
        Err(e) if e.is_unique_violation() => continue,
        Err(e) => return Err(e),
      }
    }
    Err(Error::GrievanceIdExhausted)
  }

  async fn get_grievance(&self, grievance_id: &str) -> Result<Option<Grievance>> {
    let gid = grievance_id.to_owned();
    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {GRIEVANCE_COLS} FROM grievances WHERE grievance_id = ?1"),
              rusqlite::params![gid],
              grievance_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawGrievance::into_grievance).transpose()
  }

  async fn list_grievances(
    &self,
    scope: ListScope,
    filter: GrievanceFilter,
  ) -> Result<Vec<GrievanceSummary>> {
    let mut params: Vec<String> = Vec::new();
    let Some(scope_cond) = scope_condition(&scope, &mut params) else {
      return Ok(Vec::new());
    };

    let mut conds: Vec<String> = Vec::new();
    if !scope_cond.is_empty() {
      conds.push(scope_cond);
    }
    if let Some(status) = filter.status {
      params.push(status.as_str().to_owned());
      conds.push(format!("g.status = ?{}", params.len()));
    }
    let where_clause = if conds.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", conds.join(" AND "))
    };
    let limit = filter.limit.unwrap_or(100);
    let offset = filter.offset.unwrap_or(0);

    let sql = format!(
      "SELECT g.grievance_id, g.title, g.category_key, g.category_name,
              g.status, g.priority, a.first_name, a.last_name, g.created_at
       FROM grievances g
       LEFT JOIN accounts a ON a.account_id = g.assigned_to
       {where_clause}
       ORDER BY g.created_at DESC, g.rowid DESC
       LIMIT {limit} OFFSET {offset}"
    );

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok(RawSummary {
              grievance_id:   row.get(0)?,
              title:          row.get(1)?,
              category_key:   row.get(2)?,
              category_name:  row.get(3)?,
              status:         row.get(4)?,
              priority:       row.get(5)?,
              assignee_first: row.get(6)?,
              assignee_last:  row.get(7)?,
              created_at:     row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn get_history(&self, grievance_id: &str) -> Result<Vec<HistoryEntry>> {
    let gid = grievance_id.to_owned();
    let raws: Vec<RawHistoryEntry> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT h.entry_id, h.grievance_id, h.old_status, h.new_status,
                  h.actor_id, a.first_name, a.last_name, h.note, h.is_comment,
                  h.created_at
           FROM status_history h
           LEFT JOIN accounts a ON a.account_id = h.actor_id
           WHERE h.grievance_id = ?1
           ORDER BY h.created_at DESC, h.rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![gid], |row| {
            Ok(RawHistoryEntry {
              entry_id:     row.get(0)?,
              grievance_id: row.get(1)?,
              old_status:   row.get(2)?,
              new_status:   row.get(3)?,
              actor_id:     row.get(4)?,
              actor_first:  row.get(5)?,
              actor_last:   row.get(6)?,
              note:         row.get(7)?,
              is_comment:   row.get(8)?,
              created_at:   row.get(9)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawHistoryEntry::into_entry).collect()
  }

  /// No transition table is enforced here: any status is accepted from any
  /// current status (assignment is the one forced transition, below).
  async fn update_status(
    &self,
    grievance_id: &str,
    new_status: Status,
    actor: Uuid,
    note: Option<String>,
  ) -> Result<Grievance> {
    let gid = grievance_id.to_owned();
    let now_str = encode_dt(Utc::now());
    let entry_id = encode_uuid(Uuid::new_v4());
    let actor_str = encode_uuid(actor);
    let status_str = new_status.as_str().to_owned();

    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {GRIEVANCE_COLS} FROM grievances WHERE grievance_id = ?1"),
            rusqlite::params![gid],
            grievance_row,
          )
          .optional()?;
        let Some(mut raw) = raw else {
          return Ok(None);
        };
        let old_status = raw.status.clone();

        conn.execute(
          "UPDATE grievances SET status = ?1, updated_at = ?2 WHERE grievance_id = ?3",
          rusqlite::params![status_str, now_str, gid],
        )?;
        conn.execute(
          "INSERT INTO status_history (entry_id, grievance_id, old_status,
             new_status, actor_id, note, is_comment, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
          rusqlite::params![entry_id, gid, old_status, status_str, actor_str, note, now_str],
        )?;

        raw.status = status_str;
        raw.updated_at = now_str;
        Ok(Some(raw))
      })
      .await?;
    raw
      .ok_or_else(|| Error::GrievanceNotFound(grievance_id.to_owned()))?
      .into_grievance()
  }

  async fn assign_official(
    &self,
    grievance_id: &str,
    official_id: Uuid,
    actor: Uuid,
  ) -> Result<Grievance> {
    let official = self
      .find_account(official_id)
      .await?
      .ok_or(Error::AccountNotFound(official_id))?;

    let gid = grievance_id.to_owned();
    let now_str = encode_dt(Utc::now());
    let entry_id = encode_uuid(Uuid::new_v4());
    let actor_str = encode_uuid(actor);
    let official_str = encode_uuid(official_id);
    let note = format!("Assigned to {}", official.display_name());

    let raw: Option<RawGrievance> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!("SELECT {GRIEVANCE_COLS} FROM grievances WHERE grievance_id = ?1"),
            rusqlite::params![gid],
            grievance_row,
          )
          .optional()?;
        let Some(mut raw) = raw else {
          return Ok(None);
        };
        let old_status = raw.status.clone();

        // Assignment always forces the status, whatever it was before.
        conn.execute(
          "UPDATE grievances SET assigned_to = ?1, status = 'Assigned',
             updated_at = ?2 WHERE grievance_id = ?3",
          rusqlite::params![official_str, now_str, gid],
        )?;
        conn.execute(
          "INSERT INTO status_history (entry_id, grievance_id, old_status,
             new_status, actor_id, note, is_comment, created_at)
           VALUES (?1, ?2, ?3, 'Assigned', ?4, ?5, 0, ?6)",
          rusqlite::params![entry_id, gid, old_status, actor_str, note, now_str],
        )?;

        raw.assigned_to = Some(official_str);
        raw.status = "Assigned".to_owned();
        raw.updated_at = now_str;
        Ok(Some(raw))
      })
      .await?;
    raw
      .ok_or_else(|| Error::GrievanceNotFound(grievance_id.to_owned()))?
      .into_grievance()
  }

  async fn add_comment(
    &self,
    grievance_id: &str,
    actor: Uuid,
    text: String,
  ) -> Result<HistoryEntry> {
    let gid = grievance_id.to_owned();
    let now_str = encode_dt(Utc::now());
    let created_at = now_str.clone();
    let entry_id = encode_uuid(Uuid::new_v4());
    let actor_str = encode_uuid(actor);
    let note = text.clone();

    let entry_id_param = entry_id.clone();
    let row: Option<(String, Option<String>, Option<String>)> = self
      .conn
      .call(move |conn| {
        let status: Option<String> = conn
          .query_row(
            "SELECT status FROM grievances WHERE grievance_id = ?1",
            rusqlite::params![gid],
            |row| row.get(0),
          )
          .optional()?;
        let Some(status) = status else {
          return Ok(None);
        };

        let actor_name: Option<(String, String)> = conn
          .query_row(
            "SELECT first_name, last_name FROM accounts WHERE account_id = ?1",
            rusqlite::params![actor_str],
            |row| Ok((row.get(0)?, row.get(1)?)),
          )
          .optional()?;

        // A comment is a no-op transition: old == new, is_comment set.
        conn.execute(
          "INSERT INTO status_history (entry_id, grievance_id, old_status,
             new_status, actor_id, note, is_comment, created_at)
           VALUES (?1, ?2, ?3, ?3, ?4, ?5, 1, ?6)",
          rusqlite::params![entry_id_param, gid, status, actor_str, note, now_str],
        )?;

        let (first, last) = match actor_name {
          Some((f, l)) => (Some(f), Some(l)),
          None => (None, None),
        };
        Ok(Some((status, first, last)))
      })
      .await?;

    let (status, first, last) =
      row.ok_or_else(|| Error::GrievanceNotFound(grievance_id.to_owned()))?;
    RawHistoryEntry {
      entry_id,
      grievance_id: grievance_id.to_owned(),
      old_status: Some(status.clone()),
      new_status: status,
      actor_id: Some(encode_uuid(actor)),
      actor_first: first,
      actor_last: last,
      note: Some(text),
      is_comment: true,
      created_at,
    }
    .into_entry()
  }

  async fn add_attachments(
    &self,
    grievance_id: &str,
    locators: Vec<String>,
  ) -> Result<Grievance> {
    let mut grievance = self
      .get_grievance(grievance_id)
      .await?
      .ok_or_else(|| Error::GrievanceNotFound(grievance_id.to_owned()))?;

    grievance.attachments.extend(locators);
    grievance.updated_at = Utc::now();

    let gid = grievance.grievance_id.clone();
    let attachments = encode_string_list(&grievance.attachments)?;
    let updated_at = encode_dt(grievance.updated_at);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE grievances SET attachments = ?1, updated_at = ?2
           WHERE grievance_id = ?3",
          rusqlite::params![attachments, updated_at, gid],
        )?;
        Ok(())
      })
      .await?;
    Ok(grievance)
  }

  async fn summary(&self, scope: ListScope) -> Result<StatusSummary> {
    let mut params: Vec<String> = Vec::new();
    let Some(scope_cond) = scope_condition(&scope, &mut params) else {
      return Ok(StatusSummary::default());
    };
    let where_clause = if scope_cond.is_empty() {
      String::new()
    } else {
      format!("WHERE {scope_cond}")
    };

    let sql = format!(
      "SELECT g.status, COUNT(*) FROM grievances g {where_clause} GROUP BY g.status"
    );
    let counts: Vec<(String, i64)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get(0)?, row.get(1)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut summary = StatusSummary::default();
    for (status_str, count) in counts {
      let status = crate::encode::decode_status(&status_str)?;
      let count = count as u64;
      summary.total += count;
      if status.is_pending() {
        summary.pending += count;
      }
      match status {
        Status::Submitted => summary.submitted += count,
        Status::InReview => summary.in_review += count,
        Status::Assigned => summary.assigned += count,
        Status::Resolved => summary.resolved += count,
        Status::Closed => summary.closed += count,
      }
    }
    Ok(summary)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn record_notification(&self, input: NewNotification) -> Result<Notification> {
    let notification = Notification {
      notification_id: Uuid::new_v4(),
      account_id:      input.account_id,
      channel:         input.channel,
      title:           input.title,
      message:         input.message,
      meta:            input.meta,
      is_read:         false,
      created_at:      Utc::now(),
    };

    let id_str = encode_uuid(notification.notification_id);
    let account_str = encode_uuid(notification.account_id);
    let channel = notification.channel.as_str().to_owned();
    let title = notification.title.clone();
    let message = notification.message.clone();
    let meta = notification.meta.to_string();
    let at_str = encode_dt(notification.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (notification_id, account_id, channel,
             title, message, meta, is_read, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7)",
          rusqlite::params![id_str, account_str, channel, title, message, meta, at_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(notification)
  }

  async fn list_notifications(
    &self,
    account_id: Uuid,
    limit: usize,
  ) -> Result<Vec<Notification>> {
    let account_str = encode_uuid(account_id);
    let sql = format!(
      "SELECT {NOTIFICATION_COLS} FROM notifications WHERE account_id = ?1
       ORDER BY created_at DESC, rowid DESC LIMIT {limit}"
    );
    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![account_str], notification_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws
      .into_iter()
      .map(RawNotification::into_notification)
      .collect()
  }

  async fn mark_notification_read(
    &self,
    notification_id: Uuid,
    account_id: Uuid,
  ) -> Result<()> {
    let id_str = encode_uuid(notification_id);
    let account_str = encode_uuid(account_id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1
           WHERE notification_id = ?1 AND account_id = ?2",
          rusqlite::params![id_str, account_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(Error::NotificationNotFound(notification_id));
    }
    Ok(())
  }
}
