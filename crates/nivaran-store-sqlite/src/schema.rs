//! SQL schema for the Nivaran SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! the `PRAGMA user_version` number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Accounts are never hard-deleted; deactivation flips is_active.
CREATE TABLE IF NOT EXISTS accounts (
    account_id         TEXT PRIMARY KEY,
    first_name         TEXT NOT NULL,
    middle_name        TEXT,
    last_name          TEXT NOT NULL,
    gender             TEXT NOT NULL,   -- 'male' | 'female' | 'transgender' | 'other'
    dob                TEXT NOT NULL,   -- ISO 8601 date
    primary_contact    TEXT NOT NULL UNIQUE,
    secondary_contact  TEXT,
    email              TEXT NOT NULL UNIQUE,
    password_hash      TEXT NOT NULL,   -- argon2 PHC string
    role               TEXT NOT NULL DEFAULT 'citizen',
    department         TEXT,
    managed_categories TEXT NOT NULL DEFAULT '[]',  -- JSON array of category keys
    push_token         TEXT UNIQUE,
    is_active          INTEGER NOT NULL DEFAULT 1,
    is_phone_verified  INTEGER NOT NULL DEFAULT 0,
    reset_otp_code     TEXT,
    reset_otp_expires  TEXT,
    phone_otp_code     TEXT,
    phone_otp_expires  TEXT,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

-- Soft-deleted only; grievances reference keys of inactive categories.
CREATE TABLE IF NOT EXISTS categories (
    category_id TEXT PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    key         TEXT NOT NULL UNIQUE,   -- immutable machine identifier
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS grievances (
    grievance_id       TEXT PRIMARY KEY,  -- human-readable, e.g. PGS-LX3K9A-7F2Q
    user_id            TEXT REFERENCES accounts(account_id),  -- NULL iff anonymous
    created_by_name    TEXT NOT NULL,     -- submitter snapshot, frozen at creation
    created_by_email   TEXT NOT NULL,
    created_by_contact TEXT NOT NULL,
    category_key       TEXT NOT NULL,     -- category snapshot
    category_name      TEXT NOT NULL,
    title              TEXT NOT NULL,
    description        TEXT NOT NULL,
    attachments        TEXT NOT NULL DEFAULT '[]',  -- JSON array of locators
    status             TEXT NOT NULL DEFAULT 'Submitted',
    priority           TEXT NOT NULL DEFAULT 'Medium',
    location           TEXT,
    assigned_to        TEXT REFERENCES accounts(account_id),
    is_anonymous       INTEGER NOT NULL DEFAULT 0,
    created_at         TEXT NOT NULL,
    updated_at         TEXT NOT NULL
);

-- Status history is strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS status_history (
    entry_id     TEXT PRIMARY KEY,
    grievance_id TEXT NOT NULL REFERENCES grievances(grievance_id),
    old_status   TEXT,               -- NULL for creation-time entries
    new_status   TEXT NOT NULL,
    actor_id     TEXT REFERENCES accounts(account_id),
    note         TEXT,
    is_comment   INTEGER NOT NULL DEFAULT 0,
    created_at   TEXT NOT NULL
);

-- In-app inbox; mutated only to flip is_read.
CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    account_id      TEXT NOT NULL REFERENCES accounts(account_id),
    channel         TEXT NOT NULL DEFAULT 'inapp',
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    meta            TEXT NOT NULL DEFAULT '{}',  -- JSON metadata for deep-linking
    is_read         INTEGER NOT NULL DEFAULT 0,
    created_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS grievances_user_idx     ON grievances(user_id);
CREATE INDEX IF NOT EXISTS grievances_category_idx ON grievances(category_key);
CREATE INDEX IF NOT EXISTS grievances_created_idx  ON grievances(created_at);
CREATE INDEX IF NOT EXISTS history_grievance_idx   ON status_history(grievance_id);
CREATE INDEX IF NOT EXISTS notifications_account_idx ON notifications(account_id);

PRAGMA user_version = 1;
";
