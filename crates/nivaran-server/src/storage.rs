//! Attachment storage collaborator.
//!
//! The grievance store holds locators, never bytes. [`FsStorage`] writes
//! uploads under a local directory; `sign_for_read` is a pass-through there
//! because filesystem-served uploads are public. An object-store
//! implementation would return a time-limited signed URL instead.

use std::{
  fs,
  path::{Path, PathBuf},
};

use chrono::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::error::ApiError;

// Upload limits: at most five images and one PDF per grievance, each capped
// by the configured byte limit.
pub const MAX_IMAGES_PER_GRIEVANCE: usize = 5;
pub const MAX_PDFS_PER_GRIEVANCE: usize = 1;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<StorageError> for ApiError {
  fn from(e: StorageError) -> Self {
    // Attachments are required for the request that carries them.
    ApiError::ExternalService(e.to_string())
  }
}

/// Kind of upload accepted, derived from the part's content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
  Image,
  Pdf,
}

impl AttachmentKind {
  /// Only `image/*` and `application/pdf` are accepted.
  pub fn from_content_type(content_type: &str) -> Option<Self> {
    if content_type.starts_with("image/") {
      Some(AttachmentKind::Image)
    } else if content_type == "application/pdf" {
      Some(AttachmentKind::Pdf)
    } else {
      None
    }
  }
}

pub trait AttachmentStorage: Send + Sync {
  /// Persist `bytes` and return a durable locator.
  fn put(
    &self,
    kind: AttachmentKind,
    original_name: &str,
    bytes: &[u8],
  ) -> Result<String, StorageError>;

  /// A URL granting read access for `ttl`. Pass-through for public storage.
  fn sign_for_read(&self, locator: &str, ttl: Duration) -> Result<String, StorageError>;
}

// ─── Filesystem implementation ───────────────────────────────────────────────

pub struct FsStorage {
  root: PathBuf,
}

impl FsStorage {
  pub fn new(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
    let root = root.into();
    fs::create_dir_all(&root)?;
    Ok(Self { root })
  }
}

/// Keep only characters safe in a filename; everything else becomes `_`.
fn sanitize(name: &str) -> String {
  let cleaned: String = Path::new(name)
    .file_name()
    .and_then(|n| n.to_str())
    .unwrap_or("upload")
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
        c
      } else {
        '_'
      }
    })
    .collect();
  if cleaned.is_empty() {
    "upload".to_string()
  } else {
    cleaned
  }
}

impl AttachmentStorage for FsStorage {
  fn put(
    &self,
    _kind: AttachmentKind,
    original_name: &str,
    bytes: &[u8],
  ) -> Result<String, StorageError> {
    // Unique prefix so repeated uploads of the same filename never collide.
    let name = format!("{}-{}", Uuid::new_v4(), sanitize(original_name));
    fs::write(self.root.join(&name), bytes)?;
    Ok(format!("uploads/{name}"))
  }

  fn sign_for_read(&self, locator: &str, _ttl: Duration) -> Result<String, StorageError> {
    Ok(locator.to_string())
  }
}

// ─── In-memory implementation for tests ──────────────────────────────────────

#[cfg(test)]
pub mod testing {
  use std::sync::Mutex;

  use super::*;

  /// Records uploads without touching the filesystem. Unlike [`FsStorage`],
  /// signing decorates the locator so tests can tell a signed URL from a raw
  /// one.
  #[derive(Default)]
  pub struct MemoryStorage {
    pub puts: Mutex<Vec<(AttachmentKind, String, usize)>>,
  }

  impl AttachmentStorage for MemoryStorage {
    fn put(
      &self,
      kind: AttachmentKind,
      original_name: &str,
      bytes: &[u8],
    ) -> Result<String, StorageError> {
      self
        .puts
        .lock()
        .unwrap()
        .push((kind, original_name.to_string(), bytes.len()));
      Ok(format!("uploads/{}-{}", Uuid::new_v4(), original_name))
    }

    fn sign_for_read(&self, locator: &str, ttl: Duration) -> Result<String, StorageError> {
      Ok(format!("{locator}?sig=test&exp={}", ttl.num_seconds()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn content_type_gate() {
    assert_eq!(
      AttachmentKind::from_content_type("image/png"),
      Some(AttachmentKind::Image)
    );
    assert_eq!(
      AttachmentKind::from_content_type("image/jpeg"),
      Some(AttachmentKind::Image)
    );
    assert_eq!(
      AttachmentKind::from_content_type("application/pdf"),
      Some(AttachmentKind::Pdf)
    );
    assert_eq!(AttachmentKind::from_content_type("video/mp4"), None);
    assert_eq!(AttachmentKind::from_content_type("text/html"), None);
  }

  #[test]
  fn sanitize_strips_path_components() {
    assert_eq!(sanitize("../../etc/passwd"), "passwd");
    assert_eq!(sanitize("photo one.png"), "photo_one.png");
    assert_eq!(sanitize(""), "upload");
  }

  #[test]
  fn fs_storage_round_trip() {
    let dir = std::env::temp_dir().join(format!("nivaran-test-{}", Uuid::new_v4()));
    let storage = FsStorage::new(&dir).unwrap();
    let locator = storage
      .put(AttachmentKind::Image, "photo.png", b"bytes")
      .unwrap();
    assert!(locator.starts_with("uploads/"));
    assert!(locator.ends_with("photo.png"));

    let name = locator.strip_prefix("uploads/").unwrap();
    assert_eq!(std::fs::read(dir.join(name)).unwrap(), b"bytes");
    std::fs::remove_dir_all(dir).ok();
  }
}
