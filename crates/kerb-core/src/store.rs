//! The `RecordStore` trait: the remote persistence boundary.
//!
//! Implemented by the HTTP client in `kerb-cli` and by the in-memory
//! [`MemoryStore`](crate::memory::MemoryStore) used in tests. The coordinator
//! depends on this abstraction only.
//!
//! Two operations deliberately do not surface every failure as an `Err`:
//! [`RecordStore::check_connection`] folds all failures into
//! [`ConnectionProbe::Offline`], and [`RecordStore::delete`] reports a
//! non-success envelope as [`DeleteOutcome::Rejected`]. Only transport
//! failures of `delete` are errors.

use std::future::Future;

use crate::{StoreError, record::Record};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// Result of a connectivity check. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionProbe {
  Online,
  Offline { reason: String },
}

impl ConnectionProbe {
  pub fn is_online(&self) -> bool { matches!(self, Self::Online) }
}

/// Result of a delete that reached the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
  Deleted,
  /// The store answered with a non-success envelope.
  Rejected { message: Option<String> },
}

impl DeleteOutcome {
  pub fn is_deleted(&self) -> bool { matches!(self, Self::Deleted) }
}

/// An image read from disk, ready to be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
  pub bytes:     Vec<u8>,
  pub mime_type: String,
  pub filename:  String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the remote record-and-file store.
///
/// Operations are independent: none waits on another, and none queues or
/// retries. A failed write leaves no trace on the caller's side; the caller
/// reconciles by fetching the full collection again.
pub trait RecordStore: Send + Sync {
  /// Ask the store whether it is reachable and answering.
  fn check_connection(
    &self,
  ) -> impl Future<Output = ConnectionProbe> + Send + '_;

  /// Every record, in the order the store returns them.
  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send + '_;

  /// Create or update `record`; the store keys on `record.id`.
  fn upsert<'a>(
    &'a self,
    record: &'a Record,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a;

  /// Remove the record with `id`.
  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<DeleteOutcome, StoreError>> + Send + 'a;

  /// Upload an image and return the URL the store serves it under.
  fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> impl Future<Output = Result<String, StoreError>> + Send + 'a;
}
