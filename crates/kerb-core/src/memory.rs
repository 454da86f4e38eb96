//! In-memory [`RecordStore`] for tests.
//!
//! Keeps records in insertion order, logs every call so tests can assert on
//! exactly which store operations ran, and can be told to fail in each of
//! the ways the real store does.

use std::{
  future::{Future, ready},
  sync::{Mutex, MutexGuard},
};

use crate::{
  StoreError,
  record::Record,
  store::{ConnectionProbe, DeleteOutcome, ImageUpload, RecordStore},
};

/// One call made against a [`MemoryStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
  CheckConnection,
  FetchAll,
  Upsert(String),
  Delete(String),
  UploadImage(String),
}

impl Call {
  pub fn is_write(&self) -> bool {
    matches!(self, Self::Upsert(_) | Self::Delete(_) | Self::UploadImage(_))
  }
}

#[derive(Default)]
struct Inner {
  records:         Vec<Record>,
  uploads:         Vec<ImageUpload>,
  calls:           Vec<Call>,
  offline:         bool,
  fail_fetch:      bool,
  reject_upsert:   Option<String>,
  reject_delete:   Option<String>,
  drop_delete:     bool,
}

#[derive(Default)]
pub struct MemoryStore {
  inner: Mutex<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  pub fn with_records(records: Vec<Record>) -> Self {
    let store = Self::default();
    store.lock().records = records;
    store
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    // A panicking test thread must not hide the store from the rest.
    self.inner.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Store `record` without logging a call, as if another client wrote it.
  pub fn put(&self, record: Record) { self.lock().records.push(record); }

  pub fn calls(&self) -> Vec<Call> { self.lock().calls.clone() }

  pub fn clear_calls(&self) { self.lock().calls.clear(); }

  pub fn stored(&self) -> Vec<Record> { self.lock().records.clone() }

  pub fn uploads(&self) -> Vec<ImageUpload> { self.lock().uploads.clone() }

  /// Fail the connectivity probe.
  pub fn set_offline(&self, offline: bool) { self.lock().offline = offline; }

  /// Fail `fetch_all` with a transport error.
  pub fn set_fetch_failure(&self, fail: bool) { self.lock().fail_fetch = fail; }

  /// Answer upserts with a rejection envelope carrying `message`.
  pub fn reject_upserts(&self, message: Option<&str>) {
    self.lock().reject_upsert = message.map(str::to_string);
  }

  /// Answer deletes with a rejection envelope carrying `message`.
  pub fn reject_deletes(&self, message: Option<&str>) {
    self.lock().reject_delete = message.map(str::to_string);
  }

  /// Fail deletes with a transport error.
  pub fn drop_deletes(&self, fail: bool) { self.lock().drop_delete = fail; }
}

fn unreachable_store() -> StoreError {
  StoreError::transport(std::io::Error::new(
    std::io::ErrorKind::ConnectionRefused,
    "memory store unreachable",
  ))
}

impl RecordStore for MemoryStore {
  fn check_connection(
    &self,
  ) -> impl Future<Output = ConnectionProbe> + Send + '_ {
    let mut inner = self.lock();
    inner.calls.push(Call::CheckConnection);
    ready(if inner.offline {
      ConnectionProbe::Offline {
        reason: "memory store offline".to_string(),
      }
    } else {
      ConnectionProbe::Online
    })
  }

  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send + '_ {
    let mut inner = self.lock();
    inner.calls.push(Call::FetchAll);
    ready(if inner.fail_fetch {
      Err(unreachable_store())
    } else {
      Ok(inner.records.clone())
    })
  }

  fn upsert<'a>(
    &'a self,
    record: &'a Record,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a {
    let mut inner = self.lock();
    inner.calls.push(Call::Upsert(record.id.clone()));
    if let Some(message) = &inner.reject_upsert {
      return ready(Err(StoreError::rejected(Some(message.clone()))));
    }
    match inner.records.iter().position(|r| r.id == record.id) {
      Some(i) => inner.records[i] = record.clone(),
      None => inner.records.push(record.clone()),
    }
    ready(Ok(()))
  }

  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<DeleteOutcome, StoreError>> + Send + 'a {
    let mut inner = self.lock();
    inner.calls.push(Call::Delete(id.to_string()));
    if inner.drop_delete {
      return ready(Err(unreachable_store()));
    }
    if let Some(message) = &inner.reject_delete {
      return ready(Ok(DeleteOutcome::Rejected {
        message: Some(message.clone()),
      }));
    }
    let before = inner.records.len();
    inner.records.retain(|r| r.id != id);
    ready(Ok(if inner.records.len() < before {
      DeleteOutcome::Deleted
    } else {
      DeleteOutcome::Rejected {
        message: Some(format!("record {id} not found")),
      }
    }))
  }

  fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> impl Future<Output = Result<String, StoreError>> + Send + 'a {
    let mut inner = self.lock();
    inner.calls.push(Call::UploadImage(image.filename.clone()));
    inner.uploads.push(image.clone());
    let n = inner.uploads.len();
    ready(Ok(format!("memory://images/{n}/{}", image.filename)))
  }
}
