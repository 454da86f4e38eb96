//! Application state coordinator.
//!
//! Owns the canonical record snapshot and the connection status. The
//! snapshot is only ever replaced wholesale with what the store returns;
//! writes are never patched into it locally. Every successful write is
//! followed by a silent reload.

use std::sync::Arc;

use strum::Display;
use tracing::{debug, info, warn};

use crate::{
  Error, Result, StoreError, ValidationError,
  record::{Record, RecordDraft},
  stats::{Statistics, compute_statistics},
  store::{ConnectionProbe, DeleteOutcome, ImageUpload, RecordStore},
};

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ConnectionStatus {
  #[strum(to_string = "Connecting…")]
  Loading,
  #[strum(to_string = "Connected")]
  Online,
  #[strum(to_string = "Offline")]
  Offline,
}

/// Whether the caller shows a blocking indicator for a reload. The
/// coordinator only logs it; the fetch is the same either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
  Blocking,
  Silent,
}

// ─── Two-phase save ──────────────────────────────────────────────────────────

/// A validated write that has passed (or is waiting on) the duplicate-name
/// check. Nothing has been sent to the store yet.
#[derive(Debug, Clone)]
pub struct PendingSave {
  draft:    RecordDraft,
  original: Option<Record>,
  image:    Option<ImageUpload>,
}

impl PendingSave {
  pub fn name(&self) -> &str { self.draft.name() }

  pub fn is_update(&self) -> bool { self.original.is_some() }

  /// Abandon the write. Produces the error to report; no store call is made.
  pub fn decline(self) -> Error {
    ValidationError::DuplicateDeclined(self.draft.name().to_string()).into()
  }
}

/// What the caller must do next with a prepared save.
#[derive(Debug, Clone)]
pub enum SavePlan {
  /// No conflict; pass to [`Coordinator::commit`].
  Ready(PendingSave),
  /// Another record already uses this name. The user must choose between
  /// [`Coordinator::commit`] and [`PendingSave::decline`].
  NeedsConfirmation {
    pending:      PendingSave,
    duplicate_of: Record,
  },
}

// ─── Coordinator ─────────────────────────────────────────────────────────────

pub struct Coordinator<S> {
  store:   S,
  records: Arc<[Record]>,
  status:  ConnectionStatus,
}

impl<S: RecordStore> Coordinator<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      records: Arc::<[Record]>::from(Vec::new()),
      status: ConnectionStatus::Loading,
    }
  }

  pub fn store(&self) -> &S { &self.store }

  /// The current snapshot. Cheap to clone and never mutated in place.
  pub fn records(&self) -> Arc<[Record]> { Arc::clone(&self.records) }

  pub fn record(&self, id: &str) -> Option<&Record> {
    self.records.iter().find(|r| r.id == id)
  }

  pub fn connection_status(&self) -> ConnectionStatus { self.status }

  pub fn statistics(&self) -> Statistics { compute_statistics(&self.records) }

  // ── Loading ───────────────────────────────────────────────────────────────

  /// Probe connectivity and load the records concurrently. An offline probe
  /// only sets the status; it does not stop the load.
  pub async fn initialize(&mut self) -> Result<(), StoreError> {
    self.status = ConnectionStatus::Loading;
    let (probe, fetched) =
      tokio::join!(self.store.check_connection(), self.store.fetch_all());

    self.status = status_from(probe);

    let records = fetched?;
    info!(count = records.len(), "records loaded");
    self.records = records.into();
    Ok(())
  }

  /// Re-run the connectivity probe on its own.
  pub async fn check_connection(&mut self) -> ConnectionStatus {
    self.status = ConnectionStatus::Loading;
    self.status = status_from(self.store.check_connection().await);
    self.status
  }

  /// Replace the snapshot with a fresh copy from the store. On failure the
  /// previous snapshot is kept.
  pub async fn refresh(&mut self, mode: RefreshMode) -> Result<(), StoreError> {
    match self.store.fetch_all().await {
      Ok(records) => {
        debug!(count = records.len(), ?mode, "records refreshed");
        self.records = records.into();
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, ?mode, "refresh failed");
        Err(e)
      }
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────────

  /// Validate a new record and run the duplicate-name check.
  pub async fn prepare_create(
    &self,
    draft: RecordDraft,
    image: Option<ImageUpload>,
  ) -> Result<SavePlan> {
    self.prepare(draft, None, image).await
  }

  /// Validate an edit of `original`. The duplicate-name check only runs
  /// when the name changed.
  pub async fn prepare_update(
    &self,
    original: Record,
    draft: RecordDraft,
    image: Option<ImageUpload>,
  ) -> Result<SavePlan> {
    self.prepare(draft, Some(original), image).await
  }

  async fn prepare(
    &self,
    draft: RecordDraft,
    original: Option<Record>,
    image: Option<ImageUpload>,
  ) -> Result<SavePlan> {
    draft.validate()?;

    let name_changed = original
      .as_ref()
      .is_none_or(|o| o.full_name != draft.name());
    let pending = PendingSave {
      draft,
      original,
      image,
    };
    if !name_changed {
      return Ok(SavePlan::Ready(pending));
    }

    let own_id = pending.original.as_ref().map_or("", |o| o.id.as_str());
    let current = self.store.fetch_all().await?;
    let duplicate = current
      .into_iter()
      .find(|r| r.full_name == pending.name() && r.id != own_id);

    Ok(match duplicate {
      Some(duplicate_of) => {
        debug!(name = pending.name(), id = %duplicate_of.id, "duplicate name");
        SavePlan::NeedsConfirmation {
          pending,
          duplicate_of,
        }
      }
      None => SavePlan::Ready(pending),
    })
  }

  /// Upload the image (if any), write the record, then reload silently.
  /// Returns the record exactly as it was sent.
  pub async fn commit(&mut self, pending: PendingSave) -> Result<Record> {
    let PendingSave {
      draft,
      original,
      image,
    } = pending;

    let image_url = match &image {
      Some(img) => Some(self.store.upload_image(img).await?),
      None => None,
    };
    let record = match &original {
      Some(o) => Record::revise(o, draft, image_url),
      None => Record::create(draft, image_url),
    };

    self.store.upsert(&record).await?;
    info!(
      id = %record.id,
      update = original.is_some(),
      "record saved"
    );

    self
      .refresh(RefreshMode::Silent)
      .await
      .map_err(Error::RefreshAfterWrite)?;
    Ok(record)
  }

  /// Delete by id and reload silently. A rejection from the store is
  /// reported through the outcome, not as an error.
  pub async fn delete(&mut self, id: &str) -> Result<DeleteOutcome> {
    let outcome = self.store.delete(id).await?;
    match &outcome {
      DeleteOutcome::Deleted => info!(%id, "record deleted"),
      DeleteOutcome::Rejected { message } => {
        warn!(%id, ?message, "store refused delete")
      }
    }

    self
      .refresh(RefreshMode::Silent)
      .await
      .map_err(Error::RefreshAfterWrite)?;
    Ok(outcome)
  }
}

fn status_from(probe: ConnectionProbe) -> ConnectionStatus {
  match probe {
    ConnectionProbe::Online => ConnectionStatus::Online,
    ConnectionProbe::Offline { reason } => {
      warn!(%reason, "store unreachable");
      ConnectionStatus::Offline
    }
  }
}
