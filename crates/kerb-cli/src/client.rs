//! Async HTTP client for the scripted spreadsheet store.
//!
//! The store is a single endpoint driven by an `action` parameter. Reads are
//! `GET` with query parameters; writes are form-encoded `POST`s. Every reply
//! is a JSON envelope whose `status` is `"success"` or not.

use std::{future::Future, time::Duration};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use kerb_core::{
  StoreError,
  record::Record,
  store::{ConnectionProbe, DeleteOutcome, ImageUpload, RecordStore},
};
use reqwest::{Client, Response};
use serde::{Deserialize, de::{DeserializeOwned, IgnoredAny}};
use tracing::{debug, warn};

/// Connection settings for the store endpoint.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub endpoint:  String,
  pub sheet_id:  String,
  pub folder_id: String,
  pub timeout:   Duration,
}

/// HTTP implementation of [`RecordStore`].
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct SheetClient {
  client: Client,
  config: ApiConfig,
}

// ─── Envelope ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope<T> {
  #[serde(default)]
  status:  String,
  #[serde(default)]
  message: Option<String>,
  data:    Option<T>,
  #[serde(default)]
  url:     Option<String>,
}

impl<T> Envelope<T> {
  fn is_success(&self) -> bool { self.status == "success" }

  /// Turn a non-success envelope into a rejection.
  fn accepted(self) -> Result<Self, StoreError> {
    if self.is_success() {
      Ok(self)
    } else {
      Err(StoreError::rejected(self.message))
    }
  }
}

/// Read the body of `resp` as an envelope. HTTP-level failures count as
/// transport failures; an unparseable body is malformed.
async fn read_envelope<T: DeserializeOwned>(
  resp: Response,
) -> Result<Envelope<T>, StoreError> {
  let resp = resp.error_for_status().map_err(StoreError::transport)?;
  let body = resp.text().await.map_err(StoreError::transport)?;
  serde_json::from_str(&body)
    .map_err(|e| StoreError::Malformed(format!("{e} in {}", preview(&body))))
}

fn preview(body: &str) -> String {
  let head: String = body.chars().take(60).collect();
  if head.len() < body.len() {
    format!("{head:?}…")
  } else {
    format!("{head:?}")
  }
}

// ─── Client ───────────────────────────────────────────────────────────────────

impl SheetClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout)
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  async fn get<T: DeserializeOwned>(
    &self,
    params: &[(&str, &str)],
  ) -> Result<Envelope<T>, StoreError> {
    debug!(action = params[0].1, "GET store");
    let resp = self
      .client
      .get(&self.config.endpoint)
      .query(params)
      .send()
      .await
      .map_err(StoreError::transport)?;
    read_envelope(resp).await
  }

  async fn post<T: DeserializeOwned>(
    &self,
    params: &[(&str, &str)],
  ) -> Result<Envelope<T>, StoreError> {
    debug!(action = params[0].1, "POST store");
    let resp = self
      .client
      .post(&self.config.endpoint)
      .form(params)
      .send()
      .await
      .map_err(StoreError::transport)?;
    read_envelope(resp).await
  }

  // ── Operations ──────────────────────────────────────────────────────────

  /// `GET ?action=ping`
  pub async fn ping(&self) -> ConnectionProbe {
    match self.get::<IgnoredAny>(&[("action", "ping")]).await {
      Ok(env) if env.is_success() => ConnectionProbe::Online,
      Ok(env) => ConnectionProbe::Offline {
        reason: env
          .message
          .unwrap_or_else(|| format!("unexpected status {:?}", env.status)),
      },
      Err(e) => ConnectionProbe::Offline {
        reason: e.to_string(),
      },
    }
  }

  /// `GET ?action=getRecords&sheetId=…`
  pub async fn get_records(&self) -> Result<Vec<Record>, StoreError> {
    self
      .get::<Vec<Record>>(&[
        ("action", "getRecords"),
        ("sheetId", self.config.sheet_id.as_str()),
      ])
      .await?
      .accepted()?
      .data
      .ok_or_else(|| StoreError::Malformed("getRecords reply has no data".into()))
  }

  /// `POST action=saveRecord&sheetId=…&data=<json>`
  pub async fn save_record(&self, record: &Record) -> Result<(), StoreError> {
    let data = serde_json::to_string(record)
      .map_err(|e| StoreError::Malformed(format!("encoding record: {e}")))?;
    self
      .post::<IgnoredAny>(&[
        ("action", "saveRecord"),
        ("sheetId", self.config.sheet_id.as_str()),
        ("data", data.as_str()),
      ])
      .await?
      .accepted()?;
    Ok(())
  }

  /// `POST action=deleteRecord&sheetId=…&id=…`
  pub async fn delete_record(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
    let env = self
      .post::<IgnoredAny>(&[
        ("action", "deleteRecord"),
        ("sheetId", self.config.sheet_id.as_str()),
        ("id", id),
      ])
      .await?;
    if env.is_success() {
      Ok(DeleteOutcome::Deleted)
    } else {
      warn!(%id, message = ?env.message, "delete not accepted");
      Ok(DeleteOutcome::Rejected {
        message: env.message,
      })
    }
  }

  /// `POST action=uploadImage&folderId=…&data=<base64>&mimeType=…&filename=…`
  pub async fn upload(&self, image: &ImageUpload) -> Result<String, StoreError> {
    if self.config.folder_id.trim().is_empty() {
      return Err(StoreError::Unconfigured("folder_id"));
    }
    let data = STANDARD.encode(&image.bytes);
    self
      .post::<IgnoredAny>(&[
        ("action", "uploadImage"),
        ("folderId", self.config.folder_id.as_str()),
        ("data", data.as_str()),
        ("mimeType", image.mime_type.as_str()),
        ("filename", image.filename.as_str()),
      ])
      .await?
      .accepted()?
      .url
      .filter(|u| !u.is_empty())
      .ok_or_else(|| StoreError::Malformed("uploadImage reply has no url".into()))
  }
}

impl RecordStore for SheetClient {
  fn check_connection(
    &self,
  ) -> impl Future<Output = ConnectionProbe> + Send + '_ {
    self.ping()
  }

  fn fetch_all(
    &self,
  ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send + '_ {
    self.get_records()
  }

  fn upsert<'a>(
    &'a self,
    record: &'a Record,
  ) -> impl Future<Output = Result<(), StoreError>> + Send + 'a {
    self.save_record(record)
  }

  fn delete<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<DeleteOutcome, StoreError>> + Send + 'a {
    self.delete_record(id)
  }

  fn upload_image<'a>(
    &'a self,
    image: &'a ImageUpload,
  ) -> impl Future<Output = Result<String, StoreError>> + Send + 'a {
    self.upload(image)
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
