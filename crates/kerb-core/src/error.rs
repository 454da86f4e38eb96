//! Error types for `kerb-core`.

use thiserror::Error;

/// Failure talking to the remote record store.
///
/// Transport failures and well-formed rejections are kept apart so callers
/// can tell "the network is down" from "the store said no".
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("transport failure: {0}")]
  Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("store rejected the request: {}", message.as_deref().unwrap_or("no message"))]
  Rejected { message: Option<String> },

  #[error("malformed store response: {0}")]
  Malformed(String),

  /// A setting the request needs is blank; nothing was sent.
  #[error("{0} is not configured")]
  Unconfigured(&'static str),
}

impl StoreError {
  pub fn transport<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Transport(Box::new(err))
  }

  pub fn rejected(message: Option<String>) -> Self {
    Self::Rejected { message }
  }
}

/// Client-side input problems, caught before any store call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("{0} is required")]
  MissingField(&'static str),

  #[error("household size must be at least 1")]
  HouseholdSize,

  #[error("select at least one waste management method")]
  NoWasteMethod,

  #[error("select at least one wastewater management method")]
  NoWaterMethod,

  #[error("describe the address type when \"other\" is selected")]
  MissingOtherAddressType,

  #[error("{field} must be a number, got {value:?}")]
  InvalidNumber { field: &'static str, value: String },

  #[error("{field} {value:?} is not one of the allowed options")]
  UnknownOption { field: &'static str, value: String },

  #[error("cannot read image {path}: {reason}")]
  Image { path: String, reason: String },

  #[error("save cancelled: a record named {0:?} already exists")]
  DuplicateDeclined(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Validation(#[from] ValidationError),

  #[error(transparent)]
  Store(#[from] StoreError),

  /// The write went through but the follow-up reload did not.
  #[error("change was stored, but reloading records failed: {0}")]
  RefreshAfterWrite(#[source] StoreError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
