//! Error types for `ztrack-core`.

use thiserror::Error;
use uuid::Uuid;

use crate::message::Status;

#[derive(Debug, Error)]
pub enum Error {
  #[error("validation failed: {0}")]
  Validation(String),

  #[error("message not found: {0}")]
  NotFound(Uuid),

  #[error("illegal status transition: {from} -> {to}")]
  IllegalTransition { from: Status, to: Status },

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a storage backend error.
  pub fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
