//! Error type for `warden-store-sqlite`.

use thiserror::Error;
use warden_core::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  /// The command was rejected by a domain rule; nothing was written.
  #[error(transparent)]
  Core(#[from] warden_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn domain(&self) -> Option<&warden_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
