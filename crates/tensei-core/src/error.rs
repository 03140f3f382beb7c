//! Error types for `tensei-core`.

use std::time::Duration;

use thiserror::Error;

/// A failure talking to the live-status source.
///
/// Either variant means "unknown": callers must skip the affected entities
/// for the current tick instead of treating them as offline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
  #[error("status source unavailable: {0}")]
  Unavailable(String),

  #[error("status source rate limited (retry after {retry_after:?})")]
  RateLimited { retry_after: Option<Duration> },
}

/// A failure delivering a card to one destination.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
  /// The destination channel no longer exists (or the bot lost access).
  #[error("channel {0} does not exist")]
  ChannelMissing(String),

  /// The card a handle points at was deleted.
  #[error("message {0} does not exist")]
  MessageMissing(String),

  #[error("delivery rejected: {0}")]
  Rejected(String),

  #[error("delivery transport error: {0}")]
  Transport(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("entity {0} is already tracked")]
  AlreadyTracked(String),

  #[error("channel {channel} already receives alerts for {entity}")]
  AlreadySubscribed { entity: String, channel: String },

  #[error("channel {channel} does not belong to community {community}")]
  ForeignDestination { channel: String, community: String },

  #[error("{0} is not supported yet")]
  Unsupported(&'static str),

  #[error(transparent)]
  Source(#[from] SourceError),

  #[error(transparent)]
  Delivery(#[from] DeliveryError),

  #[error("persistence failed: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a store backend error.
  pub fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
