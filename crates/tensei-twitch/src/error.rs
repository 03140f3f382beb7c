//! Error type for `tensei-twitch`.

use std::time::Duration;

use reqwest::StatusCode;
use tensei_core::SourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("helix returned {0} for {1}")]
  Status(StatusCode, String),

  #[error("app token request failed: {0}")]
  Auth(String),

  #[error("rate limited (retry after {retry_after:?})")]
  RateLimited { retry_after: Option<Duration> },
}

impl From<Error> for SourceError {
  fn from(err: Error) -> Self {
    match err {
      Error::RateLimited { retry_after } => SourceError::RateLimited { retry_after },
      other => SourceError::Unavailable(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn rate_limit_maps_to_rate_limited() {
    let retry_after = Some(Duration::from_secs(7));
    let err: SourceError = Error::RateLimited { retry_after }.into();
    assert_eq!(err, SourceError::RateLimited { retry_after });
  }

  #[test]
  fn everything_else_is_unavailable() {
    let err: SourceError = Error::Status(StatusCode::BAD_GATEWAY, "/streams".into()).into();
    assert!(matches!(err, SourceError::Unavailable(msg) if msg.contains("502")));
  }
}
