//! Error type for `tensei-discord`.

use reqwest::StatusCode;
use serde::Deserialize;
use tensei_core::DeliveryError;
use thiserror::Error;

/// Discord JSON error codes we react to.
const UNKNOWN_CHANNEL: u32 = 10003;
const UNKNOWN_MESSAGE: u32 = 10008;
const MISSING_ACCESS: u32 = 50001;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("discord returned {status} (code {code:?}): {message}")]
  Api {
    status:  StatusCode,
    code:    Option<u32>,
    message: String,
  },
}

/// The JSON body Discord sends with a non-2xx response.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  pub code:    Option<u32>,
  #[serde(default)]
  pub message: String,
}

impl Error {
  /// Translate into a delivery failure for `channel` / `message`.
  pub fn into_delivery(self, channel: &str, message: Option<&str>) -> DeliveryError {
    match self {
      Error::Http(e) => DeliveryError::Transport(e.to_string()),
      Error::Api { code: Some(UNKNOWN_CHANNEL | MISSING_ACCESS), .. } => {
        DeliveryError::ChannelMissing(channel.to_string())
      }
      Error::Api { code: Some(UNKNOWN_MESSAGE), .. } => {
        DeliveryError::MessageMissing(message.unwrap_or_default().to_string())
      }
      Error::Api { status: StatusCode::NOT_FOUND, .. } if message.is_none() => {
        DeliveryError::ChannelMissing(channel.to_string())
      }
      other => DeliveryError::Rejected(other.to_string()),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  fn api(status: StatusCode, code: Option<u32>) -> Error {
    Error::Api { status, code, message: "nope".into() }
  }

  #[test]
  fn unknown_channel_is_channel_missing() {
    let err = api(StatusCode::NOT_FOUND, Some(UNKNOWN_CHANNEL)).into_delivery("c1", Some("m1"));
    assert_eq!(err, DeliveryError::ChannelMissing("c1".into()));
  }

  #[test]
  fn unknown_message_is_message_missing() {
    let err = api(StatusCode::NOT_FOUND, Some(UNKNOWN_MESSAGE)).into_delivery("c1", Some("m1"));
    assert_eq!(err, DeliveryError::MessageMissing("m1".into()));
  }

  #[test]
  fn bare_404_on_channel_call_is_channel_missing() {
    let err = api(StatusCode::NOT_FOUND, None).into_delivery("c1", None);
    assert_eq!(err, DeliveryError::ChannelMissing("c1".into()));
  }

  #[test]
  fn rate_limit_is_rejected() {
    let err = api(StatusCode::TOO_MANY_REQUESTS, None).into_delivery("c1", None);
    assert!(matches!(err, DeliveryError::Rejected(_)));
  }
}
