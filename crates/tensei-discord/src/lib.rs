//! Discord REST implementation of [`tensei_core::gateway::MessageGateway`].
//!
//! Only the three calls the notifier needs are implemented: create a
//! message, edit a message, and look up which guild a channel belongs to.
//! The websocket gateway session is not part of this crate.

mod embed;
pub mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, de::DeserializeOwned};
use tensei_core::{DeliveryError, card::Card, gateway::MessageGateway};

use embed::MessageBody;
use error::ApiErrorBody;

pub const DEFAULT_API_BASE_URL: &str = "https://discord.com/api/v10";

/// Connection settings for the Discord REST API.
#[derive(Debug, Clone)]
pub struct DiscordConfig {
  pub token:        String,
  pub api_base_url: String,
}

#[derive(Debug, Deserialize)]
struct MessageRef {
  id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelRef {
  guild_id: Option<String>,
}

/// Async client for the Discord REST API.
///
/// Clones share the inner [`reqwest::Client`].
#[derive(Clone)]
pub struct DiscordGateway {
  client: Client,
  config: DiscordConfig,
}

impl DiscordGateway {
  pub fn new(config: DiscordConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
  }

  fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self
      .client
      .request(method, self.url(path))
      .header(reqwest::header::AUTHORIZATION, format!("Bot {}", self.config.token))
  }

  async fn execute<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    let resp = req.send().await?;
    let status = resp.status();
    if !status.is_success() {
      let body: ApiErrorBody = resp.json().await.unwrap_or_default();
      return Err(Error::Api { status, code: body.code, message: body.message });
    }
    Ok(resp.json().await?)
  }
}

// ─── MessageGateway impl ─────────────────────────────────────────────────────

impl MessageGateway for DiscordGateway {
  async fn send(&self, channel: &str, card: &Card) -> std::result::Result<String, DeliveryError> {
    let req = self
      .request(Method::POST, &format!("/channels/{channel}/messages"))
      .json(&MessageBody::from_card(card));
    let msg: MessageRef = self
      .execute(req)
      .await
      .map_err(|e| e.into_delivery(channel, None))?;
    Ok(msg.id)
  }

  async fn edit(
    &self,
    channel: &str,
    handle: &str,
    card: &Card,
  ) -> std::result::Result<(), DeliveryError> {
    let req = self
      .request(Method::PATCH, &format!("/channels/{channel}/messages/{handle}"))
      .json(&MessageBody::from_card(card));
    let _: MessageRef = self
      .execute(req)
      .await
      .map_err(|e| e.into_delivery(channel, Some(handle)))?;
    Ok(())
  }

  async fn channel_community(&self, channel: &str) -> std::result::Result<String, DeliveryError> {
    let req = self.request(Method::GET, &format!("/channels/{channel}"));
    let info: ChannelRef = self
      .execute(req)
      .await
      .map_err(|e| e.into_delivery(channel, None))?;
    info
      .guild_id
      .ok_or_else(|| DeliveryError::Rejected(format!("channel {channel} is not in a guild")))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn gateway() -> DiscordGateway {
    DiscordGateway::new(DiscordConfig {
      token:        "tok".into(),
      api_base_url: "http://localhost:9999/api/v10/".into(),
    })
    .unwrap()
  }

  #[test]
  fn url_joins_base_and_path() {
    assert_eq!(
      gateway().url("/channels/1/messages"),
      "http://localhost:9999/api/v10/channels/1/messages"
    );
  }

  #[test]
  fn requests_carry_bot_authorization() {
    let req = gateway().request(Method::GET, "/channels/1").build().unwrap();
    assert_eq!(req.headers()[reqwest::header::AUTHORIZATION], "Bot tok");
    assert_eq!(req.method(), Method::GET);
  }
}
