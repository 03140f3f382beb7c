//! Twitch Helix implementation of [`tensei_core::source::StatusSource`].
//!
//! Authenticates with an app access token (client-credentials grant), fetched
//! lazily and refreshed once when Helix answers `401`. Every response that
//! carries quota headers updates the shared [`RateLimitTracker`], including
//! rate-limited ones.

pub mod error;
mod helix;

pub use error::{Error, Result};

use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, TimeZone as _, Utc};
use reqwest::{Client, StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use tensei_core::{
  SourceError,
  ratelimit::{RateLimitSnapshot, RateLimitTracker},
  source::{CategoryInfo, ProfileInfo, StatusRecord, StatusSource},
};
use tokio::sync::Mutex;

use helix::{AppToken, HelixGame, HelixStream, HelixUser, Page, TokenResponse};

pub const DEFAULT_API_BASE_URL: &str = "https://api.twitch.tv/helix";
pub const DEFAULT_AUTH_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Connection settings for the Helix API.
#[derive(Debug, Clone)]
pub struct HelixConfig {
  pub client_id:     String,
  pub client_secret: String,
  pub api_base_url:  String,
  pub auth_url:      String,
}

/// Async client for the Twitch Helix REST API.
pub struct HelixClient {
  client:     Client,
  config:     HelixConfig,
  token:      Mutex<Option<AppToken>>,
  rate_limit: RateLimitTracker,
}

impl HelixClient {
  pub fn new(config: HelixConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self {
      client,
      config,
      token: Mutex::new(None),
      rate_limit: RateLimitTracker::new(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.config.api_base_url.trim_end_matches('/'), path)
  }

  /// Current app token, fetching a new one if none is cached or it expired.
  async fn access_token(&self) -> Result<String> {
    let mut cached = self.token.lock().await;
    if let Some(token) = cached.as_ref()
      && token.expires_at > Utc::now()
    {
      return Ok(token.access_token.clone());
    }

    let resp = self
      .client
      .post(&self.config.auth_url)
      .query(&[
        ("client_id", self.config.client_id.as_str()),
        ("client_secret", self.config.client_secret.as_str()),
        ("grant_type", "client_credentials"),
      ])
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(Error::Auth(format!("token endpoint → {}", resp.status())));
    }
    let body: TokenResponse = resp.json().await?;
    tracing::debug!(expires_in = body.expires_in, "fetched helix app token");

    let token = AppToken::from_response(body, Utc::now());
    let access = token.access_token.clone();
    *cached = Some(token);
    Ok(access)
  }

  async fn invalidate_token(&self) { *self.token.lock().await = None; }

  /// `GET <path>?<query>` with one token refresh on `401`.
  async fn get_page<T: DeserializeOwned>(
    &self,
    path: &str,
    query: &[(&str, String)],
  ) -> Result<Vec<T>> {
    let mut refreshed = false;
    loop {
      let token = self.access_token().await?;
      let resp = self
        .client
        .get(self.url(path))
        .header("Client-Id", &self.config.client_id)
        .bearer_auth(token)
        .query(query)
        .send()
        .await?;

      let status = resp.status();
      let snapshot = self.record_rate_limit(resp.headers());
      if status == StatusCode::UNAUTHORIZED && !refreshed {
        self.invalidate_token().await;
        refreshed = true;
        continue;
      }

      if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = snapshot.and_then(|s| (s.reset_time - Utc::now()).to_std().ok());
        return Err(Error::RateLimited { retry_after });
      }
      if !status.is_success() {
        return Err(Error::Status(status, path.to_string()));
      }

      let page: Page<T> = resp.json().await?;
      return Ok(page.data);
    }
  }

  /// Record the quota in `headers`, if present, whatever the status code.
  fn record_rate_limit(&self, headers: &HeaderMap) -> Option<RateLimitSnapshot> {
    let snapshot = parse_rate_limit(headers)?;
    tracing::debug!(
      limit = snapshot.limit,
      remaining = snapshot.remaining,
      reset = %snapshot.reset_time,
      "helix rate limit"
    );
    self.rate_limit.record(snapshot);
    Some(snapshot)
  }

  async fn streams(&self, ids: &[String]) -> Result<HashMap<String, StatusRecord>> {
    let mut query: Vec<(&str, String)> = ids.iter().map(|id| ("user_id", id.clone())).collect();
    query.push(("first", ids.len().max(1).to_string()));

    let streams: Vec<HelixStream> = self.get_page("/streams", &query).await?;
    Ok(live_records(streams))
  }

  async fn users(&self, query: &[(&str, String)]) -> Result<Vec<ProfileInfo>> {
    let users: Vec<HelixUser> = self.get_page("/users", query).await?;
    Ok(users.into_iter().map(HelixUser::into_profile).collect())
  }
}

/// Keep only broadcasts that are actually live, keyed by entity id.
fn live_records(streams: Vec<HelixStream>) -> HashMap<String, StatusRecord> {
  streams
    .into_iter()
    .filter(HelixStream::is_live)
    .map(|s| {
      let record = s.into_record();
      (record.entity_id.clone(), record)
    })
    .collect()
}

/// Read the `Ratelimit-*` headers Helix attaches to every response.
fn parse_rate_limit(headers: &HeaderMap) -> Option<RateLimitSnapshot> {
  let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
  let limit = header("ratelimit-limit")?.parse().ok()?;
  let remaining = header("ratelimit-remaining")?.parse().ok()?;
  let reset_secs: i64 = header("ratelimit-reset")?.parse().ok()?;
  let reset_time: DateTime<Utc> = Utc.timestamp_opt(reset_secs, 0).single()?;
  Some(RateLimitSnapshot { limit, remaining, reset_time })
}

// ─── StatusSource impl ───────────────────────────────────────────────────────

impl StatusSource for HelixClient {
  async fn get_status(
    &self,
    ids: &[String],
  ) -> std::result::Result<HashMap<String, StatusRecord>, SourceError> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }
    Ok(self.streams(ids).await?)
  }

  async fn get_metadata(
    &self,
    category_id: &str,
  ) -> std::result::Result<CategoryInfo, SourceError> {
    let games: Vec<HelixGame> = self
      .get_page("/games", &[("id", category_id.to_string())])
      .await?;
    games
      .into_iter()
      .next()
      .map(|g| CategoryInfo { id: g.id, name: g.name })
      .ok_or_else(|| SourceError::Unavailable(format!("no category with id {category_id}")))
  }

  async fn get_profiles(
    &self,
    ids: &[String],
  ) -> std::result::Result<HashMap<String, ProfileInfo>, SourceError> {
    if ids.is_empty() {
      return Ok(HashMap::new());
    }
    let query: Vec<(&str, String)> = ids.iter().map(|id| ("id", id.clone())).collect();
    let users = self.users(&query).await?;
    Ok(users.into_iter().map(|u| (u.id.clone(), u)).collect())
  }

  async fn find_profile_by_login(
    &self,
    login: &str,
  ) -> std::result::Result<Option<ProfileInfo>, SourceError> {
    let users = self.users(&[("login", login.to_lowercase())]).await?;
    Ok(users.into_iter().next())
  }

  fn rate_limit(&self) -> Option<RateLimitSnapshot> { self.rate_limit.snapshot() }
}

#[cfg(test)]
mod tests {
  use reqwest::header::HeaderValue;

  use super::*;

  #[test]
  fn rate_limit_headers_are_parsed() {
    let mut headers = HeaderMap::new();
    headers.insert("Ratelimit-Limit", HeaderValue::from_static("800"));
    headers.insert("Ratelimit-Remaining", HeaderValue::from_static("799"));
    headers.insert("Ratelimit-Reset", HeaderValue::from_static("1700000000"));

    let snapshot = parse_rate_limit(&headers).unwrap();
    assert_eq!(snapshot.limit, 800);
    assert_eq!(snapshot.remaining, 799);
    assert_eq!(snapshot.reset_time.timestamp(), 1_700_000_000);
  }

  fn client() -> HelixClient {
    HelixClient::new(HelixConfig {
      client_id:     "cid".into(),
      client_secret: "secret".into(),
      api_base_url:  "http://127.0.0.1:9".into(),
      auth_url:      "http://127.0.0.1:9/token".into(),
    })
    .unwrap()
  }

  #[test]
  fn exhausted_quota_is_recorded() {
    let client = client();
    assert!(client.rate_limit().is_none());

    let mut headers = HeaderMap::new();
    headers.insert("Ratelimit-Limit", HeaderValue::from_static("800"));
    headers.insert("Ratelimit-Remaining", HeaderValue::from_static("0"));
    headers.insert("Ratelimit-Reset", HeaderValue::from_static("1700000060"));
    client.record_rate_limit(&headers);

    let snapshot = client.rate_limit().unwrap();
    assert_eq!(snapshot.remaining, 0);
    assert_eq!(snapshot.reset_time.timestamp(), 1_700_000_060);

    // A response without quota headers leaves the last snapshot alone.
    assert!(client.record_rate_limit(&HeaderMap::new()).is_none());
    assert_eq!(client.rate_limit(), Some(snapshot));
  }

  #[test]
  fn missing_rate_limit_headers_yield_none() {
    let mut headers = HeaderMap::new();
    headers.insert("Ratelimit-Limit", HeaderValue::from_static("800"));
    assert!(parse_rate_limit(&headers).is_none());
  }

  #[test]
  fn only_live_streams_become_records() {
    let body = serde_json::json!({
      "data": [
        {
          "id": "s1", "user_id": "42", "user_login": "foo", "game_id": "509658",
          "type": "live", "title": "Foo", "viewer_count": 12,
          "started_at": "2024-05-01T12:00:00Z",
          "thumbnail_url": "https://cdn/live_user_foo-{width}x{height}.jpg"
        },
        {
          "id": "", "user_id": "43", "user_login": "bar", "game_id": "",
          "type": "", "title": "", "viewer_count": 0,
          "started_at": "2024-05-01T12:00:00Z", "thumbnail_url": ""
        }
      ],
      "pagination": {}
    });
    let page: Page<HelixStream> = serde_json::from_value(body).unwrap();
    let records = live_records(page.data);

    assert_eq!(records.len(), 1);
    let rec = &records["42"];
    assert_eq!(rec.title, "Foo");
    assert_eq!(rec.viewer_count, 12);
    assert_eq!(rec.category_id, "509658");
    assert_eq!(rec.started_at.to_rfc3339(), "2024-05-01T12:00:00+00:00");
  }

  #[test]
  fn url_joins_base_and_path() {
    let client = HelixClient::new(HelixConfig {
      client_id:     "id".into(),
      client_secret: "secret".into(),
      api_base_url:  "http://localhost:9999/helix/".into(),
      auth_url:      DEFAULT_AUTH_URL.into(),
    })
    .unwrap();
    assert_eq!(client.url("/streams"), "http://localhost:9999/helix/streams");
  }
}
