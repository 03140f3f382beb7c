//! Wire types for the subset of Helix endpoints we call.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;
use tensei_core::source::{ProfileInfo, StatusRecord};

/// Tokens are refreshed this long before Helix says they expire.
const EXPIRY_MARGIN: TimeDelta = TimeDelta::minutes(5);

/// Every Helix list endpoint wraps its results in `data`.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
  pub data: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct HelixStream {
  pub id:            String,
  pub user_id:       String,
  #[serde(default)]
  pub game_id:       String,
  #[serde(rename = "type", default)]
  pub kind:          String,
  #[serde(default)]
  pub title:         String,
  #[serde(default)]
  pub viewer_count:  u64,
  pub started_at:    DateTime<Utc>,
  #[serde(default)]
  pub thumbnail_url: String,
}

impl HelixStream {
  pub fn is_live(&self) -> bool { !self.id.is_empty() && self.kind == "live" }

  pub fn into_record(self) -> StatusRecord {
    StatusRecord {
      entity_id:     self.user_id,
      started_at:    self.started_at,
      viewer_count:  self.viewer_count,
      category_id:   self.game_id,
      title:         self.title,
      thumbnail_url: self.thumbnail_url,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct HelixGame {
  pub id:   String,
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct HelixUser {
  pub id:                String,
  pub login:             String,
  pub display_name:      String,
  #[serde(default)]
  pub profile_image_url: String,
}

impl HelixUser {
  pub fn into_profile(self) -> ProfileInfo {
    ProfileInfo {
      id:                self.id,
      login:             self.login,
      display_name:      self.display_name,
      profile_image_url: self.profile_image_url,
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
  pub access_token: String,
  pub expires_in:   i64,
}

#[derive(Debug, Clone)]
pub struct AppToken {
  pub access_token: String,
  pub expires_at:   DateTime<Utc>,
}

impl AppToken {
  pub fn from_response(resp: TokenResponse, now: DateTime<Utc>) -> Self {
    Self {
      access_token: resp.access_token,
      expires_at:   now + TimeDelta::seconds(resp.expires_in) - EXPIRY_MARGIN,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn token_expires_early() {
    let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let token = AppToken::from_response(
      TokenResponse { access_token: "abc".into(), expires_in: 3600 },
      now,
    );
    assert_eq!(token.expires_at, now + TimeDelta::minutes(55));
  }

  #[test]
  fn user_becomes_profile() {
    let user: HelixUser = serde_json::from_value(serde_json::json!({
      "id": "42",
      "login": "foo",
      "display_name": "Foo",
      "profile_image_url": "https://img/foo.png",
      "broadcaster_type": "partner"
    }))
    .unwrap();
    let profile = user.into_profile();
    assert_eq!(profile.id, "42");
    assert_eq!(profile.display_name, "Foo");
  }
}
