//! Tracked entities and the destinations that receive their cards.
//!
//! An entity's phase is not stored. It is derived from the sign of
//! `stream_end_time - stream_start_time`, which is also what the persistent
//! store keeps, so older rows stay readable.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel for "never happened". Both stream timestamps of a freshly
/// registered entity hold this value.
pub const NEVER: DateTime<Utc> = DateTime::<Utc>::UNIX_EPOCH;

// ─── Phase ───────────────────────────────────────────────────────────────────

/// Where an entity stands in its broadcast lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
  /// Never seen live: start and end coincide.
  Offline,
  /// Currently broadcasting: the last start is after the last end.
  Live,
  /// The last broadcast has finished: the end is after the start.
  Ended,
}

impl Phase {
  /// Classify a stream length (`end - start`).
  pub fn from_stream_length(length: TimeDelta) -> Self {
    match length.cmp(&TimeDelta::zero()) {
      std::cmp::Ordering::Less => Self::Live,
      std::cmp::Ordering::Equal => Self::Offline,
      std::cmp::Ordering::Greater => Self::Ended,
    }
  }
}

// ─── Subscription ────────────────────────────────────────────────────────────

/// A destination channel receiving cards for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSubscription {
  pub subscription_id:       Uuid,
  pub destination_channel:   String,
  pub destination_community: String,
  /// Handle of the card currently tracking a live broadcast, if any.
  pub last_message_handle:   Option<String>,
}

impl NotificationSubscription {
  pub fn new(
    destination_channel: impl Into<String>,
    destination_community: impl Into<String>,
  ) -> Self {
    Self {
      subscription_id:       Uuid::new_v4(),
      destination_channel:   destination_channel.into(),
      destination_community: destination_community.into(),
      last_message_handle:   None,
    }
  }
}

// ─── Entity ──────────────────────────────────────────────────────────────────

/// A broadcaster whose live status is monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedEntity {
  /// Stable identifier assigned by the status source.
  pub id:                String,
  /// Lowercase login, used for URLs and name lookups.
  pub login:             String,
  pub display_name:      String,
  pub profile_image_url: String,
  pub stream_start_time: DateTime<Utc>,
  pub stream_end_time:   DateTime<Utc>,
  /// Unique per `destination_channel`, kept in insertion order.
  pub subscriptions:     Vec<NotificationSubscription>,
}

impl TrackedEntity {
  /// A freshly registered entity that has never been seen live.
  pub fn new(
    id: impl Into<String>,
    login: impl Into<String>,
    display_name: impl Into<String>,
  ) -> Self {
    Self {
      id:                id.into(),
      login:             login.into().to_lowercase(),
      display_name:      display_name.into(),
      profile_image_url: String::new(),
      stream_start_time: NEVER,
      stream_end_time:   NEVER,
      subscriptions:     Vec::new(),
    }
  }

  /// `end - start`; negative while live, positive once ended.
  pub fn stream_length(&self) -> TimeDelta {
    self.stream_end_time - self.stream_start_time
  }

  pub fn phase(&self) -> Phase { Phase::from_stream_length(self.stream_length()) }

  /// Public channel URL on the status source's site.
  pub fn channel_url(&self) -> String { format!("https://twitch.tv/{}", self.login) }

  pub fn has_subscription(&self, channel: &str) -> bool {
    self
      .subscriptions
      .iter()
      .any(|s| s.destination_channel == channel)
  }

  pub fn clear_handles(&mut self) {
    for sub in &mut self.subscriptions {
      sub.last_message_handle = None;
    }
  }
}

// ─── Community ───────────────────────────────────────────────────────────────

pub const DEFAULT_COMMAND_COOLDOWN_SECS: i64 = 3;

/// Per-community settings consulted by the command surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunitySettings {
  pub community_id:          String,
  pub owner_id:              String,
  pub admin_role_id:         Option<String>,
  pub command_cooldown_secs: i64,
}

impl CommunitySettings {
  pub fn new(community_id: impl Into<String>, owner_id: impl Into<String>) -> Self {
    Self {
      community_id:          community_id.into(),
      owner_id:              owner_id.into(),
      admin_role_id:         None,
      command_cooldown_secs: DEFAULT_COMMAND_COOLDOWN_SECS,
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  fn at(secs: i64) -> DateTime<Utc> { Utc.timestamp_opt(secs, 0).unwrap() }

  #[test]
  fn fresh_entity_is_offline() {
    let e = TrackedEntity::new("1", "Foo", "Foo");
    assert_eq!(e.login, "foo");
    assert_eq!(e.stream_length(), TimeDelta::zero());
    assert_eq!(e.phase(), Phase::Offline);
  }

  #[test]
  fn phase_follows_sign_of_stream_length() {
    let mut e = TrackedEntity::new("1", "foo", "Foo");
    e.stream_start_time = at(1_000);
    assert_eq!(e.phase(), Phase::Live);

    e.stream_end_time = at(2_000);
    assert_eq!(e.phase(), Phase::Ended);
    assert_eq!(e.stream_length(), TimeDelta::seconds(1_000));
  }

  #[test]
  fn clear_handles_resets_every_subscription() {
    let mut e = TrackedEntity::new("1", "foo", "Foo");
    let mut a = NotificationSubscription::new("c1", "g1");
    a.last_message_handle = Some("m1".into());
    e.subscriptions.push(a);
    e.subscriptions.push(NotificationSubscription::new("c2", "g1"));

    e.clear_handles();
    assert!(e.subscriptions.iter().all(|s| s.last_message_handle.is_none()));
    assert!(e.has_subscription("c2"));
    assert!(!e.has_subscription("c3"));
  }
}
