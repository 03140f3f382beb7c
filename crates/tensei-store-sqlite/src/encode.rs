//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. UUIDs are stored as
//! hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use tensei_core::entity::{CommunitySettings, NotificationSubscription, TrackedEntity};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const ENTITY_COLUMNS: &str =
  "entity_id, login, display_name, profile_image_url, stream_start_time, stream_end_time";

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, entity_id, destination_channel, \
                                        destination_community, last_message_handle";

/// Raw strings read directly from an `entities` row.
pub struct RawEntity {
  pub entity_id:         String,
  pub login:             String,
  pub display_name:      String,
  pub profile_image_url: String,
  pub stream_start_time: String,
  pub stream_end_time:   String,
}

impl RawEntity {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entity_id:         row.get(0)?,
      login:             row.get(1)?,
      display_name:      row.get(2)?,
      profile_image_url: row.get(3)?,
      stream_start_time: row.get(4)?,
      stream_end_time:   row.get(5)?,
    })
  }

  /// Assemble the entity; `subscriptions` must already be in list order.
  pub fn into_entity(self, subscriptions: Vec<NotificationSubscription>) -> Result<TrackedEntity> {
    Ok(TrackedEntity {
      id: self.entity_id,
      login: self.login,
      display_name: self.display_name,
      profile_image_url: self.profile_image_url,
      stream_start_time: decode_dt(&self.stream_start_time)?,
      stream_end_time: decode_dt(&self.stream_end_time)?,
      subscriptions,
    })
  }
}

/// Raw strings read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:       String,
  pub entity_id:             String,
  pub destination_channel:   String,
  pub destination_community: String,
  pub last_message_handle:   Option<String>,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:       row.get(0)?,
      entity_id:             row.get(1)?,
      destination_channel:   row.get(2)?,
      destination_community: row.get(3)?,
      last_message_handle:   row.get(4)?,
    })
  }

  pub fn into_subscription(self) -> Result<NotificationSubscription> {
    Ok(NotificationSubscription {
      subscription_id:       decode_uuid(&self.subscription_id)?,
      destination_channel:   self.destination_channel,
      destination_community: self.destination_community,
      last_message_handle:   self.last_message_handle.filter(|h| !h.is_empty()),
    })
  }
}

/// Raw values read directly from a `communities` row.
pub struct RawCommunity {
  pub community_id:          String,
  pub owner_id:              String,
  pub admin_role_id:         Option<String>,
  pub command_cooldown_secs: i64,
}

impl RawCommunity {
  pub fn into_settings(self) -> CommunitySettings {
    CommunitySettings {
      community_id:          self.community_id,
      owner_id:              self.owner_id,
      admin_role_id:         self.admin_role_id,
      command_cooldown_secs: self.command_cooldown_secs,
    }
  }
}
