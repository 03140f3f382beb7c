//! Cards: the structured notification payloads posted to destinations.
//!
//! The visual schema mirrors what chat platforms call an "embed". Only the
//! gateway knows how a card is rendered on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{entity::TrackedEntity, humanize_duration, source::StatusRecord};

pub const LIVE_COLOR: u32 = 0xFF0000;
pub const SUCCESS_COLOR: u32 = 0x00FF00;
pub const ERROR_COLOR: u32 = 0xFF0000;

/// Shown when the category lookup fails.
pub const UNKNOWN_CATEGORY: &str = "???";

/// RFC 822 with a fixed UTC zone, e.g. `02 Jan 06 15:04 UTC`.
const RFC822_UTC: &str = "%d %b %y %H:%M UTC";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardField {
  pub name:   String,
  pub value:  String,
  pub inline: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
  pub author_name:   Option<String>,
  pub author_url:    Option<String>,
  pub title:         Option<String>,
  pub url:           Option<String>,
  pub description:   Option<String>,
  pub image_url:     Option<String>,
  pub thumbnail_url: Option<String>,
  pub fields:        Vec<CardField>,
  pub color:         Option<u32>,
  pub footer:        Option<String>,
}

impl Card {
  pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
    self.fields.push(CardField { name: name.into(), value: value.into(), inline });
    self
  }

  /// A short green confirmation.
  pub fn success(message: impl Into<String>) -> Self {
    Self {
      description: Some(message.into()),
      color: Some(SUCCESS_COLOR),
      ..Self::default()
    }
  }

  /// A short red refusal.
  pub fn error(message: impl Into<String>) -> Self {
    Self {
      description: Some(message.into()),
      color: Some(ERROR_COLOR),
      ..Self::default()
    }
  }
}

/// Stream preview URL at 1920x1080, cache-busted with the current time.
fn preview_url(entity: &TrackedEntity, record: &StatusRecord, now: DateTime<Utc>) -> String {
  let base = if record.thumbnail_url.is_empty() {
    format!(
      "https://static-cdn.jtvnw.net/previews-ttv/live_user_{}-{{width}}x{{height}}.jpg",
      entity.login
    )
  } else {
    record.thumbnail_url.clone()
  };
  let url = base.replace("{width}", "1920").replace("{height}", "1080");
  format!("{url}?t={}", now.timestamp())
}

/// The card posted (and later edited) while an entity is live.
pub fn live_card(
  entity: &TrackedEntity,
  record: &StatusRecord,
  category_name: &str,
  now: DateTime<Utc>,
) -> Card {
  let channel_url = entity.channel_url();
  let live_for = now - record.started_at;

  Card {
    author_name: Some(entity.display_name.clone()),
    author_url: Some(channel_url.clone()),
    title: Some(record.title.clone()),
    url: Some(channel_url),
    image_url: Some(preview_url(entity, record, now)),
    thumbnail_url: Some(entity.profile_image_url.clone()),
    color: Some(LIVE_COLOR),
    footer: Some(format!("Live for {}", humanize_duration(live_for))),
    ..Card::default()
  }
  .field("Category", category_name, true)
  .field("Viewers", record.viewer_count.to_string(), true)
}

/// The final summary a live card is edited into once the broadcast ends.
pub fn ended_card(entity: &TrackedEntity) -> Card {
  let channel_url = entity.channel_url();
  let started = entity.stream_start_time.format(RFC822_UTC);
  let ended = entity.stream_end_time.format(RFC822_UTC);

  let description = format!(
    "**Started at:** {started}\n__**Ended at:** {ended}__\n**Total Time:** {}",
    humanize_duration(entity.stream_length())
  );

  Card {
    author_name: Some(format!("{} was Live", entity.display_name)),
    author_url: Some(channel_url.clone()),
    url: Some(channel_url),
    thumbnail_url: Some(entity.profile_image_url.clone()),
    description: Some(description),
    ..Card::default()
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeDelta, TimeZone};

  use super::*;

  fn entity() -> TrackedEntity {
    let mut e = TrackedEntity::new("42", "foo", "Foo");
    e.profile_image_url = "https://img/foo.png".into();
    e
  }

  fn record(started_at: DateTime<Utc>) -> StatusRecord {
    StatusRecord {
      entity_id: "42".into(),
      started_at,
      viewer_count: 17,
      category_id: "509658".into(),
      title: "Foo".into(),
      thumbnail_url: "https://cdn/live_user_foo-{width}x{height}.jpg".into(),
    }
  }

  #[test]
  fn live_card_carries_category_viewers_and_uptime() {
    let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    let now = start + TimeDelta::minutes(65);
    let card = live_card(&entity(), &record(start), "Just Chatting", now);

    assert_eq!(card.title.as_deref(), Some("Foo"));
    assert_eq!(card.url.as_deref(), Some("https://twitch.tv/foo"));
    assert_eq!(card.footer.as_deref(), Some("Live for 1 hour, 5 minutes"));
    assert_eq!(card.fields[0].value, "Just Chatting");
    assert_eq!(card.fields[1].value, "17");
    let image = card.image_url.unwrap();
    assert!(image.starts_with("https://cdn/live_user_foo-1920x1080.jpg?t="), "{image}");
  }

  #[test]
  fn ended_card_summarises_the_broadcast() {
    let mut e = entity();
    e.stream_start_time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    e.stream_end_time = Utc.with_ymd_and_hms(2024, 5, 1, 14, 1, 0).unwrap();

    let card = ended_card(&e);
    assert_eq!(card.author_name.as_deref(), Some("Foo was Live"));
    let description = card.description.unwrap();
    assert!(description.contains("01 May 24 12:00 UTC"), "{description}");
    assert!(description.contains("01 May 24 14:01 UTC"), "{description}");
    assert!(description.ends_with("**Total Time:** 2 hours, 1 minute"), "{description}");
  }
}
