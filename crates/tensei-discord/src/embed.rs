//! Rendering of [`Card`]s as Discord embeds.

use serde::Serialize;
use tensei_core::card::Card;

#[derive(Debug, Serialize)]
pub struct Embed {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author:      Option<EmbedAuthor>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub image:       Option<EmbedMedia>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub thumbnail:   Option<EmbedMedia>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub fields:      Vec<EmbedField>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub color:       Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub footer:      Option<EmbedFooter>,
}

#[derive(Debug, Serialize)]
pub struct EmbedAuthor {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url:  Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedMedia {
  pub url: String,
}

#[derive(Debug, Serialize)]
pub struct EmbedField {
  pub name:   String,
  pub value:  String,
  pub inline: bool,
}

#[derive(Debug, Serialize)]
pub struct EmbedFooter {
  pub text: String,
}

/// Message body carrying a single embed; used for both create and edit.
#[derive(Debug, Serialize)]
pub struct MessageBody {
  pub embeds: Vec<Embed>,
}

fn media(url: &Option<String>) -> Option<EmbedMedia> {
  url
    .as_ref()
    .filter(|u| !u.is_empty())
    .map(|u| EmbedMedia { url: u.clone() })
}

impl From<&Card> for Embed {
  fn from(card: &Card) -> Self {
    Self {
      author:      card.author_name.as_ref().map(|name| EmbedAuthor {
        name: name.clone(),
        url:  card.author_url.clone(),
      }),
      title:       card.title.clone(),
      url:         card.url.clone(),
      description: card.description.clone(),
      image:       media(&card.image_url),
      thumbnail:   media(&card.thumbnail_url),
      fields:      card
        .fields
        .iter()
        .map(|f| EmbedField { name: f.name.clone(), value: f.value.clone(), inline: f.inline })
        .collect(),
      color:       card.color,
      footer:      card.footer.as_ref().map(|text| EmbedFooter { text: text.clone() }),
    }
  }
}

impl MessageBody {
  pub fn from_card(card: &Card) -> Self { Self { embeds: vec![Embed::from(card)] } }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn card_renders_as_single_embed() {
    let card = Card {
      author_name: Some("Foo".into()),
      author_url: Some("https://twitch.tv/foo".into()),
      title: Some("Playing things".into()),
      thumbnail_url: Some(String::new()),
      color: Some(0xFF0000),
      footer: Some("Live for 1 minute".into()),
      ..Card::default()
    }
    .field("Viewers", "3", true);

    let body = serde_json::to_value(MessageBody::from_card(&card)).unwrap();
    assert_eq!(
      body,
      json!({
        "embeds": [{
          "author": { "name": "Foo", "url": "https://twitch.tv/foo" },
          "title": "Playing things",
          "fields": [{ "name": "Viewers", "value": "3", "inline": true }],
          "color": 16711680,
          "footer": { "text": "Live for 1 minute" }
        }]
      })
    );
  }
}
