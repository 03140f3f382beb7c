//! The prefix command surface.
//!
//! A [`CommandEvent`] is one chat message. [`Command::parse`] turns its text
//! into a typed command, and [`Monitor::dispatch`] runs it, posting the reply
//! card back to the invoking channel. Commands share the registry with the
//! poll loop but never wait on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tensei_core::{
  Error, Result,
  card::{Card, UNKNOWN_CATEGORY, live_card},
  cooldown::CommandKind,
  entity::DEFAULT_COMMAND_COOLDOWN_SECS,
  gateway::MessageGateway,
  humanize_duration,
  source::StatusSource,
  store::EntityStore,
};
use tracing::{debug, info, warn};

use crate::Monitor;

/// A chat message that may carry a command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandEvent {
  pub community_id:   String,
  pub channel_id:     String,
  pub actor_id:       String,
  /// Whether the chat platform reports the actor as holding an admin role.
  #[serde(default)]
  pub actor_is_admin: bool,
  /// Role ids the actor holds in the community.
  #[serde(default)]
  pub actor_roles:    Vec<String>,
  pub content:        String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
  TwitchId(String),
  TwitchName(String),
  TwitchLive(String),
  TwitchAdd(String),
  TwitchSubscribe { login: String, channel: String },
  TwitchUnsubscribe { login: String, channel: String },
  Uptime,
  Stats,
}

impl Command {
  /// Parse `content` if it starts with `prefix` and names a known command.
  pub fn parse(prefix: &str, content: &str) -> Option<Self> {
    let rest = content.trim().strip_prefix(prefix)?;
    let mut words = rest.split_whitespace();
    let kind: CommandKind = words.next()?.parse().ok()?;

    match kind {
      CommandKind::Uptime => Some(Self::Uptime),
      CommandKind::Stats => Some(Self::Stats),
      CommandKind::Twitch => {
        let sub = words.next()?.to_ascii_lowercase();
        let target = words.next()?.to_owned();
        let channel = words.next().map(channel_id);
        match (sub.as_str(), channel) {
          ("id", _) => Some(Self::TwitchId(target)),
          ("name", _) => Some(Self::TwitchName(target)),
          ("live", _) => Some(Self::TwitchLive(target)),
          ("add", _) => Some(Self::TwitchAdd(target)),
          ("subscribe", Some(channel)) => Some(Self::TwitchSubscribe { login: target, channel }),
          ("unsubscribe", Some(channel)) => {
            Some(Self::TwitchUnsubscribe { login: target, channel })
          }
          _ => None,
        }
      }
    }
  }

  pub fn kind(&self) -> CommandKind {
    match self {
      Self::Uptime => CommandKind::Uptime,
      Self::Stats => CommandKind::Stats,
      _ => CommandKind::Twitch,
    }
  }

  fn cooldown_gated(&self) -> bool {
    matches!(self, Self::TwitchId(_) | Self::TwitchName(_) | Self::TwitchLive(_))
  }

  fn admin_only(&self) -> bool {
    matches!(
      self,
      Self::TwitchAdd(_) | Self::TwitchSubscribe { .. } | Self::TwitchUnsubscribe { .. }
    )
  }

  fn owner_only(&self) -> bool { matches!(self, Self::Uptime | Self::Stats) }
}

/// Accept both a bare channel id and a `<#id>` mention.
fn channel_id(raw: &str) -> String {
  raw
    .strip_prefix("<#")
    .and_then(|s| s.strip_suffix('>'))
    .unwrap_or(raw)
    .to_owned()
}

impl<St, Src, Gw> Monitor<St, Src, Gw>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  /// Run the command in `event`, if any, and post its reply.
  ///
  /// Returns the reply card, or `None` when the message was ignored: not a
  /// command, not permitted for this actor, or on cooldown.
  pub async fn dispatch(&self, event: &CommandEvent, now: DateTime<Utc>) -> Option<Card> {
    let command = Command::parse(&self.settings.prefix, &event.content)?;
    info!(
      command = %command.kind(),
      community = %event.community_id,
      channel = %event.channel_id,
      actor = %event.actor_id,
      "command received"
    );

    let community = match self.registry.store().get_community(&event.community_id).await {
      Ok(settings) => settings,
      Err(err) => {
        warn!(community = %event.community_id, error = %err, "community lookup failed");
        None
      }
    };
    let is_owner = !self.settings.owner_id.is_empty() && event.actor_id == self.settings.owner_id;
    let is_admin = is_owner
      || event.actor_is_admin
      || community.as_ref().is_some_and(|c| {
        c.owner_id == event.actor_id
          || c
            .admin_role_id
            .as_ref()
            .is_some_and(|role| event.actor_roles.contains(role))
      });

    if (command.owner_only() && !is_owner) || (command.admin_only() && !is_admin) {
      debug!(command = %command.kind(), actor = %event.actor_id, "command not permitted");
      return None;
    }

    if command.cooldown_gated() {
      let cooldown = community
        .as_ref()
        .map_or(DEFAULT_COMMAND_COOLDOWN_SECS, |c| c.command_cooldown_secs);
      if self.cooldowns.is_on_cooldown(
        command.kind(),
        &event.channel_id,
        &event.actor_id,
        cooldown,
        is_admin,
        now,
      ) {
        debug!(command = %command.kind(), channel = %event.channel_id, "command on cooldown");
        return None;
      }
    }

    let reply = match self.run_command(&command, event, now).await {
      Ok(card) => card,
      Err(err) => Card::error(err.to_string()),
    };

    if let Err(err) = self.gateway.send(&event.channel_id, &reply).await {
      warn!(channel = %event.channel_id, error = %err, "failed to post command reply");
    }
    Some(reply)
  }

  async fn run_command(
    &self,
    command: &Command,
    event: &CommandEvent,
    now: DateTime<Utc>,
  ) -> Result<Card> {
    match command {
      Command::TwitchId(login) => {
        let profile = self
          .source
          .find_profile_by_login(login)
          .await?
          .ok_or_else(|| Error::NotFound(format!("twitch user {login}")))?;
        Ok(profile_card(&profile.display_name, &profile.login, &profile.profile_image_url)
          .field("ID", profile.id, false))
      }
      Command::TwitchName(id) => {
        let mut profiles = self.source.get_profiles(std::slice::from_ref(id)).await?;
        let profile = profiles
          .remove(id)
          .ok_or_else(|| Error::NotFound(format!("twitch user {id}")))?;
        Ok(profile_card(&profile.id, &profile.login, &profile.profile_image_url)
          .field("Name", profile.display_name, false))
      }
      Command::TwitchLive(login) => {
        let status = self.live_status(login).await?;
        match (&status.stream, status.category.as_deref()) {
          (Some(record), category) => Ok(live_card(
            &status.entity,
            record,
            category.unwrap_or(UNKNOWN_CATEGORY),
            now,
          )),
          (None, _) => Ok(Card {
            author_name: Some(status.entity.display_name.clone()),
            author_url: Some(status.entity.channel_url()),
            thumbnail_url: Some(status.entity.profile_image_url.clone()),
            description: Some(format!("{} is offline", status.entity.display_name)),
            ..Card::default()
          }),
        }
      }
      Command::TwitchAdd(login) => {
        let entity = self.track(login).await?;
        Ok(Card::success(format!("Now tracking {}", entity.display_name)))
      }
      Command::TwitchSubscribe { login, channel } => {
        let entity = self.subscribe(login, channel, &event.community_id).await?;
        Ok(Card::success(format!(
          "<#{channel}> will receive live alerts for {}",
          entity.display_name
        )))
      }
      Command::TwitchUnsubscribe { login, channel } => {
        self.unsubscribe(login, channel).await?;
        Ok(Card::success("Subscription removed"))
      }
      Command::Uptime => {
        let uptime = humanize_duration(now - self.started_at);
        Ok(
          Card::default()
            .field("Started", self.started_at.format("%b %e %H:%M:%S").to_string(), true)
            .field("Uptime", if uptime.is_empty() { "under a minute".into() } else { uptime }, true),
        )
      }
      Command::Stats => {
        let entities = self.registry.snapshot().await;
        let subscriptions: usize = entities.iter().map(|e| e.subscriptions.len()).sum();
        let quota = self
          .rate_limit()
          .map_or_else(|| "unknown".to_owned(), |r| format!("{}/{}", r.remaining, r.limit));
        Ok(Card { title: Some("Stats".into()), ..Card::default() }
          .field("Entities", entities.len().to_string(), true)
          .field("Subscriptions", subscriptions.to_string(), true)
          .field("Rate limit", quota, true))
      }
    }
  }
}

fn profile_card(title: &str, login: &str, image: &str) -> Card {
  Card {
    title: Some(title.to_owned()),
    url: Some(format!("https://twitch.tv/{login}")),
    thumbnail_url: Some(image.to_owned()),
    ..Card::default()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_twitch_subcommands() {
    assert_eq!(Command::parse("!", "!twitch id Foo"), Some(Command::TwitchId("Foo".into())));
    assert_eq!(Command::parse("!", "!TWITCH live foo"), Some(Command::TwitchLive("foo".into())));
    assert_eq!(
      Command::parse("!", "!twitch subscribe foo <#123>"),
      Some(Command::TwitchSubscribe { login: "foo".into(), channel: "123".into() })
    );
    assert_eq!(
      Command::parse("!", "!twitch unsubscribe foo 123"),
      Some(Command::TwitchUnsubscribe { login: "foo".into(), channel: "123".into() })
    );
  }

  #[test]
  fn parses_owner_commands() {
    assert_eq!(Command::parse("!", "!uptime"), Some(Command::Uptime));
    assert_eq!(Command::parse("?", "  ?stats  "), Some(Command::Stats));
  }

  #[test]
  fn ignores_everything_else() {
    assert_eq!(Command::parse("!", "hello there"), None);
    assert_eq!(Command::parse("!", "!translate en hi"), None);
    assert_eq!(Command::parse("!", "!twitch"), None);
    assert_eq!(Command::parse("!", "!twitch id"), None);
    assert_eq!(Command::parse("!", "!twitch subscribe foo"), None);
    assert_eq!(Command::parse("!", "!twitch dance foo"), None);
  }

  #[test]
  fn kinds_and_permissions() {
    let add = Command::TwitchAdd("foo".into());
    assert_eq!(add.kind(), CommandKind::Twitch);
    assert!(add.admin_only());
    assert!(!add.cooldown_gated());
    assert!(Command::TwitchId("foo".into()).cooldown_gated());
    assert!(Command::Stats.owner_only());
  }
}
