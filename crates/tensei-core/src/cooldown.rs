//! Per-channel cooldowns for interactive commands.
//!
//! Each [`CommandKind`] owns its own table of channel → next-eligible
//! instant. One member's use arms the cooldown for everyone in that channel.

use std::{collections::HashMap, sync::Mutex};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator as _};

/// The commands subject to cooldowns.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum CommandKind {
  Twitch,
  Uptime,
  Stats,
}

/// Channel id → instant the command becomes usable again.
type CooldownTable = HashMap<String, DateTime<Utc>>;

#[derive(Debug)]
pub struct CooldownGate {
  tables: Mutex<HashMap<CommandKind, CooldownTable>>,
}

impl Default for CooldownGate {
  fn default() -> Self {
    let tables = CommandKind::iter().map(|kind| (kind, CooldownTable::new())).collect();
    Self { tables: Mutex::new(tables) }
  }
}

impl CooldownGate {
  pub fn new() -> Self { Self::default() }

  /// Whether `kind` is on cooldown in `channel` for this actor.
  ///
  /// When it is not, the next window of `cooldown_secs` is armed for the
  /// whole channel. Admins and owners always pass and never arm a window.
  /// The actor never keys the table: cooldowns are per channel.
  pub fn is_on_cooldown(
    &self,
    kind: CommandKind,
    channel: &str,
    _actor: &str,
    cooldown_secs: i64,
    actor_is_admin_or_owner: bool,
    now: DateTime<Utc>,
  ) -> bool {
    if actor_is_admin_or_owner {
      return false;
    }

    let mut tables = match self.tables.lock() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    let table = tables.entry(kind).or_default();

    match table.get(channel) {
      Some(next) if now <= *next => true,
      _ => {
        table.insert(channel.to_owned(), now + TimeDelta::seconds(cooldown_secs));
        false
      }
    }
  }
}
