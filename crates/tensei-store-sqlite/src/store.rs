//! [`SqliteStore`], the SQLite implementation of [`EntityStore`].

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tensei_core::{
  entity::{CommunitySettings, NotificationSubscription, TrackedEntity},
  store::{EntityField, EntityStore},
};

use crate::{
  Result,
  encode::{
    ENTITY_COLUMNS, RawCommunity, RawEntity, RawSubscription, SUBSCRIPTION_COLUMNS, encode_dt,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tensei entity store backed by a single SQLite file.
///
/// Clones share one reference-counted connection.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Owned column values for one subscription row, ready to move into a
/// connection closure.
struct SubscriptionRow {
  subscription_id:       String,
  position:              i64,
  destination_channel:   String,
  destination_community: String,
  last_message_handle:   Option<String>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Subscriptions of the given entities, grouped by entity id, each group in
  /// list order. `None` loads every subscription.
  async fn load_subscriptions(
    &self,
    entity_id: Option<String>,
  ) -> Result<HashMap<String, Vec<NotificationSubscription>>> {
    let raws: Vec<RawSubscription> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(id) = entity_id {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions
             WHERE entity_id = ?1 ORDER BY position"
          ))?;
          stmt
            .query_map(rusqlite::params![id], RawSubscription::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions ORDER BY entity_id, position"
          ))?;
          stmt
            .query_map([], RawSubscription::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    let mut grouped: HashMap<String, Vec<NotificationSubscription>> = HashMap::new();
    for raw in raws {
      let entity_id = raw.entity_id.clone();
      grouped.entry(entity_id).or_default().push(raw.into_subscription()?);
    }
    Ok(grouped)
  }
}

// ─── EntityStore impl ────────────────────────────────────────────────────────

impl EntityStore for SqliteStore {
  type Error = crate::Error;

  // ── Entities ──────────────────────────────────────────────────────────────

  async fn load_all(&self) -> Result<Vec<TrackedEntity>> {
    let raws: Vec<RawEntity> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ENTITY_COLUMNS} FROM entities ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], RawEntity::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let mut subscriptions = self.load_subscriptions(None).await?;
    raws
      .into_iter()
      .map(|raw| {
        let subs = subscriptions.remove(&raw.entity_id).unwrap_or_default();
        raw.into_entity(subs)
      })
      .collect()
  }

  async fn upsert(&self, entity: &TrackedEntity) -> Result<()> {
    let entity_id    = entity.id.clone();
    let login        = entity.login.to_lowercase();
    let display_name = entity.display_name.clone();
    let image_url    = entity.profile_image_url.clone();
    let start_str    = encode_dt(entity.stream_start_time);
    let end_str      = encode_dt(entity.stream_end_time);
    let now_str      = encode_dt(Utc::now());
    let rows: Vec<SubscriptionRow> = entity
      .subscriptions
      .iter()
      .enumerate()
      .map(|(position, sub)| SubscriptionRow {
        subscription_id:       encode_uuid(sub.subscription_id),
        position:              position as i64,
        destination_channel:   sub.destination_channel.clone(),
        destination_community: sub.destination_community.clone(),
        last_message_handle:   sub.last_message_handle.clone(),
      })
      .collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO entities (
             entity_id, login, display_name, profile_image_url,
             stream_start_time, stream_end_time, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
           ON CONFLICT(entity_id) DO UPDATE SET
             login             = excluded.login,
             display_name      = excluded.display_name,
             profile_image_url = excluded.profile_image_url,
             stream_start_time = excluded.stream_start_time,
             stream_end_time   = excluded.stream_end_time,
             updated_at        = excluded.updated_at",
          rusqlite::params![
            entity_id,
            login,
            display_name,
            image_url,
            start_str,
            end_str,
            now_str,
          ],
        )?;

        tx.execute(
          "DELETE FROM subscriptions WHERE entity_id = ?1",
          rusqlite::params![entity_id],
        )?;
        for row in &rows {
          tx.execute(
            "INSERT INTO subscriptions (
               subscription_id, entity_id, position,
               destination_channel, destination_community, last_message_handle
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
              row.subscription_id,
              entity_id,
              row.position,
              row.destination_channel,
              row.destination_community,
              row.last_message_handle,
            ],
          )?;
        }

        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn find_by_field(
    &self,
    field: EntityField,
    value: &str,
  ) -> Result<Option<TrackedEntity>> {
    let sql = match field {
      EntityField::Id => format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE entity_id = ?1"),
      EntityField::Login => {
        format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE login = lower(?1)")
      }
    };
    let value = value.to_owned();

    let raw: Option<RawEntity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawEntity::from_row)
            .optional()?,
        )
      })
      .await?;

    let Some(raw) = raw else {
      return Ok(None);
    };
    let subs = self
      .load_subscriptions(Some(raw.entity_id.clone()))
      .await?
      .remove(&raw.entity_id)
      .unwrap_or_default();
    raw.into_entity(subs).map(Some)
  }

  // ── Communities ───────────────────────────────────────────────────────────

  async fn get_community(&self, community_id: &str) -> Result<Option<CommunitySettings>> {
    let id = community_id.to_owned();

    let raw: Option<RawCommunity> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT community_id, owner_id, admin_role_id, command_cooldown_secs
               FROM communities WHERE community_id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawCommunity {
                  community_id:          row.get(0)?,
                  owner_id:              row.get(1)?,
                  admin_role_id:         row.get(2)?,
                  command_cooldown_secs: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    Ok(raw.map(RawCommunity::into_settings))
  }

  async fn upsert_community(&self, settings: &CommunitySettings) -> Result<()> {
    let settings = settings.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO communities (community_id, owner_id, admin_role_id, command_cooldown_secs)
           VALUES (?1, ?2, ?3, ?4)
           ON CONFLICT(community_id) DO UPDATE SET
             owner_id              = excluded.owner_id,
             admin_role_id         = excluded.admin_role_id,
             command_cooldown_secs = excluded.command_cooldown_secs",
          rusqlite::params![
            settings.community_id,
            settings.owner_id,
            settings.admin_role_id,
            settings.command_cooldown_secs,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
