//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{TimeDelta, TimeZone, Utc};
use tensei_core::{
  entity::{CommunitySettings, NotificationSubscription, Phase, TrackedEntity},
  store::{EntityField, EntityStore},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn entity(id: &str, login: &str) -> TrackedEntity {
  let mut e = TrackedEntity::new(id, login, login);
  e.subscriptions.push(NotificationSubscription::new("c1", "g1"));
  e.subscriptions.push(NotificationSubscription::new("c2", "g2"));
  e
}

// ─── Entities ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn upsert_and_load_all() {
  let s = store().await;
  s.upsert(&entity("1", "alpha")).await.unwrap();
  s.upsert(&entity("2", "beta")).await.unwrap();

  let all = s.load_all().await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].id, "1");
  assert_eq!(all[1].id, "2");
  assert_eq!(all[0].subscriptions.len(), 2);
  assert_eq!(all[0].phase(), Phase::Offline);
}

#[tokio::test]
async fn load_all_on_empty_store() {
  let s = store().await;
  assert!(s.load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn subscription_order_is_preserved() {
  let s = store().await;
  let mut e = entity("1", "alpha");
  e.subscriptions.insert(0, NotificationSubscription::new("c0", "g0"));
  s.upsert(&e).await.unwrap();

  let loaded = s.find_by_field(EntityField::Id, "1").await.unwrap().unwrap();
  let channels: Vec<_> = loaded
    .subscriptions
    .iter()
    .map(|sub| sub.destination_channel.as_str())
    .collect();
  assert_eq!(channels, ["c0", "c1", "c2"]);
}

#[tokio::test]
async fn upsert_replaces_fields_and_handles() {
  let s = store().await;
  let mut e = entity("1", "alpha");
  s.upsert(&e).await.unwrap();

  let start = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
  e.stream_start_time = start;
  e.display_name = "Alpha".into();
  e.profile_image_url = "https://img/a.png".into();
  e.subscriptions[0].last_message_handle = Some("m1".into());
  s.upsert(&e).await.unwrap();

  let loaded = s.find_by_field(EntityField::Id, "1").await.unwrap().unwrap();
  assert_eq!(loaded, e);
  assert_eq!(loaded.phase(), Phase::Live);
  assert_eq!(loaded.subscriptions[0].last_message_handle.as_deref(), Some("m1"));
  assert!(loaded.subscriptions[1].last_message_handle.is_none());
}

#[tokio::test]
async fn upsert_is_idempotent() {
  let s = store().await;
  let mut e = entity("1", "alpha");
  e.stream_start_time = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
  e.stream_end_time = e.stream_start_time + TimeDelta::hours(2);

  s.upsert(&e).await.unwrap();
  s.upsert(&e).await.unwrap();

  let all = s.load_all().await.unwrap();
  assert_eq!(all, vec![e]);
}

#[tokio::test]
async fn find_by_login_is_case_insensitive() {
  let s = store().await;
  s.upsert(&entity("1", "alpha")).await.unwrap();

  let found = s.find_by_field(EntityField::Login, "ALPHA").await.unwrap();
  assert_eq!(found.map(|e| e.id), Some("1".to_string()));
}

#[tokio::test]
async fn find_missing_returns_none() {
  let s = store().await;
  s.upsert(&entity("1", "alpha")).await.unwrap();

  assert!(s.find_by_field(EntityField::Id, "2").await.unwrap().is_none());
  assert!(s.find_by_field(EntityField::Login, "beta").await.unwrap().is_none());
}

// ─── Communities ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn community_settings_round_trip() {
  let s = store().await;
  assert!(s.get_community("g1").await.unwrap().is_none());

  let mut settings = CommunitySettings::new("g1", "owner");
  s.upsert_community(&settings).await.unwrap();
  assert_eq!(s.get_community("g1").await.unwrap(), Some(settings.clone()));

  settings.command_cooldown_secs = 10;
  settings.admin_role_id = Some("role".into());
  s.upsert_community(&settings).await.unwrap();
  assert_eq!(s.get_community("g1").await.unwrap(), Some(settings));
}
