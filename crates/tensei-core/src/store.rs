//! The `EntityStore` trait and supporting lookup types.
//!
//! The trait is implemented by storage backends (e.g. `tensei-store-sqlite`).
//! The store is a durability sink: the in-memory registry is authoritative
//! while the process runs, and the store only mirrors it.

use std::future::Future;

use crate::entity::{CommunitySettings, TrackedEntity};

/// Columns an entity can be looked up by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityField {
  /// Exact match on the source-assigned id.
  Id,
  /// Case-insensitive match on the login name.
  Login,
}

/// Abstraction over a persistent entity store backend.
///
/// All methods return `Send` futures so the trait can be used from tasks
/// spawned on a multi-threaded tokio runtime.
pub trait EntityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Entities ──────────────────────────────────────────────────────────

  /// Every tracked entity with its subscriptions, in registration order.
  fn load_all(
    &self,
  ) -> impl Future<Output = Result<Vec<TrackedEntity>, Self::Error>> + Send + '_;

  /// Insert or fully replace an entity and its subscription list.
  ///
  /// Saving an unchanged entity again has no visible effect.
  fn upsert<'a>(
    &'a self,
    entity: &'a TrackedEntity,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Look up one entity. Returns `None` if nothing matches.
  fn find_by_field<'a>(
    &'a self,
    field: EntityField,
    value: &'a str,
  ) -> impl Future<Output = Result<Option<TrackedEntity>, Self::Error>> + Send + 'a;

  // ── Communities ───────────────────────────────────────────────────────

  fn get_community<'a>(
    &'a self,
    community_id: &'a str,
  ) -> impl Future<Output = Result<Option<CommunitySettings>, Self::Error>> + Send + 'a;

  fn upsert_community<'a>(
    &'a self,
    settings: &'a CommunitySettings,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
