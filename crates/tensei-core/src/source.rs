//! The `StatusSource` trait: where live/offline state comes from.
//!
//! Implemented by `tensei-twitch`. The engine depends on this abstraction so
//! it can be driven by an in-memory fake in tests.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{SourceError, ratelimit::RateLimitSnapshot};

/// Most ids a single status or profile lookup may carry.
pub const MAX_BATCH: usize = 100;

/// One entity's current broadcast, as reported by the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
  pub entity_id:     String,
  pub started_at:    DateTime<Utc>,
  pub viewer_count:  u64,
  pub category_id:   String,
  pub title:         String,
  /// Preview image URL; may contain `{width}` and `{height}` placeholders.
  pub thumbnail_url: String,
}

/// A category (game) the entity is broadcasting under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryInfo {
  pub id:   String,
  pub name: String,
}

/// Descriptive profile data for an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
  pub id:                String,
  pub login:             String,
  pub display_name:      String,
  pub profile_image_url: String,
}

/// Abstraction over the external live-status service.
///
/// A successful [`get_status`](StatusSource::get_status) that omits an id
/// means that entity is offline. An `Err` means nothing is known about any of
/// the requested ids.
pub trait StatusSource: Send + Sync {
  /// Current broadcasts for a batch of entity ids.
  fn get_status<'a>(
    &'a self,
    ids: &'a [String],
  ) -> impl Future<Output = Result<HashMap<String, StatusRecord>, SourceError>> + Send + 'a;

  /// Resolve a category id to its metadata.
  fn get_metadata<'a>(
    &'a self,
    category_id: &'a str,
  ) -> impl Future<Output = Result<CategoryInfo, SourceError>> + Send + 'a;

  /// Profiles for a batch of entity ids; unknown ids are omitted.
  fn get_profiles<'a>(
    &'a self,
    ids: &'a [String],
  ) -> impl Future<Output = Result<HashMap<String, ProfileInfo>, SourceError>> + Send + 'a;

  /// Resolve a login name to a profile. Returns `None` if no such entity.
  fn find_profile_by_login<'a>(
    &'a self,
    login: &'a str,
  ) -> impl Future<Output = Result<Option<ProfileInfo>, SourceError>> + Send + 'a;

  /// The quota most recently reported by the source, if any call succeeded.
  fn rate_limit(&self) -> Option<RateLimitSnapshot>;
}
