//! One entity's evaluation within a poll tick.

use chrono::{DateTime, Utc};
use tensei_core::{
  card::{UNKNOWN_CATEGORY, ended_card, live_card},
  entity::{Phase, TrackedEntity},
  gateway::MessageGateway,
  humanize_duration,
  source::{StatusRecord, StatusSource},
  store::EntityStore,
  transition::{COOLING_OFF, Transition, decide},
};
use tracing::{debug, info, warn};

use crate::{Monitor, fanout};

impl<St, Src, Gw> Monitor<St, Src, Gw>
where
  St: EntityStore,
  Src: StatusSource,
  Gw: MessageGateway,
{
  /// Decide and apply one transition for `entity`.
  ///
  /// `entity` is the worker's own copy; it is committed back to the registry
  /// only if the cycle changed it. `status` must come from a successful
  /// lookup, where `None` means offline.
  pub(crate) async fn evaluate(
    &self,
    mut entity: TrackedEntity,
    status: Option<&StatusRecord>,
    now: DateTime<Utc>,
  ) -> Transition {
    let before = entity.clone();
    let transition = decide(&entity, status, now);

    let card = match (transition, status) {
      (Transition::Started, Some(record)) => {
        entity.stream_start_time = record.started_at;
        self.refresh_profile(&mut entity).await;
        info!(
          entity = %entity.login,
          started_at = %record.started_at.format("%H:%M:%S UTC"),
          "stream started"
        );
        let category = self.category_name(&record.category_id).await;
        live_card(&entity, record, &category, now)
      }
      (Transition::Update, Some(record)) => {
        if entity.phase() == Phase::Offline {
          entity.stream_start_time = record.started_at;
          info!(entity = %entity.login, "first seen live");
        }
        debug!(entity = %entity.login, "updating cards");
        let category = self.category_name(&record.category_id).await;
        live_card(&entity, record, &category, now)
      }
      (Transition::Ended, _) => {
        entity.stream_end_time = now - COOLING_OFF;
        info!(
          entity = %entity.login,
          length = %humanize_duration(entity.stream_length()),
          "stream ended"
        );
        ended_card(&entity)
      }
      _ => return transition,
    };

    let report = fanout::apply(&self.gateway, &mut entity, transition, &card).await;
    debug!(
      entity = %entity.login,
      sent = report.sent,
      edited = report.edited,
      failed = report.failed,
      skipped = report.skipped,
      "fan-out finished"
    );

    if entity != before {
      self.registry.update_after_cycle(entity).await;
    }
    transition
  }

  /// The category's display name, or a placeholder if the lookup fails.
  pub(crate) async fn category_name(&self, category_id: &str) -> String {
    match self.source.get_metadata(category_id).await {
      Ok(info) => info.name,
      Err(err) => {
        debug!(%category_id, error = %err, "category lookup failed");
        UNKNOWN_CATEGORY.to_owned()
      }
    }
  }

  /// Pull fresh descriptive data from the source. Failures keep the old data.
  async fn refresh_profile(&self, entity: &mut TrackedEntity) {
    match self.source.get_profiles(std::slice::from_ref(&entity.id)).await {
      Ok(mut profiles) => {
        if let Some(profile) = profiles.remove(&entity.id) {
          entity.login = profile.login.to_lowercase();
          entity.display_name = profile.display_name;
          entity.profile_image_url = profile.profile_image_url;
        }
      }
      Err(err) => warn!(entity = %entity.login, error = %err, "profile refresh failed"),
    }
  }
}
