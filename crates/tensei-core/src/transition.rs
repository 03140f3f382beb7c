//! The stream state machine.
//!
//! [`decide`] is a pure function over the last known entity, the status
//! source's answer and the current time. It picks exactly one transition;
//! applying it (sending cards, moving timestamps) is the engine's job.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  entity::{Phase, TrackedEntity},
  source::StatusRecord,
};

/// No transition fires until this long after the recorded end time. Ended
/// entities have their end time backdated by the same amount.
pub const COOLING_OFF: TimeDelta = TimeDelta::minutes(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
  /// Within the cooling-off window after an end; nothing happens.
  CoolingOff,
  /// Not live, and was not live before.
  StillOffline,
  /// Went live after a finished broadcast: fresh cards everywhere.
  Started,
  /// Still live (or first seen live): edit cards, send where none exist.
  Update,
  /// Went offline: edit cards into a summary and drop their handles.
  Ended,
}

impl Transition {
  /// Whether this transition touches any destination.
  pub fn notifies(self) -> bool { matches!(self, Self::Started | Self::Update | Self::Ended) }
}

/// Pick the transition for one entity on one tick.
///
/// `status` must come from a successful status lookup; `None` means the
/// source confirmed the entity is offline. The phase is computed once and
/// the rules are checked in a fixed order: cooling-off first, then the
/// phase/status table.
pub fn decide(
  entity: &TrackedEntity,
  status: Option<&StatusRecord>,
  now: DateTime<Utc>,
) -> Transition {
  if now - entity.stream_end_time < COOLING_OFF {
    return Transition::CoolingOff;
  }

  match (entity.phase(), status) {
    (Phase::Offline | Phase::Ended, None) => Transition::StillOffline,
    (Phase::Ended, Some(_)) => Transition::Started,
    (Phase::Offline | Phase::Live, Some(_)) => Transition::Update,
    (Phase::Live, None) => Transition::Ended,
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;
  use crate::entity::NEVER;

  fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() }

  fn live_record(started_at: DateTime<Utc>) -> StatusRecord {
    StatusRecord {
      entity_id: "1".into(),
      started_at,
      viewer_count: 10,
      category_id: "c".into(),
      title: "Foo".into(),
      thumbnail_url: String::new(),
    }
  }

  fn ended_entity() -> TrackedEntity {
    let mut e = TrackedEntity::new("1", "foo", "Foo");
    e.stream_start_time = t0() - TimeDelta::hours(5);
    e.stream_end_time = t0() - TimeDelta::hours(3);
    e
  }

  fn live_entity() -> TrackedEntity {
    let mut e = ended_entity();
    e.stream_start_time = t0() - TimeDelta::hours(1);
    e
  }

  #[test]
  fn ended_entity_going_live_starts() {
    let rec = live_record(t0());
    assert_eq!(decide(&ended_entity(), Some(&rec), t0()), Transition::Started);
  }

  #[test]
  fn ended_entity_staying_offline_is_still_offline() {
    assert_eq!(decide(&ended_entity(), None, t0()), Transition::StillOffline);
  }

  #[test]
  fn live_entity_staying_live_updates() {
    let rec = live_record(t0() - TimeDelta::hours(1));
    assert_eq!(decide(&live_entity(), Some(&rec), t0()), Transition::Update);
  }

  #[test]
  fn live_entity_going_offline_ends() {
    assert_eq!(decide(&live_entity(), None, t0()), Transition::Ended);
  }

  #[test]
  fn never_seen_entity_reported_live_is_an_update_not_a_start() {
    let e = TrackedEntity::new("1", "foo", "Foo");
    assert_eq!(e.stream_start_time, NEVER);
    assert_eq!(e.stream_end_time, NEVER);
    assert_eq!(e.stream_length(), TimeDelta::zero());

    let rec = live_record(t0());
    assert_eq!(decide(&e, Some(&rec), t0()), Transition::Update);
    assert_eq!(decide(&e, None, t0()), Transition::StillOffline);
  }

  #[test]
  fn cooling_off_suppresses_everything() {
    let mut e = ended_entity();
    e.stream_end_time = t0() - TimeDelta::minutes(2);
    let rec = live_record(t0());

    assert_eq!(decide(&e, Some(&rec), t0()), Transition::CoolingOff);
    assert_eq!(decide(&e, None, t0()), Transition::CoolingOff);
  }

  #[test]
  fn cooling_off_ends_at_exactly_three_minutes() {
    let mut e = ended_entity();
    e.stream_end_time = t0() - COOLING_OFF;
    let rec = live_record(t0());
    assert_eq!(decide(&e, Some(&rec), t0()), Transition::Started);
  }

  #[test]
  fn absent_twice_within_window_ends_only_once() {
    // First absent tick ends the broadcast and backdates the end time.
    let mut e = live_entity();
    assert_eq!(decide(&e, None, t0()), Transition::Ended);
    e.stream_end_time = t0() - COOLING_OFF;

    let soon = t0() + TimeDelta::seconds(30);
    assert_ne!(decide(&e, None, soon), Transition::Ended);
  }

  #[test]
  fn only_notifying_transitions_touch_destinations() {
    assert!(Transition::Started.notifies());
    assert!(Transition::Update.notifies());
    assert!(Transition::Ended.notifies());
    assert!(!Transition::CoolingOff.notifies());
    assert!(!Transition::StillOffline.notifies());
  }
}
