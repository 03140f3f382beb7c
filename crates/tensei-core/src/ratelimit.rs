//! Last quota reported by the status source.
//!
//! The snapshot is advisory: it is logged and exposed to operators, but the
//! poll loop does not hold back requests based on it.

use std::{sync::RwLock, time::Duration};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
  pub limit:      u32,
  pub remaining:  u32,
  pub reset_time: DateTime<Utc>,
}

/// Records the most recent [`RateLimitSnapshot`] under its own lock.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
  last: RwLock<Option<RateLimitSnapshot>>,
}

impl RateLimitTracker {
  pub fn new() -> Self { Self::default() }

  pub fn record(&self, snapshot: RateLimitSnapshot) {
    let mut last = match self.last.write() {
      Ok(guard) => guard,
      Err(poisoned) => poisoned.into_inner(),
    };
    *last = Some(snapshot);
  }

  pub fn snapshot(&self) -> Option<RateLimitSnapshot> {
    match self.last.read() {
      Ok(guard) => *guard,
      Err(poisoned) => *poisoned.into_inner(),
    }
  }

}

/// How long to wait before the next request, given the last known quota.
///
/// No backoff policy exists yet; callers get [`Error::Unsupported`] and
/// retry on the next tick.
pub fn backoff(_last: Option<RateLimitSnapshot>) -> Result<Duration> {
  Err(Error::Unsupported("rate-limit backoff"))
}
