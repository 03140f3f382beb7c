//! The fixed-interval poll loop.
//!
//! Each tick snapshots the registry, looks statuses up in batches, and runs
//! one worker per entity on a [`JoinSet`]. The tick returns only when every
//! worker has finished, so at most one batch is ever in flight.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tensei_core::{
  SourceError,
  gateway::MessageGateway,
  ratelimit,
  source::{MAX_BATCH, StatusSource},
  store::EntityStore,
};
use tokio::{
  sync::{Semaphore, watch},
  task::JoinSet,
  time::{Instant, MissedTickBehavior},
};
use tracing::{error, info, warn};

use crate::Monitor;

/// Most entity workers running at once within a tick.
pub const MAX_CONCURRENT_WORKERS: usize = 16;

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
  /// Entities in the registry snapshot.
  pub entities:  usize,
  /// Entities whose transition was decided.
  pub evaluated: usize,
  /// Entities skipped because their status lookup failed.
  pub skipped:   usize,
  /// Evaluated entities whose transition touched destinations.
  pub notified:  usize,
}

impl<St, Src, Gw> Monitor<St, Src, Gw>
where
  St: EntityStore + 'static,
  Src: StatusSource + 'static,
  Gw: MessageGateway + 'static,
{
  /// Run one full poll cycle as of `now` and wait for every worker.
  pub async fn run_tick(self: &Arc<Self>, now: DateTime<Utc>) -> TickReport {
    let started = Instant::now();
    let entities = self.registry.snapshot().await;
    let mut report = TickReport { entities: entities.len(), ..TickReport::default() };
    info!(entities = report.entities, "poll tick started");

    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_WORKERS));
    let mut workers = JoinSet::new();

    for chunk in entities.chunks(MAX_BATCH) {
      let ids: Vec<String> = chunk.iter().map(|e| e.id.clone()).collect();
      let mut statuses = match self.source.get_status(&ids).await {
        Ok(statuses) => statuses,
        Err(err) => {
          report.skipped += chunk.len();
          self.status_lookup_failed(&err, chunk.len());
          continue;
        }
      };
      self.log_rate_limit();

      for entity in chunk {
        let status = statuses.remove(&entity.id);
        let entity = entity.clone();
        let monitor = Arc::clone(self);
        let permits = Arc::clone(&permits);
        workers.spawn(async move {
          let _permit = permits.acquire_owned().await;
          monitor.evaluate(entity, status.as_ref(), now).await
        });
      }
    }

    while let Some(joined) = workers.join_next().await {
      match joined {
        Ok(transition) => {
          report.evaluated += 1;
          if transition.notifies() {
            report.notified += 1;
          }
        }
        Err(err) => error!(error = %err, "entity worker aborted"),
      }
    }

    info!(
      elapsed_ms = started.elapsed().as_millis() as u64,
      evaluated = report.evaluated,
      skipped = report.skipped,
      notified = report.notified,
      "poll tick finished"
    );
    report
  }

  /// Tick every `interval` until `shutdown` flips or its sender is dropped.
  ///
  /// A shutdown signal received mid-tick takes effect once that tick's batch
  /// has completed.
  pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = interval.as_secs(), "poll scheduler started");

    loop {
      tokio::select! {
        _ = ticker.tick() => {
          self.run_tick(Utc::now()).await;
        }
        changed = shutdown.changed() => {
          if changed.is_err() || *shutdown.borrow() {
            break;
          }
        }
      }
    }
    info!("poll scheduler stopped");
  }

  fn status_lookup_failed(&self, err: &SourceError, count: usize) {
    warn!(error = %err, entities = count, "status lookup failed; skipping this tick");
    if let SourceError::RateLimited { retry_after } = err {
      match ratelimit::backoff(self.source.rate_limit()) {
        Ok(wait) => info!(wait_secs = wait.as_secs(), "backing off"),
        Err(reason) => warn!(?retry_after, %reason, "rate limited; retrying next tick"),
      }
    }
  }
}
