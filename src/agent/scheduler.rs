//! The outer posting loop.
//!
//! On startup the scheduler looks at the last recorded publish: if the
//! minimum interval has already elapsed it runs a cycle immediately,
//! otherwise it first sleeps out the remainder. After that every cycle is
//! followed by a uniform random wait in the configured [min, max] minute
//! range. Cycle failures are logged and never stop the loop.

use crate::agent::cycle::{CycleExecutor, CyclePolicy};
use crate::store::StateStore;
use rand::Rng as _;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::time::Duration;

/// Drives the infinite post/sleep loop.
pub struct Scheduler {
    executor: CycleExecutor,
    policy: Box<dyn CyclePolicy>,
    store: Arc<StateStore>,
    min_interval_minutes: u64,
    max_interval_minutes: u64,
}

impl Scheduler {
    pub fn new(
        executor: CycleExecutor,
        policy: Box<dyn CyclePolicy>,
        store: Arc<StateStore>,
        min_interval_minutes: u64,
        max_interval_minutes: u64,
    ) -> Self {
        Self {
            executor,
            policy,
            store,
            min_interval_minutes,
            max_interval_minutes,
        }
    }

    /// Run the loop forever. Returns only if the future is dropped
    /// (process shutdown).
    pub async fn run(mut self) {
        if let Some(latest) = self.store.latest_publish().await {
            let elapsed_minutes = (chrono::Utc::now().timestamp() - latest.timestamp) / 60;
            match initial_wait(
                elapsed_minutes,
                self.min_interval_minutes,
                self.max_interval_minutes,
            ) {
                None => {
                    tracing::info!(
                        elapsed_minutes,
                        "last publish is past the minimum interval, running immediately"
                    );
                }
                Some(range) => {
                    let minutes = rand::rng().random_range(range);
                    tracing::info!(
                        elapsed_minutes,
                        wait_minutes = minutes,
                        "waiting out the remainder of the posting interval"
                    );
                    tokio::time::sleep(Duration::from_secs(minutes * 60)).await;
                }
            }
        }

        loop {
            let kind = self.policy.next_kind();
            tracing::info!(%kind, "starting cycle");
            if let Err(error) = self.executor.run(kind).await {
                tracing::error!(%error, %kind, "cycle failed");
            }

            let minutes =
                rand::rng().random_range(self.min_interval_minutes..=self.max_interval_minutes);
            tracing::info!(wait_minutes = minutes, "next cycle scheduled");
            tokio::time::sleep(Duration::from_secs(minutes * 60)).await;
        }
    }
}

/// Compute the startup wait range in minutes given how long ago the last
/// publish happened. `None` means run a cycle immediately. Bounds clamp to
/// zero; a degenerate result (inverted configuration, clock skew) falls
/// back to the plain [min, max] draw.
fn initial_wait(elapsed_minutes: i64, min: u64, max: u64) -> Option<RangeInclusive<u64>> {
    let full_range = Some(min.min(max)..=max.max(min));
    let Ok(elapsed) = u64::try_from(elapsed_minutes) else {
        // Last publish in the future: clock skew, treat as no history.
        return full_range;
    };
    if elapsed > min {
        return None;
    }

    let lo = min.saturating_sub(elapsed);
    let hi = max.saturating_sub(elapsed);
    if hi < lo {
        return full_range;
    }
    Some(lo..=hi)
}
