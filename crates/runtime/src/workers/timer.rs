//! Repeating timer that starts cycles.

use std::sync::{Arc, Weak};

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::cycle::run_cycle;
use crate::scheduler::{CycleClaim, Shared};

/// Spawns the timer task. The first fire is one full period after the call.
///
/// The task holds only a weak reference, so dropping every scheduler handle
/// also ends the timer.
pub(crate) fn spawn_timer(shared: Weak<Shared>, period: std::time::Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let Some(shared) = shared.upgrade() else {
                break;
            };
            match shared.try_begin_cycle() {
                CycleClaim::Claimed => {
                    tokio::spawn(run_cycle(Arc::clone(&shared)));
                }
                CycleClaim::Busy => continue,
                CycleClaim::NotRunning => break,
            }
        }
    })
}
