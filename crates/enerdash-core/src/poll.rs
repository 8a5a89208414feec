//! Periodic state refresh for one panel.
//!
//! Each panel owns one poll task: tick, GET, flatten, merge into the
//! store. Failures are logged and the loop keeps going on the next tick;
//! there is no backoff and no immediate retry. Stopping is cooperative
//! via a cancellation token and idempotent.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use enerdash_types::{DeviceKind, flatten_fields};

use crate::client::Transport;
use crate::store::DeviceStore;

/// Handle to a running poll loop.
///
/// Dropping the handle does not stop the loop; call [`PollHandle::stop`]
/// when tearing the panel down. Stopping twice (or before the task ever
/// ran) is safe.
#[derive(Debug)]
pub struct PollHandle {
    cancel: CancellationToken,
}

impl PollHandle {
    /// Cancel the poll loop. Idempotent.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Whether the loop has been told to stop.
    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Spawn the poll loop for one panel.
///
/// The first tick fires immediately (the panel fetches on mount), then
/// every `period`. Each successful fetch is flattened and merged via
/// [`DeviceStore::apply_poll`], which keeps pending edits intact.
pub fn spawn_poll_loop(
    transport: Arc<dyn Transport>,
    kind: DeviceKind,
    store: Arc<DeviceStore>,
    period: Duration,
) -> PollHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut consecutive_failures = 0u32;

        debug!(%kind, ?period, "poll loop started");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(%kind, "poll loop stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match transport.fetch(kind).await {
                Ok(object) => {
                    consecutive_failures = 0;
                    store.apply_poll(flatten_fields(&object));
                }
                Err(e) => {
                    consecutive_failures += 1;
                    if consecutive_failures <= 3 {
                        warn!(%kind, error = %e, attempt = consecutive_failures, "poll failed");
                    } else if consecutive_failures == 4 {
                        error!(
                            %kind,
                            "poll failed {} times, will continue trying silently",
                            consecutive_failures
                        );
                    }
                    // Keep polling; the backend may come back.
                }
            }
        }
    });

    PollHandle { cancel }
}
