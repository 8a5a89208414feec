//! One device's synchronization instance: store + poll loop + dispatcher.

use std::sync::Arc;
use std::time::Duration;

use enerdash_types::{DeviceKind, DeviceState};

use crate::client::Transport;
use crate::dispatch::EditDispatcher;
use crate::poll::{PollHandle, spawn_poll_loop};
use crate::schema::{DeviceSchema, schema_for};
use crate::store::DeviceStore;

/// A running panel: the store being refreshed by its poll loop, and the
/// dispatcher accepting edits for it.
///
/// Panels are mutually independent; the dashboard runs one per device
/// (and can run one per load phase against the dedicated phase
/// endpoints).
pub struct Panel {
    kind: DeviceKind,
    store: Arc<DeviceStore>,
    dispatcher: Arc<EditDispatcher>,
    poll: PollHandle,
}

impl Panel {
    /// Spawn a panel polling at the device type's configured cadence.
    pub fn spawn(kind: DeviceKind, transport: Arc<dyn Transport>) -> Self {
        Self::spawn_with_period(kind, transport, kind.poll_interval())
    }

    /// Spawn a panel with an overridden polling period.
    pub fn spawn_with_period(
        kind: DeviceKind,
        transport: Arc<dyn Transport>,
        period: Duration,
    ) -> Self {
        let store = Arc::new(DeviceStore::new(schema_for(kind)));
        let dispatcher = Arc::new(EditDispatcher::new(
            kind,
            store.clone(),
            transport.clone(),
        ));
        let poll = spawn_poll_loop(transport, kind, store.clone(), period);
        Self {
            kind,
            store,
            dispatcher,
            poll,
        }
    }

    /// Which device this panel tracks.
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// The panel's state store.
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    /// The panel's edit dispatcher.
    pub fn dispatcher(&self) -> &Arc<EditDispatcher> {
        &self.dispatcher
    }

    /// The panel's field schema.
    pub fn schema(&self) -> &'static DeviceSchema {
        self.store.schema()
    }

    /// Current merged view of the device.
    pub fn snapshot(&self) -> DeviceState {
        self.store.snapshot()
    }

    /// Tear the panel down: cancel the poll timer and freeze the store so
    /// any write still in flight resolves into a no-op. Idempotent.
    pub fn shutdown(&self) {
        self.poll.stop();
        self.store.close();
    }
}

impl std::fmt::Debug for Panel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Panel")
            .field("kind", &self.kind)
            .field("stopped", &self.poll.is_stopped())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;

    #[tokio::test(start_paused = true)]
    async fn test_panel_polls_at_device_cadence() {
        let transport = Arc::new(
            MockTransport::builder()
                .state(DeviceKind::Solar, json!({"temperature": 25.0}))
                .build(),
        );
        let panel = Panel::spawn(DeviceKind::Solar, transport.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(transport.fetch_count(), 1);
        assert_eq!(panel.snapshot().number("temperature"), Some(25.0));

        // Solar polls every 30 s; nothing for a while, then one more.
        tokio::time::sleep(Duration::from_millis(29_000)).await;
        assert_eq!(transport.fetch_count(), 1);
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(transport.fetch_count(), 2);

        panel.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_polling_and_freezes_state() {
        let transport = Arc::new(
            MockTransport::builder()
                .state(DeviceKind::Battery, json!({"state_of_charge": 60.0}))
                .build(),
        );
        let panel = Panel::spawn(DeviceKind::Battery, transport.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(panel.snapshot().number("state_of_charge"), Some(60.0));

        panel.shutdown();
        panel.shutdown(); // idempotent

        let fetches = transport.fetch_count();
        transport.set_state(DeviceKind::Battery, json!({"state_of_charge": 10.0}));
        tokio::time::sleep(Duration::from_millis(5_000)).await;

        assert_eq!(transport.fetch_count(), fetches);
        assert_eq!(panel.snapshot().number("state_of_charge"), Some(60.0));
    }
}
