//! End-to-end synchronization scenarios against the mock backend.
//!
//! These drive whole panels (store + poll loop + dispatcher) with paused
//! tokio time, covering the interleavings the core exists to get right:
//! optimistic edits racing slow polls, conditional fields, and atomic
//! range-pair updates.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use enerdash_core::{EditIntent, MockTransport, Panel};
use enerdash_types::DeviceKind;

#[tokio::test(start_paused = true)]
async fn double_click_edit_survives_stale_poll_then_converges() {
    let transport = Arc::new(
        MockTransport::builder()
            .state(
                DeviceKind::PowerMeter,
                json!({"voltage": 230.0, "current_limit": 10.0}),
            )
            .manual_sends()
            .build(),
    );
    let panel = Panel::spawn(DeviceKind::PowerMeter, transport.clone());

    // Mount-time poll.
    tokio::time::sleep(Duration::from_millis(10)).await;
    let snap = panel.snapshot();
    assert_eq!(snap.number("voltage"), Some(230.0));
    assert_eq!(snap.number("current_limit"), Some(10.0));

    // Operator double-clicks the limit and enters "15": the store shows
    // the new value immediately, before any network round trip.
    panel
        .dispatcher()
        .submit_background(EditIntent::scalar("current_limit", "15"))
        .unwrap();
    assert_eq!(panel.snapshot().number("current_limit"), Some(15.0));
    assert!(panel.store().is_pending("current_limit"));

    // A full poll period passes while the write is still in flight; the
    // backend still reports the old limit, but the pending edit shields
    // the field. Other fields keep refreshing.
    transport.set_state(
        DeviceKind::PowerMeter,
        json!({"voltage": 230.7, "current_limit": 10.0}),
    );
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snap = panel.snapshot();
    assert_eq!(snap.number("current_limit"), Some(15.0));
    assert_eq!(snap.number("voltage"), Some(230.7));

    // The write completes; the backend has absorbed the edit.
    let held = transport.next_send().await;
    assert_eq!(held.kind, DeviceKind::PowerMeter);
    assert_eq!(held.body, json!({"current_limit": 15.0}));
    held.confirm();
    transport.set_state(
        DeviceKind::PowerMeter,
        json!({"voltage": 231.0, "current_limit": 15.0}),
    );

    // The next poll is authoritative again and clears the pending state.
    tokio::time::sleep(Duration::from_millis(1100)).await;
    let snap = panel.snapshot();
    assert!(!panel.store().is_pending("current_limit"));
    assert_eq!(snap.number("current_limit"), Some(15.0));
    assert_eq!(snap.number("voltage"), Some(231.0));

    panel.shutdown();
}

#[tokio::test(start_paused = true)]
async fn slider_gesture_updates_both_bounds_atomically() {
    let transport = Arc::new(
        MockTransport::builder()
            .state(
                DeviceKind::Load,
                json!({
                    "total_power": 2100.0,
                    "current_limit": 16.0,
                    "phase1": {"voltage": 230.0, "current": 3.0, "power": 690.0,
                               "load_limit_min": 0.0, "load_limit_max": 100.0},
                    "phase2": {"voltage": 229.0, "current": 2.8, "power": 641.0,
                               "load_limit_min": 0.0, "load_limit_max": 100.0},
                    "phase3": {"voltage": 231.0, "current": 3.1, "power": 716.0,
                               "load_limit_min": 0.0, "load_limit_max": 100.0},
                }),
            )
            .build(),
    );
    let panel = Panel::spawn(DeviceKind::Load, transport.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    panel
        .dispatcher()
        .submit(EditIntent::range("phase1.load_limit", 20.0, 80.0))
        .await
        .unwrap();

    // One POST, nested exactly like the browser dashboard sends it.
    assert_eq!(
        transport.posted_to(DeviceKind::Load),
        vec![json!({"phase1": {"load_limit_min": 20.0, "load_limit_max": 80.0}})]
    );

    // Never a transient [20, old_max]: both bounds moved together.
    let snap = panel.snapshot();
    assert_eq!(snap.number("phase1.load_limit_min"), Some(20.0));
    assert_eq!(snap.number("phase1.load_limit_max"), Some(80.0));
    // Sibling phases untouched.
    assert_eq!(snap.number("phase2.load_limit_min"), Some(0.0));

    panel.shutdown();
}

#[tokio::test(start_paused = true)]
async fn dedicated_phase_panel_edits_flat() {
    let transport = Arc::new(
        MockTransport::builder()
            .state(
                DeviceKind::LoadPhase(1),
                json!({"voltage": 230.0, "current": 3.0, "power": 690.0,
                       "load_limit_min": 0.0, "load_limit_max": 100.0}),
            )
            .build(),
    );
    let panel = Panel::spawn(DeviceKind::LoadPhase(1), transport.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    panel
        .dispatcher()
        .submit(EditIntent::range("load_limit", 25.0, 75.0))
        .await
        .unwrap();

    assert_eq!(
        transport.posted_to(DeviceKind::LoadPhase(1)),
        vec![json!({"load_limit_min": 25.0, "load_limit_max": 75.0})]
    );

    panel.shutdown();
}

#[tokio::test(start_paused = true)]
async fn switching_solar_mode_reveals_and_preserves_battery_mode() {
    let transport = Arc::new(
        MockTransport::builder()
            .state(
                DeviceKind::Inverter,
                json!({"power": 800.0, "solar_use_mode": "SelfUse",
                       "battery_use_mode": "Charge", "manual_mode": 0}),
            )
            .build(),
    );
    let panel = Panel::spawn(DeviceKind::Inverter, transport.clone());
    tokio::time::sleep(Duration::from_millis(10)).await;

    let schema = panel.schema();
    let dependent = schema.field("battery_use_mode").unwrap();

    // Hidden under SelfUse, but the value is already tracked.
    let snap = panel.snapshot();
    assert!(!schema.is_visible(dependent, &snap));
    assert_eq!(snap.mode("battery_use_mode"), Some("Charge"));

    // Editing the hidden field is refused outright.
    assert!(
        panel
            .dispatcher()
            .submit(EditIntent::mode("battery_use_mode", "Discharge"))
            .await
            .is_err()
    );

    // Selecting Manual reveals it, preserved value intact.
    panel
        .dispatcher()
        .submit(EditIntent::mode("solar_use_mode", "Manual"))
        .await
        .unwrap();
    let snap = panel.snapshot();
    assert!(schema.is_visible(dependent, &snap));
    assert_eq!(snap.mode("battery_use_mode"), Some("Charge"));

    // Now the dependent field is editable.
    panel
        .dispatcher()
        .submit(EditIntent::mode("battery_use_mode", "Discharge"))
        .await
        .unwrap();
    assert_eq!(panel.snapshot().mode("battery_use_mode"), Some("Discharge"));
    assert_eq!(
        transport.posted_to(DeviceKind::Inverter),
        vec![
            json!({"solar_use_mode": "Manual"}),
            json!({"battery_use_mode": "Discharge"}),
        ]
    );

    panel.shutdown();
}

#[tokio::test(start_paused = true)]
async fn panels_poll_independently_at_their_own_cadence() {
    let transport = Arc::new(
        MockTransport::builder()
            .state(DeviceKind::PowerMeter, json!({"voltage": 230.0}))
            .state(DeviceKind::Solar, json!({"temperature": 24.0}))
            .state(DeviceKind::Load, json!({"total_power": 1000.0}))
            .build(),
    );

    let meter = Panel::spawn(DeviceKind::PowerMeter, transport.clone());
    let solar = Panel::spawn(DeviceKind::Solar, transport.clone());
    let load = Panel::spawn(DeviceKind::Load, transport.clone());

    // After ~9 s: meter has fetched 10x (1 s), load 4x (3 s), solar 1x (30 s).
    tokio::time::sleep(Duration::from_millis(9_100)).await;
    assert_eq!(transport.fetch_count(), 10 + 4 + 1);

    // Stopping one panel must not disturb the others.
    meter.shutdown();
    let at_shutdown = transport.fetch_count();
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    let after = transport.fetch_count();
    assert!(after > at_shutdown);
    assert_eq!(meter.snapshot().number("voltage"), Some(230.0));

    solar.shutdown();
    load.shutdown();
}
