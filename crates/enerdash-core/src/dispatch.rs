//! User edit intake: validation, optimistic apply, partial updates.
//!
//! An [`EditIntent`] is the injectable "the operator changed something"
//! event, independent of how the value was solicited (inline input,
//! toggle, slider gesture). The dispatcher validates it against the
//! panel's schema, applies it optimistically to the store, and posts a
//! partial body carrying exactly the changed field(s).

use std::sync::Arc;

use tracing::{debug, warn};

use enerdash_types::{DeviceKind, FieldValue, nest_fields};

use crate::client::Transport;
use crate::error::{Error, Result};
use crate::schema::{DeviceSchema, ValidationError, schema_for};
use crate::store::{DeviceStore, EditOutcome};

/// A user-initiated field change, before validation.
#[derive(Debug, Clone, PartialEq)]
pub enum EditIntent {
    /// Raw text entered for a numeric field.
    Scalar { field: String, raw: String },
    /// An enumeration selection.
    Mode { field: String, value: String },
    /// A boolean switch.
    Flag { field: String, enabled: bool },
    /// One slider gesture over a min/max pair.
    Range { pair: String, min: f64, max: f64 },
}

impl EditIntent {
    /// Raw-text edit of a numeric field.
    pub fn scalar(field: impl Into<String>, raw: impl Into<String>) -> Self {
        EditIntent::Scalar {
            field: field.into(),
            raw: raw.into(),
        }
    }

    /// Mode selection.
    pub fn mode(field: impl Into<String>, value: impl Into<String>) -> Self {
        EditIntent::Mode {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Switch toggle.
    pub fn flag(field: impl Into<String>, enabled: bool) -> Self {
        EditIntent::Flag {
            field: field.into(),
            enabled,
        }
    }

    /// Atomic range-pair edit.
    pub fn range(pair: impl Into<String>, min: f64, max: f64) -> Self {
        EditIntent::Range {
            pair: pair.into(),
            min,
            max,
        }
    }

    /// The field (or pair) path this intent targets.
    pub fn field(&self) -> &str {
        match self {
            EditIntent::Scalar { field, .. }
            | EditIntent::Mode { field, .. }
            | EditIntent::Flag { field, .. } => field,
            EditIntent::Range { pair, .. } => pair,
        }
    }
}

/// Accepts edit intents for one panel and drives them to the backend.
pub struct EditDispatcher {
    kind: DeviceKind,
    schema: &'static DeviceSchema,
    store: Arc<DeviceStore>,
    transport: Arc<dyn Transport>,
}

impl EditDispatcher {
    /// Create a dispatcher for one panel.
    pub fn new(kind: DeviceKind, store: Arc<DeviceStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            kind,
            schema: schema_for(kind),
            store,
            transport,
        }
    }

    /// Validate an intent without submitting it.
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] that [`EditDispatcher::submit`]
    /// would reject the intent with.
    pub fn validate(&self, intent: &EditIntent) -> std::result::Result<Vec<(String, FieldValue)>, ValidationError> {
        self.schema.validate(intent, &self.store.snapshot())
    }

    /// Submit an edit: validate, apply optimistically, POST the changed
    /// field(s), and resolve the pending state from the response.
    ///
    /// # Errors
    ///
    /// Validation failures reject before the store is touched. Transport
    /// failures leave the optimistic value in the store with the field
    /// marked unsynced, and are returned to the caller.
    pub async fn submit(&self, intent: EditIntent) -> Result<()> {
        let edits = self.validate(&intent)?;
        let Some(seq) = self.store.begin_edit(&edits) else {
            return Err(Error::Closed);
        };
        self.write_edits(edits, seq).await
    }

    /// Validate and apply the optimistic edit synchronously, then run the
    /// network write on a background task. For renderer call sites that
    /// must not block on the backend.
    ///
    /// # Errors
    ///
    /// Only validation failures are reported here; the write itself
    /// resolves through the store (pending/unsynced markers). Against an
    /// already-closed store the intent is silently dropped.
    pub fn submit_background(
        self: &Arc<Self>,
        intent: EditIntent,
    ) -> std::result::Result<(), ValidationError> {
        let edits = self.validate(&intent)?;
        let Some(seq) = self.store.begin_edit(&edits) else {
            debug!(kind = %self.kind, "edit dropped, panel is shut down");
            return Ok(());
        };
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = dispatcher.write_edits(edits, seq).await {
                warn!(kind = %dispatcher.kind, error = %e, "edit write failed");
            }
        });
        Ok(())
    }

    async fn write_edits(&self, edits: Vec<(String, FieldValue)>, seq: u64) -> Result<()> {
        let fields: Vec<String> = edits.iter().map(|(path, _)| path.clone()).collect();
        let body = nest_fields(&edits);
        debug!(kind = %self.kind, seq, body = %body, "posting edit");

        match self.transport.send(self.kind, body).await {
            Ok(_ack) => {
                self.store.resolve_edit(&fields, seq, EditOutcome::Confirmed);
                Ok(())
            }
            Err(e) => {
                self.store.resolve_edit(&fields, seq, EditOutcome::Failed);
                Err(e)
            }
        }
    }

    /// The store this dispatcher writes through.
    pub fn store(&self) -> &Arc<DeviceStore> {
        &self.store
    }

    /// The schema used for validation.
    pub fn schema(&self) -> &'static DeviceSchema {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use serde_json::json;

    fn dispatcher_for(
        kind: DeviceKind,
        transport: &Arc<MockTransport>,
    ) -> (Arc<EditDispatcher>, Arc<DeviceStore>) {
        let store = Arc::new(DeviceStore::new(schema_for(kind)));
        let dispatcher = Arc::new(EditDispatcher::new(
            kind,
            store.clone(),
            transport.clone() as Arc<dyn Transport>,
        ));
        (dispatcher, store)
    }

    #[tokio::test]
    async fn test_submit_posts_only_the_changed_field() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::PowerMeter, &transport);

        dispatcher
            .submit(EditIntent::scalar("current_limit", "15"))
            .await
            .unwrap();

        assert_eq!(store.snapshot().number("current_limit"), Some(15.0));
        assert!(!store.is_pending("current_limit"));
        assert_eq!(
            transport.posted(),
            vec![(DeviceKind::PowerMeter, json!({"current_limit": 15.0}))]
        );
    }

    #[tokio::test]
    async fn test_phase_pair_posts_nested_body_on_aggregate_endpoint() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::Load, &transport);

        dispatcher
            .submit(EditIntent::range("phase1.load_limit", 20.0, 80.0))
            .await
            .unwrap();

        assert_eq!(
            transport.posted(),
            vec![(
                DeviceKind::Load,
                json!({"phase1": {"load_limit_min": 20.0, "load_limit_max": 80.0}})
            )]
        );
        let snap = store.snapshot();
        assert_eq!(snap.number("phase1.load_limit_min"), Some(20.0));
        assert_eq!(snap.number("phase1.load_limit_max"), Some(80.0));
    }

    #[tokio::test]
    async fn test_dedicated_phase_endpoint_posts_flat_body() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, _store) = dispatcher_for(DeviceKind::LoadPhase(2), &transport);

        dispatcher
            .submit(EditIntent::range("load_limit", 10.0, 90.0))
            .await
            .unwrap();

        assert_eq!(
            transport.posted(),
            vec![(
                DeviceKind::LoadPhase(2),
                json!({"load_limit_min": 10.0, "load_limit_max": 90.0})
            )]
        );
    }

    #[tokio::test]
    async fn test_flag_edit_posts_integer() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::Solar, &transport);

        dispatcher
            .submit(EditIntent::flag("manual_mode", true))
            .await
            .unwrap();

        assert_eq!(store.snapshot().flag("manual_mode"), Some(true));
        assert_eq!(
            transport.posted(),
            vec![(DeviceKind::Solar, json!({"manual_mode": 1}))]
        );
    }

    #[tokio::test]
    async fn test_invalid_intent_never_touches_store_or_wire() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::Load, &transport);

        let err = dispatcher
            .submit(EditIntent::range("phase1.load_limit", 80.0, 20.0))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Validation(ValidationError::RangeInverted { .. })
        ));
        assert!(store.snapshot().is_empty());
        assert!(transport.posted().is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_optimistic_value_unsynced() {
        let transport = Arc::new(MockTransport::builder().fail_sends(true).build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::Battery, &transport);

        let err = dispatcher
            .submit(EditIntent::scalar("state_of_charge", "55"))
            .await
            .unwrap_err();
        assert!(err.is_transport());

        let snap = store.snapshot();
        assert_eq!(snap.number("state_of_charge"), Some(55.0));
        assert!(!store.is_pending("state_of_charge"));
        assert!(store.is_unsynced("state_of_charge"));
    }

    #[tokio::test]
    async fn test_out_of_order_responses_keep_the_newer_value() {
        let transport = Arc::new(MockTransport::builder().manual_sends().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::PowerMeter, &transport);

        let d1 = dispatcher.clone();
        let first = tokio::spawn(async move {
            d1.submit(EditIntent::scalar("current_limit", "12")).await
        });
        let in_flight_1 = transport.next_send().await;

        let d2 = dispatcher.clone();
        let second = tokio::spawn(async move {
            d2.submit(EditIntent::scalar("current_limit", "18")).await
        });
        let in_flight_2 = transport.next_send().await;

        // e2's response lands first; e1's arrives late and must not
        // release the pending marker guarding e2's value.
        in_flight_2.confirm();
        second.await.unwrap().unwrap();
        in_flight_1.confirm();
        first.await.unwrap().unwrap();

        assert_eq!(store.snapshot().number("current_limit"), Some(18.0));
        assert!(!store.is_pending("current_limit"));

        // Even a stale poll echoing e1's value cannot regress the field
        // once the next poll reports the settled state.
        store.apply_poll(vec![(
            "current_limit".to_string(),
            FieldValue::Number(18.0),
        )]);
        assert_eq!(store.snapshot().number("current_limit"), Some(18.0));
    }

    #[tokio::test]
    async fn test_write_resolving_after_shutdown_is_a_no_op() {
        let transport = Arc::new(MockTransport::builder().manual_sends().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::PowerMeter, &transport);

        let d = dispatcher.clone();
        let write =
            tokio::spawn(async move { d.submit(EditIntent::scalar("current_limit", "15")).await });
        let in_flight = transport.next_send().await;

        // Panel torn down while the write is still in flight.
        store.close();
        in_flight.confirm();
        write.await.unwrap().unwrap();

        // The frozen store kept its pre-shutdown pending marker untouched.
        assert!(store.is_pending("current_limit"));
        assert!(store.is_closed());
    }

    #[tokio::test]
    async fn test_submit_background_reports_validation_synchronously() {
        let transport = Arc::new(MockTransport::builder().build());
        let (dispatcher, store) = dispatcher_for(DeviceKind::PowerMeter, &transport);

        let err = dispatcher
            .submit_background(EditIntent::scalar("current_limit", "abc"))
            .unwrap_err();
        assert_eq!(err, ValidationError::NotANumber("abc".to_string()));
        assert!(store.snapshot().is_empty());

        // A valid intent applies optimistically before the write lands.
        dispatcher
            .submit_background(EditIntent::scalar("current_limit", "22"))
            .unwrap();
        assert_eq!(store.snapshot().number("current_limit"), Some(22.0));
    }
}
