//! Mock transport for testing without a live backend.
//!
//! Scripts per-device GET responses, records every POST body, and can
//! hold in-flight sends open so tests resolve them in any order. Used by
//! the crate's own tests and available to downstream consumers.
//!
//! # Example
//!
//! ```
//! use enerdash_core::{MockTransport, Transport};
//! use enerdash_types::DeviceKind;
//! use serde_json::json;
//!
//! # async fn example() {
//! let transport = MockTransport::builder()
//!     .state(DeviceKind::Solar, json!({"temperature": 25.0}))
//!     .build();
//!
//! let state = transport.fetch(DeviceKind::Solar).await.unwrap();
//! assert_eq!(state["temperature"], json!(25.0));
//! # }
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use tokio::sync::{Notify, oneshot};

use enerdash_types::DeviceKind;

use crate::client::Transport;
use crate::error::{Error, Result};

/// A POST held open by a [`MockTransport`] in manual-send mode.
///
/// The submitting task stays parked on its `submit` future until the test
/// resolves this handle, which is how out-of-order response arrival is
/// reproduced deterministically.
#[derive(Debug)]
pub struct InFlightSend {
    /// Target device of the held POST.
    pub kind: DeviceKind,
    /// The partial-update body as submitted.
    pub body: Value,
    reply: oneshot::Sender<Result<Value>>,
}

impl InFlightSend {
    /// Complete the send with an arbitrary result.
    pub fn resolve(self, result: Result<Value>) {
        let _ = self.reply.send(result);
    }

    /// Complete the send with the backend's usual success ack.
    pub fn confirm(self) {
        self.resolve(Ok(json!({"status": "success"})));
    }

    /// Complete the send with an injected transport failure.
    pub fn fail(self) {
        self.resolve(Err(Error::Unavailable("injected send failure".to_string())));
    }
}

/// Scripted stand-in for the backend.
pub struct MockTransport {
    /// Sticky state per device, returned by every fetch.
    states: Mutex<HashMap<DeviceKind, Value>>,
    /// One-shot states consumed before the sticky state.
    queued: Mutex<HashMap<DeviceKind, VecDeque<Value>>>,
    posted: Mutex<Vec<(DeviceKind, Value)>>,
    fetches: AtomicUsize,
    fail_fetches: AtomicBool,
    fail_sends: AtomicBool,
    manual_sends: bool,
    held_sends: Mutex<VecDeque<InFlightSend>>,
    send_arrived: Notify,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("fetches", &self.fetches.load(Ordering::Relaxed))
            .field("manual_sends", &self.manual_sends)
            .finish()
    }
}

impl MockTransport {
    /// Start building a mock transport.
    pub fn builder() -> MockTransportBuilder {
        MockTransportBuilder::default()
    }

    /// Replace the sticky state of a device (the "server" changed).
    pub fn set_state(&self, kind: DeviceKind, state: Value) {
        self.states.lock().unwrap().insert(kind, state);
    }

    /// Queue a one-shot state returned by the next fetch of `kind`.
    pub fn queue_state(&self, kind: DeviceKind, state: Value) {
        self.queued
            .lock()
            .unwrap()
            .entry(kind)
            .or_default()
            .push_back(state);
    }

    /// Toggle fetch failure injection.
    pub fn set_fail_fetches(&self, fail: bool) {
        self.fail_fetches.store(fail, Ordering::Relaxed);
    }

    /// Toggle send failure injection (ignored in manual-send mode).
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::Relaxed);
    }

    /// Total number of fetches across all devices.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::Relaxed)
    }

    /// Every POST received so far, in arrival order.
    pub fn posted(&self) -> Vec<(DeviceKind, Value)> {
        self.posted.lock().unwrap().clone()
    }

    /// POST bodies received for one device, in arrival order.
    pub fn posted_to(&self, kind: DeviceKind) -> Vec<Value> {
        self.posted
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, body)| body.clone())
            .collect()
    }

    /// Wait for the next held send (manual-send mode only).
    pub async fn next_send(&self) -> InFlightSend {
        loop {
            let notified = self.send_arrived.notified();
            if let Some(send) = self.held_sends.lock().unwrap().pop_front() {
                return send;
            }
            notified.await;
        }
    }

    fn scripted_state(&self, kind: DeviceKind) -> Option<Value> {
        if let Some(queue) = self.queued.lock().unwrap().get_mut(&kind)
            && let Some(state) = queue.pop_front()
        {
            return Some(state);
        }
        self.states.lock().unwrap().get(&kind).cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, kind: DeviceKind) -> Result<Map<String, Value>> {
        self.fetches.fetch_add(1, Ordering::Relaxed);

        if self.fail_fetches.load(Ordering::Relaxed) {
            return Err(Error::Unavailable("injected fetch failure".to_string()));
        }

        match self.scripted_state(kind) {
            Some(Value::Object(object)) => Ok(object),
            Some(_) => Err(Error::Unavailable(format!(
                "scripted state for {kind} is not an object"
            ))),
            None => Err(Error::Unavailable(format!("no scripted state for {kind}"))),
        }
    }

    async fn send(&self, kind: DeviceKind, body: Value) -> Result<Value> {
        self.posted.lock().unwrap().push((kind, body.clone()));

        if self.manual_sends {
            let (reply, response) = oneshot::channel();
            self.held_sends
                .lock()
                .unwrap()
                .push_back(InFlightSend { kind, body, reply });
            self.send_arrived.notify_waiters();
            return response
                .await
                .unwrap_or_else(|_| Err(Error::Unavailable("held send dropped".to_string())));
        }

        if self.fail_sends.load(Ordering::Relaxed) {
            return Err(Error::Unavailable("injected send failure".to_string()));
        }

        Ok(json!({"status": "success"}))
    }
}

/// Builder for [`MockTransport`].
#[derive(Default)]
#[must_use]
pub struct MockTransportBuilder {
    states: HashMap<DeviceKind, Value>,
    queued: HashMap<DeviceKind, VecDeque<Value>>,
    fail_fetches: bool,
    fail_sends: bool,
    manual_sends: bool,
}

impl MockTransportBuilder {
    /// Sticky state for a device, returned by every fetch.
    pub fn state(mut self, kind: DeviceKind, state: Value) -> Self {
        self.states.insert(kind, state);
        self
    }

    /// Queue a one-shot state consumed before the sticky state.
    pub fn queue_state(mut self, kind: DeviceKind, state: Value) -> Self {
        self.queued.entry(kind).or_default().push_back(state);
        self
    }

    /// Start with fetch failure injection enabled.
    pub fn fail_fetches(mut self, fail: bool) -> Self {
        self.fail_fetches = fail;
        self
    }

    /// Start with send failure injection enabled.
    pub fn fail_sends(mut self, fail: bool) -> Self {
        self.fail_sends = fail;
        self
    }

    /// Hold sends open until the test resolves them via
    /// [`MockTransport::next_send`].
    pub fn manual_sends(mut self) -> Self {
        self.manual_sends = true;
        self
    }

    /// Build the transport.
    pub fn build(self) -> MockTransport {
        MockTransport {
            states: Mutex::new(self.states),
            queued: Mutex::new(self.queued),
            posted: Mutex::new(Vec::new()),
            fetches: AtomicUsize::new(0),
            fail_fetches: AtomicBool::new(self.fail_fetches),
            fail_sends: AtomicBool::new(self.fail_sends),
            manual_sends: self.manual_sends,
            held_sends: Mutex::new(VecDeque::new()),
            send_arrived: Notify::new(),
        }
    }
}
