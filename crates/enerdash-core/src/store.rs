//! Last-known device state with optimistic-edit reconciliation.
//!
//! The store is the meeting point of two writers: the poll loop merging
//! server snapshots in, and the edit dispatcher applying user edits
//! optimistically before the backend confirms them. Reconciliation rules:
//!
//! - a field with an outstanding pending edit is never overwritten by a
//!   poll, so a slow response cannot undo a just-made edit;
//! - a newer edit to the same field supersedes the outstanding one, and
//!   the superseded request's eventual resolution is discarded by
//!   sequence-number comparison (last write wins per field);
//! - paired range bounds are written under one lock acquisition, so no
//!   reader ever observes `min > max` mid-update;
//! - after [`DeviceStore::close`], every mutator is a no-op, which is how
//!   in-flight responses against a torn-down panel are neutralized.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use time::OffsetDateTime;
use tracing::trace;

use enerdash_types::{DeviceState, FieldValue};

use crate::schema::DeviceSchema;

/// How an edit write ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOutcome {
    /// The backend acknowledged the write.
    Confirmed,
    /// The write failed; the optimistic value stays and the field is
    /// marked unsynced until a later poll or edit refreshes it.
    Failed,
}

struct Inner {
    state: DeviceState,
    /// Field path -> sequence number of its latest outstanding edit.
    pending: HashMap<String, u64>,
    /// Fields whose last write failed and has not been refreshed since.
    unsynced: HashSet<String>,
    next_seq: u64,
    closed: bool,
}

/// State store for one panel instance.
pub struct DeviceStore {
    schema: &'static DeviceSchema,
    inner: Mutex<Inner>,
}

impl DeviceStore {
    /// Create an empty store for a panel using the given schema.
    pub fn new(schema: &'static DeviceSchema) -> Self {
        Self {
            schema,
            inner: Mutex::new(Inner {
                state: DeviceState::new(),
                pending: HashMap::new(),
                unsynced: HashSet::new(),
                next_seq: 1,
                closed: false,
            }),
        }
    }

    /// The schema this store was built for.
    pub fn schema(&self) -> &'static DeviceSchema {
        self.schema
    }

    /// Current merged view of the device.
    pub fn snapshot(&self) -> DeviceState {
        self.lock().state.clone()
    }

    /// Merge a poll response.
    ///
    /// Every field without an outstanding pending edit is overwritten
    /// (and its unsynced marker cleared); pending fields keep their
    /// optimistic value for this round. Stamps `last_poll_at`.
    pub fn apply_poll(&self, fields: Vec<(String, FieldValue)>) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        for (path, value) in fields {
            if inner.pending.contains_key(&path) {
                trace!(field = %path, "skipping polled value for pending edit");
                continue;
            }
            let value = if self.schema.is_flag(&path) {
                value.coerce_flag()
            } else {
                value
            };
            inner.unsynced.remove(&path);
            inner.state.set(path, value);
        }
        inner.state.last_poll_at = Some(OffsetDateTime::now_utc());
    }

    /// Apply one or more field writes optimistically, as a single atomic
    /// mutation, and register them as pending under a fresh sequence
    /// number.
    ///
    /// Returns `None` once the store is closed.
    pub fn begin_edit(&self, edits: &[(String, FieldValue)]) -> Option<u64> {
        let mut inner = self.lock();
        if inner.closed {
            return None;
        }
        let seq = inner.next_seq;
        inner.next_seq += 1;
        for (path, value) in edits {
            inner.state.set(path.clone(), value.clone());
            inner.pending.insert(path.clone(), seq);
            inner.unsynced.remove(path);
        }
        Some(seq)
    }

    /// Resolve the edit with the given sequence number.
    ///
    /// Clears each field's pending marker only if the sequence still
    /// matches; a stale resolution for a superseded edit changes nothing
    /// for that field. On [`EditOutcome::Failed`] the optimistic value
    /// stays in place and the field is marked unsynced.
    pub fn resolve_edit(&self, fields: &[String], seq: u64, outcome: EditOutcome) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        for path in fields {
            if inner.pending.get(path) != Some(&seq) {
                trace!(field = %path, seq, "discarding stale edit resolution");
                continue;
            }
            inner.pending.remove(path);
            if outcome == EditOutcome::Failed {
                inner.unsynced.insert(path.clone());
            }
        }
    }

    /// Whether a field has an outstanding pending edit.
    pub fn is_pending(&self, path: &str) -> bool {
        self.lock().pending.contains_key(path)
    }

    /// Whether a field's last write failed without a refresh since.
    pub fn is_unsynced(&self, path: &str) -> bool {
        self.lock().unsynced.contains(path)
    }

    /// Freeze the store. Idempotent; all later mutations are no-ops.
    pub fn close(&self) {
        self.lock().closed = true;
    }

    /// Whether the owning panel has been shut down.
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // Lock poisoning only happens if a writer panicked; the state map
        // itself is always internally consistent, so recover the guard.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for DeviceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("DeviceStore")
            .field("fields", &inner.state.len())
            .field("pending", &inner.pending.len())
            .field("closed", &inner.closed)
            .finish()
    }
}
