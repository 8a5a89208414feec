//! Synchronization core for the enerdash home energy dashboard.
//!
//! One pattern, instantiated once per monitored device: periodic state
//! refresh interleaved with optimistic, partially-applied edits.
//!
//! - **[`DeviceStore`]** holds the last-known server state plus the set of
//!   fields with outstanding optimistic edits, and reconciles poll
//!   responses without clobbering them.
//! - **[`spawn_poll_loop`]** GETs a device endpoint on the device type's
//!   cadence and merges each response into the store.
//! - **[`EditDispatcher`]** validates an [`EditIntent`] against the
//!   panel's [`DeviceSchema`], applies it optimistically, and POSTs only
//!   the changed field(s).
//! - **[`Panel`]** wires the three together for one device.
//!
//! Renderers are strictly consumers: they snapshot stores and feed edit
//! intents back, nothing more.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use enerdash_core::{EditIntent, HttpClient, Panel, Transport};
//! use enerdash_types::DeviceKind;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new("http://localhost:5000")?;
//!     let transport: Arc<dyn Transport> = Arc::new(client);
//!
//!     let meter = Panel::spawn(DeviceKind::PowerMeter, transport);
//!
//!     // The operator raises the current limit; the store shows 15 A
//!     // immediately, the backend confirms asynchronously.
//!     meter
//!         .dispatcher()
//!         .submit(EditIntent::scalar("current_limit", "15"))
//!         .await?;
//!
//!     println!("{:?}", meter.snapshot().number("current_limit"));
//!     meter.shutdown();
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod mock;
pub mod panel;
pub mod poll;
pub mod schema;
pub mod store;

pub use client::{ApiInfo, HttpClient, Transport};
pub use dispatch::{EditDispatcher, EditIntent};
pub use error::{Error, Result, ValidationError};
pub use mock::{InFlightSend, MockTransport, MockTransportBuilder};
pub use panel::Panel;
pub use poll::{PollHandle, spawn_poll_loop};
pub use schema::{DeviceSchema, FieldKind, FieldSpec, schema_for};
pub use store::{DeviceStore, EditOutcome};

// Re-export the types crate for downstream convenience.
pub use enerdash_types as types;
