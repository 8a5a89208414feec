//! Application state for the terminal dashboard.
//!
//! `App` owns the five live panels and the UI bookkeeping around them:
//! which field has focus, an in-progress inline edit, and a short queue
//! of expiring status messages. Every frame reads fresh panel snapshots;
//! nothing is cached here.

use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::debug;

use enerdash_core::{EditIntent, FieldKind, FieldSpec, Panel};
use enerdash_types::DeviceState;

/// How long a status message stays on screen.
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Step size for one range-slider key press, in the pair's unit.
const RANGE_STEP: f64 = 5.0;

/// Range sliders cover 0..=100 (percent), like the original dashboard.
const RANGE_LO: f64 = 0.0;
const RANGE_HI: f64 = 100.0;

/// Current input mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Navigating fields.
    Normal,
    /// Typing a new value for a scalar field.
    Editing { field: String, buffer: String },
}

/// A transient message in the footer.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub error: bool,
    expires_at: Instant,
}

/// Dashboard state.
pub struct App {
    panels: Vec<Panel>,
    pub focus_panel: usize,
    pub focus_field: usize,
    pub mode: Mode,
    pub status: Vec<StatusMessage>,
    pub api_version: Option<String>,
    version_rx: Option<oneshot::Receiver<String>>,
    pub should_quit: bool,
}

impl App {
    /// Create the app over already-spawned panels.
    pub fn new(panels: Vec<Panel>, version_rx: Option<oneshot::Receiver<String>>) -> Self {
        Self {
            panels,
            focus_panel: 0,
            focus_field: 0,
            mode: Mode::Normal,
            status: Vec::new(),
            api_version: None,
            version_rx,
            should_quit: false,
        }
    }

    /// All panels, in display order.
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// The panel currently holding focus.
    pub fn focused_panel(&self) -> &Panel {
        &self.panels[self.focus_panel]
    }

    /// Fields of a panel that are visible for its current state.
    pub fn visible_specs(&self, panel_idx: usize) -> Vec<&'static FieldSpec> {
        let panel = &self.panels[panel_idx];
        let snapshot = panel.snapshot();
        panel.schema().visible_fields(&snapshot).collect()
    }

    /// The field under the cursor, if any.
    pub fn selected_spec(&self) -> Option<&'static FieldSpec> {
        let specs = self.visible_specs(self.focus_panel);
        specs.get(self.focus_field.min(specs.len().saturating_sub(1))).copied()
    }

    /// Move panel focus by `delta`, wrapping.
    pub fn move_panel(&mut self, delta: isize) {
        let len = self.panels.len() as isize;
        self.focus_panel = ((self.focus_panel as isize + delta).rem_euclid(len)) as usize;
        self.focus_field = 0;
    }

    /// Move field focus by `delta` within the focused panel, wrapping.
    ///
    /// The visible field count can shrink between frames (a governing
    /// enum changed), so the index is clamped first.
    pub fn move_field(&mut self, delta: isize) {
        let len = self.visible_specs(self.focus_panel).len() as isize;
        if len == 0 {
            self.focus_field = 0;
            return;
        }
        let current = (self.focus_field as isize).min(len - 1);
        self.focus_field = ((current + delta).rem_euclid(len)) as usize;
    }

    /// Act on the selected field: start editing a scalar, toggle a flag,
    /// cycle an enum. Range pairs are driven by the slider keys instead.
    pub fn activate(&mut self) {
        let Some(spec) = self.selected_spec() else {
            return;
        };
        if !spec.editable {
            self.push_status(format!("{} is read-only", spec.path), false);
            return;
        }

        let panel = self.focused_panel();
        let snapshot = panel.snapshot();
        match spec.kind {
            FieldKind::Scalar => {
                let buffer = snapshot
                    .number(spec.path)
                    .map(|n| n.to_string())
                    .unwrap_or_default();
                self.mode = Mode::Editing {
                    field: spec.path.to_string(),
                    buffer,
                };
            }
            FieldKind::Flag => {
                let enabled = !snapshot.flag(spec.path).unwrap_or(false);
                self.submit(EditIntent::flag(spec.path, enabled));
            }
            FieldKind::Enum(values) => {
                let next = next_mode(values, snapshot.mode(spec.path));
                self.submit(EditIntent::mode(spec.path, next));
            }
            FieldKind::Range { .. } => {
                self.push_status("use h/l and H/L to move the range bounds".to_string(), false);
            }
        }
    }

    /// Append a character to the edit buffer.
    pub fn input_char(&mut self, c: char) {
        if let Mode::Editing { buffer, .. } = &mut self.mode {
            buffer.push(c);
        }
    }

    /// Delete the last character of the edit buffer.
    pub fn backspace(&mut self) {
        if let Mode::Editing { buffer, .. } = &mut self.mode {
            buffer.pop();
        }
    }

    /// Submit the edit buffer as a scalar edit.
    pub fn commit_edit(&mut self) {
        if let Mode::Editing { field, buffer } = std::mem::replace(&mut self.mode, Mode::Normal) {
            self.submit(EditIntent::scalar(field, buffer));
        }
    }

    /// Abandon the edit buffer.
    pub fn cancel_edit(&mut self) {
        self.mode = Mode::Normal;
    }

    /// Nudge the selected range pair. One gesture moves one bound by
    /// [`RANGE_STEP`] and submits both bounds as a single atomic edit,
    /// clamped so the pair can never invert.
    pub fn adjust_range(&mut self, min_delta: f64, max_delta: f64) {
        let Some(spec) = self.selected_spec() else {
            return;
        };
        let FieldKind::Range { min, max } = spec.kind else {
            return;
        };

        let snapshot = self.focused_panel().snapshot();
        let cur_min = snapshot.number(min).unwrap_or(RANGE_LO);
        let cur_max = snapshot.number(max).unwrap_or(RANGE_HI);
        let new_max = (cur_max + max_delta).clamp(cur_min, RANGE_HI);
        let new_min = (cur_min + min_delta).clamp(RANGE_LO, new_max);

        self.submit(EditIntent::range(spec.path, new_min, new_max));
    }

    /// One slider step. Positive `delta` raises the bound.
    pub fn range_step(&mut self, min_bound: bool, up: bool) {
        let delta = if up { RANGE_STEP } else { -RANGE_STEP };
        if min_bound {
            self.adjust_range(delta, 0.0);
        } else {
            self.adjust_range(0.0, delta);
        }
    }

    fn submit(&mut self, intent: EditIntent) {
        debug!(?intent, "submitting edit");
        if let Err(e) = self.focused_panel().dispatcher().submit_background(intent) {
            self.push_status(e.to_string(), true);
        }
    }

    /// Add a footer message.
    pub fn push_status(&mut self, text: String, error: bool) {
        self.status.push(StatusMessage {
            text,
            error,
            expires_at: Instant::now() + STATUS_TTL,
        });
    }

    /// Drop expired footer messages.
    pub fn clean_expired_messages(&mut self) {
        let now = Instant::now();
        self.status.retain(|m| m.expires_at > now);
    }

    /// Pick up the backend version once the startup probe answers.
    pub fn poll_version(&mut self) {
        if let Some(rx) = &mut self.version_rx {
            match rx.try_recv() {
                Ok(version) => {
                    self.api_version = Some(version);
                    self.version_rx = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.version_rx = None;
                }
            }
        }
    }

    /// Snapshot of a panel's state for rendering.
    pub fn snapshot(&self, panel_idx: usize) -> DeviceState {
        self.panels[panel_idx].snapshot()
    }

    /// Tear all panels down.
    pub fn shutdown(&self) {
        for panel in &self.panels {
            panel.shutdown();
        }
    }
}

/// The enum value after `current` in selection order.
fn next_mode(values: &'static [&'static str], current: Option<&str>) -> &'static str {
    let idx = current
        .and_then(|c| values.iter().position(|v| *v == c))
        .map(|i| (i + 1) % values.len())
        .unwrap_or(0);
    values[idx]
}
