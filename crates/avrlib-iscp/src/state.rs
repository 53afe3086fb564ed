//! Cached receiver state.
//!
//! The receiver reports state asynchronously: replies to queries and
//! front-panel changes arrive as the same kind of frame, at any time. The
//! accessors therefore answer from this cache and let the response router
//! bring it up to date.
//!
//! A single `DeviceState` is owned by the IO task and published through a
//! `tokio::sync::watch` channel. Two paths mutate it, both on the IO task:
//!
//! - **Optimistic updates** ([`StateUpdate`]) from setters, applied just
//!   before the corresponding command is written.
//! - **Routed frames** from the receiver, which always win.

use std::collections::HashMap;

use avrlib_core::{Input, InputCatalog, Result, SwitchState};

use crate::commands::CommandCode;
use crate::volume::clamp_percent;

/// Complete cached state of the receiver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeviceState {
    /// Main power.
    pub power: SwitchState,
    /// Audio mute.
    pub muted: SwitchState,
    /// Master volume in percent, `[0, 100]`.
    pub volume_pct: f64,
    /// Brightness as last set. Local only; ISCP has no command for it.
    pub brightness: u8,
    /// Code of the selected input, if one has been reported or set.
    pub input_code: Option<String>,
    /// Known inputs.
    pub inputs: InputCatalog,
    /// Queries sent with no reply routed yet.
    pending: HashMap<CommandCode, bool>,
}

/// An optimistic change applied by a setter.
#[derive(Debug, Clone, PartialEq)]
pub enum StateUpdate {
    Power(bool),
    Mute(bool),
    /// Percent; clamped when applied.
    Volume(f64),
    /// Stored as given.
    Brightness(u8),
    /// Input code, which must already be in the catalog.
    Input(String),
}

impl DeviceState {
    /// Empty state with a preloaded input catalog.
    pub fn with_inputs(inputs: InputCatalog) -> Self {
        DeviceState {
            inputs,
            ..Default::default()
        }
    }

    /// The selected input, if it is in the catalog.
    pub fn input(&self) -> Option<&Input> {
        self.input_code
            .as_deref()
            .and_then(|code| self.inputs.get(code))
    }

    /// Apply an optimistic update. Returns whether anything changed.
    pub fn apply(&mut self, update: &StateUpdate) -> bool {
        match update {
            StateUpdate::Power(on) => replace(&mut self.power, SwitchState::from(*on)),
            StateUpdate::Mute(muted) => replace(&mut self.muted, SwitchState::from(*muted)),
            StateUpdate::Volume(percent) => self.set_volume(*percent),
            StateUpdate::Brightness(value) => replace(&mut self.brightness, *value),
            StateUpdate::Input(code) => self.select_input(code).is_some_and(|(_, changed)| changed),
        }
    }

    /// Set the volume, clamped. Returns whether it changed.
    pub fn set_volume(&mut self, percent: f64) -> bool {
        let percent = clamp_percent(percent);
        if self.volume_pct == percent {
            return false;
        }
        self.volume_pct = percent;
        true
    }

    /// Select a catalog input by code.
    ///
    /// Returns the input and whether the selection changed, or `None` (and
    /// leaves the selection alone) if the code is not in the catalog.
    pub fn select_input(&mut self, code: &str) -> Option<(Input, bool)> {
        let input = self.inputs.get(code)?.clone();
        let changed = self.input_code.as_deref() != Some(input.code.as_str());
        if changed {
            self.input_code = Some(input.code.clone());
        }
        Some((input, changed))
    }

    /// Add an input the receiver reported but the catalog lacks.
    pub fn learn_input(&mut self, code: &str) -> Result<Input> {
        let name = format!("Input {}", code.to_ascii_uppercase());
        self.inputs.insert(code, &name).cloned()
    }

    /// Record that a query for `code` was sent.
    pub fn mark_pending(&mut self, code: CommandCode) {
        self.pending.insert(code, true);
    }

    /// Record that a reply for `code` was routed.
    pub fn clear_pending(&mut self, code: CommandCode) {
        self.pending.insert(code, false);
    }

    /// Whether a query for `code` is awaiting its reply.
    pub fn is_pending(&self, code: CommandCode) -> bool {
        self.pending.get(&code).copied().unwrap_or(false)
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
