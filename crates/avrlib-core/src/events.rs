//! Asynchronous receiver event types.
//!
//! Events are emitted through a [`tokio::sync::broadcast`] channel whenever a
//! routed response changes the cached device state. The platform layer
//! subscribes to push updated characteristic values without polling.

use crate::types::{Input, SwitchState};

/// An event emitted by a receiver driver.
///
/// Query replies and spontaneous notifications look identical on the wire,
/// so both produce the same events. Delivery is best effort: slow consumers
/// may lag and miss events.
#[derive(Debug, Clone, PartialEq)]
pub enum ReceiverEvent {
    /// The receiver reported a new power state.
    PowerChanged {
        /// New power state.
        state: SwitchState,
    },

    /// The receiver reported a new mute state.
    MuteChanged {
        /// New mute state.
        state: SwitchState,
    },

    /// The receiver reported a new master volume level.
    VolumeChanged {
        /// Volume as a percentage of the configured raw range.
        percent: f64,
    },

    /// The receiver reported a new input selection.
    InputChanged {
        /// The selected input.
        input: Input,
    },

    /// The receiver sent an identify/handshake frame.
    Identified {
        /// Frame payload after the command code.
        payload: String,
    },

    /// The transport closed underneath the IO task.
    Disconnected,
}
