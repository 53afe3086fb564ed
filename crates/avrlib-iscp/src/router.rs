//! Routing of receiver frames into state changes and events.
//!
//! Every frame the receiver sends, whether it answers one of our queries
//! or reports a front-panel change, goes through [`ResponseRouter::route`].
//! Recognized codes update the [`DeviceState`]; each actual change yields a
//! [`ReceiverEvent`] for subscribers. Anything malformed or unknown is
//! logged and otherwise ignored.

use tracing::{debug, info, warn};

use avrlib_core::{ReceiverEvent, SwitchState};

use crate::commands::{CommandCode, parse_switch, parse_volume};
use crate::protocol::{Frame, ParsedFrame};
use crate::state::DeviceState;
use crate::volume::VolumeScaler;

/// Interprets frames read by the IO task.
#[derive(Debug, Clone)]
pub struct ResponseRouter {
    scaler: VolumeScaler,
    learn_inputs: bool,
}

impl ResponseRouter {
    /// Create a router.
    ///
    /// With `learn_inputs`, `SLI` reports for codes missing from the catalog
    /// add a generated entry instead of being dropped.
    pub fn new(scaler: VolumeScaler, learn_inputs: bool) -> Self {
        ResponseRouter {
            scaler,
            learn_inputs,
        }
    }

    /// Route one frame.
    ///
    /// Returns the event to broadcast, or `None` when the state is unchanged.
    pub fn route(&self, frame: &Frame, state: &mut DeviceState) -> Option<ReceiverEvent> {
        let (code, argument, payload) = match frame.parse() {
            ParsedFrame::Response {
                code,
                argument,
                payload,
            } => (code, argument, payload),
            ParsedFrame::Unparseable { reason } => {
                debug!(frame = %frame, reason, "dropping unparseable frame");
                return None;
            }
        };

        let Ok(code) = code.parse::<CommandCode>() else {
            debug!(code, payload, "ignoring unhandled command code");
            return None;
        };

        match code {
            CommandCode::Power => {
                state.clear_pending(code);
                let on = self.switch_argument(code, &argument)?;
                let changed = set_switch(&mut state.power, on);
                changed.then(|| ReceiverEvent::PowerChanged {
                    state: state.power,
                })
            }
            CommandCode::Mute => {
                state.clear_pending(code);
                let muted = self.switch_argument(code, &argument)?;
                let changed = set_switch(&mut state.muted, muted);
                changed.then(|| ReceiverEvent::MuteChanged {
                    state: state.muted,
                })
            }
            CommandCode::MasterVolume => {
                state.clear_pending(code);
                let Some(raw) = parse_volume(&argument) else {
                    debug!(code = %code, argument, "unrecognized volume argument");
                    return None;
                };
                let percent = self.scaler.raw_to_percent(raw);
                state.set_volume(percent).then(|| ReceiverEvent::VolumeChanged {
                    percent: state.volume_pct,
                })
            }
            CommandCode::InputSelector => {
                state.clear_pending(code);
                self.route_input(&argument, state)
            }
            CommandCode::Identify => {
                info!(payload, "receiver identification");
                Some(ReceiverEvent::Identified { payload })
            }
        }
    }

    fn switch_argument(&self, code: CommandCode, argument: &str) -> Option<bool> {
        let value = parse_switch(argument);
        if value.is_none() {
            debug!(code = %code, argument, "unrecognized switch argument");
        }
        value
    }

    fn route_input(&self, argument: &str, state: &mut DeviceState) -> Option<ReceiverEvent> {
        if !state.inputs.contains(argument) {
            if !self.learn_inputs {
                debug!(argument, "input not in catalog, ignoring");
                return None;
            }
            match state.learn_input(argument) {
                Ok(input) => info!(code = %input.code, name = %input.name, "learned input"),
                Err(e) => {
                    warn!(argument, error = %e, "cannot learn input");
                    return None;
                }
            }
        }

        let (input, changed) = state.select_input(argument)?;
        changed.then_some(ReceiverEvent::InputChanged { input })
    }
}

fn set_switch(slot: &mut SwitchState, on: bool) -> bool {
    let value = SwitchState::from(on);
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::default_catalog;

    fn router() -> ResponseRouter {
        ResponseRouter::new(VolumeScaler::default(), false)
    }

    fn state() -> DeviceState {
        DeviceState::with_inputs(default_catalog().unwrap())
    }

    fn frame(raw: &[u8]) -> Frame {
        Frame::new(raw.to_vec())
    }

    // ---------------------------------------------------------------
    // Power / mute
    // ---------------------------------------------------------------

    #[test]
    fn power_on_and_off() {
        let router = router();
        let mut state = state();

        let event = router.route(&frame(b"!1PWR01"), &mut state);
        assert_eq!(
            event,
            Some(ReceiverEvent::PowerChanged {
                state: SwitchState::On
            })
        );
        assert_eq!(state.power, SwitchState::On);

        let event = router.route(&frame(b"!1PWR00"), &mut state);
        assert_eq!(
            event,
            Some(ReceiverEvent::PowerChanged {
                state: SwitchState::Off
            })
        );
        assert_eq!(state.power, SwitchState::Off);
    }

    #[test]
    fn power_na_leaves_state_unchanged() {
        let router = router();
        let mut state = state();
        router.route(&frame(b"!1PWR01"), &mut state);

        assert_eq!(router.route(&frame(b"!1PWRN/A"), &mut state), None);
        assert_eq!(state.power, SwitchState::On);
    }

    #[test]
    fn repeated_report_emits_no_event() {
        let router = router();
        let mut state = state();
        assert!(router.route(&frame(b"!1AMT01"), &mut state).is_some());
        assert_eq!(router.route(&frame(b"!1AMT01"), &mut state), None);
        assert_eq!(state.muted, SwitchState::On);
    }

    #[test]
    fn mute_report() {
        let router = router();
        let mut state = state();
        let event = router.route(&frame(b"!1AMT00"), &mut state);
        assert_eq!(
            event,
            Some(ReceiverEvent::MuteChanged {
                state: SwitchState::Off
            })
        );
    }

    // ---------------------------------------------------------------
    // Volume
    // ---------------------------------------------------------------

    #[test]
    fn volume_is_scaled() {
        let router = router();
        let mut state = state();
        let event = router.route(&frame(b"!1MVL2D"), &mut state);
        match event {
            Some(ReceiverEvent::VolumeChanged { percent }) => {
                assert!((percent - 64.2857).abs() < 1e-3, "got {percent}");
            }
            other => panic!("expected VolumeChanged, got {other:?}"),
        }
        assert!((state.volume_pct - 64.2857).abs() < 1e-3);
    }

    #[test]
    fn volume_above_range_is_clamped() {
        let router = router();
        let mut state = state();
        router.route(&frame(b"!1MVL64"), &mut state);
        assert_eq!(state.volume_pct, 100.0);
    }

    #[test]
    fn volume_uses_configured_range() {
        let router = ResponseRouter::new(VolumeScaler::new(0, 100).unwrap(), false);
        let mut state = state();
        router.route(&frame(b"!1MVL32"), &mut state);
        assert_eq!(state.volume_pct, 50.0);
    }

    #[test]
    fn volume_na_ignored() {
        let router = router();
        let mut state = state();
        assert_eq!(router.route(&frame(b"!1MVLN/A"), &mut state), None);
        assert_eq!(state.volume_pct, 0.0);
    }

    // ---------------------------------------------------------------
    // Input selector
    // ---------------------------------------------------------------

    #[test]
    fn known_input_selected() {
        let router = router();
        let mut state = state();
        let event = router.route(&frame(b"!1SLI23"), &mut state);
        match event {
            Some(ReceiverEvent::InputChanged { input }) => {
                assert_eq!(input.code, "23");
                assert_eq!(input.name, "CD");
            }
            other => panic!("expected InputChanged, got {other:?}"),
        }
        assert_eq!(state.input().unwrap().name, "CD");
    }

    #[test]
    fn unknown_input_ignored_without_learning() {
        let router = router();
        let mut state = state();
        router.route(&frame(b"!1SLI23"), &mut state);

        assert_eq!(router.route(&frame(b"!1SLI7F"), &mut state), None);
        assert_eq!(state.input_code.as_deref(), Some("23"));
        assert!(!state.inputs.contains("7F"));
    }

    #[test]
    fn unknown_input_learned() {
        let router = ResponseRouter::new(VolumeScaler::default(), true);
        let mut state = DeviceState::default();

        let event = router.route(&frame(b"!1SLI2B"), &mut state);
        match event {
            Some(ReceiverEvent::InputChanged { input }) => {
                assert_eq!(input.code, "2B");
                assert_eq!(input.name, "Input 2B");
            }
            other => panic!("expected InputChanged, got {other:?}"),
        }
        assert_eq!(state.inputs.len(), 1);
    }

    #[test]
    fn malformed_input_code_not_learned() {
        let router = ResponseRouter::new(VolumeScaler::default(), true);
        let mut state = DeviceState::default();
        assert_eq!(router.route(&frame(b"!1SLIN/A"), &mut state), None);
        assert!(state.inputs.is_empty());
    }

    // ---------------------------------------------------------------
    // Identification and junk
    // ---------------------------------------------------------------

    #[test]
    fn identification_emits_event_without_state_change() {
        let router = router();
        let mut state = state();
        let before = state.clone();
        let event = router.route(&frame(b"!1AMX1234ABCD\r\n"), &mut state);
        assert_eq!(
            event,
            Some(ReceiverEvent::Identified {
                payload: "1234ABCD".into()
            })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_code_ignored() {
        let router = router();
        let mut state = state();
        let before = state.clone();
        assert_eq!(router.route(&frame(b"!1XYZ01"), &mut state), None);
        assert_eq!(state, before);
    }

    #[test]
    fn short_frame_ignored() {
        let router = router();
        let mut state = state();
        let before = state.clone();
        assert_eq!(router.route(&frame(b"!1PW"), &mut state), None);
        assert_eq!(router.route(&frame(b""), &mut state), None);
        assert_eq!(state, before);
    }

    #[test]
    fn reply_clears_pending_flag() {
        let router = router();
        let mut state = state();
        state.mark_pending(CommandCode::MasterVolume);
        state.mark_pending(CommandCode::Power);

        router.route(&frame(b"!1MVL10"), &mut state);
        assert!(!state.is_pending(CommandCode::MasterVolume));
        assert!(state.is_pending(CommandCode::Power));

        // Even an N/A reply answers the query.
        router.route(&frame(b"!1PWRN/A"), &mut state);
        assert!(!state.is_pending(CommandCode::Power));
    }
}
