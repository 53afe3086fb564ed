//! IscpReceiver -- the [`Receiver`] trait implementation for ISCP receivers.
//!
//! Every accessor answers from the cached [`DeviceState`] without waiting
//! for the receiver. Getters send a status query and return the value cached
//! *before* the reply arrives; the reply is routed by the IO task and shows
//! up as a [`ReceiverEvent`] (and in the next read). Setters update the
//! cache optimistically and send the command; if the receiver reports a
//! different value afterwards, that report wins.
//!
//! Nothing here returns an error to the caller. Write failures and a dead
//! link are logged and leave the cache as it was.

use async_trait::async_trait;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use avrlib_core::error::Result;
use avrlib_core::events::ReceiverEvent;
use avrlib_core::receiver::Receiver;
use avrlib_core::transport::Transport;
use avrlib_core::types::*;

use crate::commands::{self, Command};
use crate::io::{IoConfig, ReceiverIo, spawn_io_task};
use crate::router::ResponseRouter;
use crate::state::{DeviceState, StateUpdate};
use crate::volume::{VolumeScaler, clamp_percent};

/// A connected ISCP receiver.
///
/// Constructed via [`IscpBuilder`](crate::builder::IscpBuilder). All
/// communication goes through the IO task spawned at build time.
pub struct IscpReceiver {
    io: ReceiverIo,
    event_tx: broadcast::Sender<ReceiverEvent>,
    scaler: VolumeScaler,
    info: ReceiverInfo,
}

impl IscpReceiver {
    /// Spawn the IO task and wrap it.
    ///
    /// This is called by [`IscpBuilder`](crate::builder::IscpBuilder);
    /// callers should use the builder API instead.
    pub(crate) fn new(
        transport: Box<dyn Transport>,
        config: IoConfig,
        initial_state: DeviceState,
        scaler: VolumeScaler,
        learn_inputs: bool,
        info: ReceiverInfo,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let router = ResponseRouter::new(scaler, learn_inputs);
        let io = spawn_io_task(
            transport,
            config,
            initial_state,
            event_tx.clone(),
            router,
        );
        IscpReceiver {
            io,
            event_tx,
            scaler,
            info,
        }
    }

    /// Copy of the cached state.
    pub fn state(&self) -> DeviceState {
        self.io.snapshot()
    }

    /// Watch channel that changes whenever a routed frame changes the state.
    pub fn watch_state(&self) -> watch::Receiver<DeviceState> {
        self.io.state.clone()
    }

    /// The volume mapping in use.
    pub fn scaler(&self) -> VolumeScaler {
        self.scaler
    }

    /// Look up a catalog input by code.
    pub fn input(&self, code: &str) -> Option<Input> {
        self.io.state.borrow().inputs.get(code).cloned()
    }

    /// Query power, mute, volume and input.
    ///
    /// Replies arrive asynchronously; subscribe to follow them.
    pub async fn refresh(&self) {
        for command in commands::refresh_commands() {
            self.send(command, None).await;
        }
    }

    /// Send arbitrary command text (without `!1` and terminator).
    ///
    /// Any reply is routed like every other frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`](avrlib_core::Error::InvalidParameter)
    /// for text that is not printable ASCII, or the write error.
    pub async fn send_raw(&self, text: &str) -> Result<()> {
        let command = Command::new(text)?;
        self.io.send(command, None).await
    }

    /// Stop the IO task and recover the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        self.io.shutdown().await
    }

    async fn send(&self, command: Command, update: Option<StateUpdate>) {
        let text = command.to_string();
        if let Err(e) = self.io.send(command, update).await {
            warn!(command = %text, error = %e, "command not sent");
        }
    }
}

#[async_trait]
impl Receiver for IscpReceiver {
    fn info(&self) -> &ReceiverInfo {
        &self.info
    }

    async fn get_power(&self) -> SwitchState {
        self.send(commands::cmd_query_power(), None).await;
        self.io.state.borrow().power
    }

    async fn set_power(&self, on: bool) {
        self.send(commands::cmd_set_power(on), Some(StateUpdate::Power(on)))
            .await;
    }

    async fn get_mute(&self) -> SwitchState {
        self.send(commands::cmd_query_mute(), None).await;
        self.io.state.borrow().muted
    }

    async fn set_mute(&self, muted: bool) {
        self.send(commands::cmd_set_mute(muted), Some(StateUpdate::Mute(muted)))
            .await;
    }

    async fn get_volume(&self) -> f64 {
        self.send(commands::cmd_query_volume(), None).await;
        self.io.state.borrow().volume_pct
    }

    async fn set_volume(&self, percent: f64) {
        let percent = clamp_percent(percent);
        let raw = self.scaler.percent_to_raw(percent);
        debug!(percent, raw, "setting volume");
        self.send(
            commands::cmd_set_volume(raw),
            Some(StateUpdate::Volume(percent)),
        )
        .await;
    }

    async fn step_volume(&self, up: bool) {
        let command = if up {
            commands::cmd_volume_up()
        } else {
            commands::cmd_volume_down()
        };
        self.send(command, None).await;
    }

    async fn get_brightness(&self) -> u8 {
        self.io.state.borrow().brightness
    }

    async fn set_brightness(&self, value: u8) {
        if let Err(e) = self.io.update(StateUpdate::Brightness(value)).await {
            warn!(value, error = %e, "brightness not stored");
        }
    }

    async fn get_input(&self) -> Option<Input> {
        self.send(commands::cmd_query_input(), None).await;
        self.io.state.borrow().input().cloned()
    }

    async fn set_input(&self, code: &str) {
        let Some(input) = self.input(code) else {
            warn!(code, "input not in catalog, ignoring");
            return;
        };
        let command = match commands::cmd_select_input(&input.code) {
            Ok(command) => command,
            Err(e) => {
                warn!(code, error = %e, "invalid input code");
                return;
            }
        };
        self.send(command, Some(StateUpdate::Input(input.code)))
            .await;
    }

    fn inputs(&self) -> InputCatalog {
        self.io.state.borrow().inputs.clone()
    }

    fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent> {
        self.event_tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::builder::IscpBuilder;
    use avrlib_test_harness::{MockHandle, MockTransport};

    async fn receiver(mock: MockTransport) -> IscpReceiver {
        IscpBuilder::new()
            .query_on_connect(false)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap()
    }

    async fn lenient_receiver() -> (IscpReceiver, MockHandle) {
        let mock = MockTransport::lenient();
        let handle = mock.handle();
        (receiver(mock).await, handle)
    }

    async fn next_event(rx: &mut broadcast::Receiver<ReceiverEvent>) -> ReceiverEvent {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    // ---------------------------------------------------------------
    // Power / mute
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn set_power_sends_pl_and_updates_cache() {
        let mut mock = MockTransport::new();
        mock.expect(b"!1PL1\r", b"");
        let handle = mock.handle();
        let rx = receiver(mock).await;

        rx.set_power(true).await;
        assert_eq!(rx.state().power, SwitchState::On);
        assert_eq!(handle.remaining_expectations(), 0);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn receiver_report_overrides_optimistic_power() {
        let (rx, handle) = lenient_receiver().await;
        let mut events = rx.subscribe();

        rx.set_power(true).await;
        handle.inject(b"!1PWR00\x1a");
        assert_eq!(
            next_event(&mut events).await,
            ReceiverEvent::PowerChanged {
                state: SwitchState::Off
            }
        );
        assert_eq!(rx.state().power, SwitchState::Off);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn get_power_queries_and_reply_updates_cache() {
        let mut mock = MockTransport::new();
        mock.expect(b"!1PWRQSTN\r", b"!1PWR01\x1a");
        let rx = receiver(mock).await;
        let mut events = rx.subscribe();

        // The first read may or may not include the reply.
        let _ = rx.get_power().await;
        assert_eq!(
            next_event(&mut events).await,
            ReceiverEvent::PowerChanged {
                state: SwitchState::On
            }
        );
        assert_eq!(rx.state().power, SwitchState::On);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn power_unknown_before_first_report() {
        let (rx, handle) = lenient_receiver().await;
        assert_eq!(rx.get_power().await, SwitchState::Unknown);
        assert_eq!(handle.sent_data(), vec![b"!1PWRQSTN\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_mute_commands() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_mute(true).await;
        rx.set_mute(false).await;
        assert_eq!(
            handle.sent_data(),
            vec![b"!1AMT01\r".to_vec(), b"!1AMT00\r".to_vec()]
        );
        assert_eq!(rx.get_mute().await, SwitchState::Off);
        let _ = rx.shutdown().await;
    }

    // ---------------------------------------------------------------
    // Volume
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn set_volume_above_range_clamped() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_volume(150.0).await;
        assert_eq!(rx.state().volume_pct, 100.0);
        assert_eq!(handle.sent_data(), vec![b"!1MVL46\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_volume_below_range_clamped() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_volume(-10.0).await;
        assert_eq!(rx.state().volume_pct, 0.0);
        assert_eq!(handle.sent_data(), vec![b"!1MVL0\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_volume_low_level_single_hex_digit() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_volume(7.5).await;
        assert_eq!(rx.state().volume_pct, 7.5);
        assert_eq!(handle.sent_data(), vec![b"!1MVL5\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_volume_uses_configured_range() {
        let mock = MockTransport::lenient();
        let handle = mock.handle();
        let rx = IscpBuilder::new()
            .query_on_connect(false)
            .volume_range(0, 100)
            .build_with_transport(Box::new(mock))
            .await
            .unwrap();

        rx.set_volume(45.0).await;
        assert_eq!(handle.sent_data(), vec![b"!1MVL2D\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn volume_report_scaled() {
        let (rx, handle) = lenient_receiver().await;
        let mut events = rx.subscribe();
        handle.inject(b"!1MVL23\x1a");
        assert_eq!(
            next_event(&mut events).await,
            ReceiverEvent::VolumeChanged { percent: 50.0 }
        );
        assert_eq!(rx.get_volume().await, 50.0);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn step_volume_commands() {
        let (rx, handle) = lenient_receiver().await;
        rx.step_volume(true).await;
        rx.step_volume(false).await;
        assert_eq!(
            handle.sent_data(),
            vec![b"!1MVLUP\r".to_vec(), b"!1MVLDOWN\r".to_vec()]
        );
        let _ = rx.shutdown().await;
    }

    // ---------------------------------------------------------------
    // Brightness
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn set_brightness_is_local_only() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_brightness(50).await;
        assert_eq!(rx.get_brightness().await, 50);
        assert!(handle.sent_data().is_empty());
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_brightness_keeps_value_unchanged() {
        let (rx, _handle) = lenient_receiver().await;
        rx.set_brightness(255).await;
        assert_eq!(rx.get_brightness().await, 255);
        let _ = rx.shutdown().await;
    }

    // ---------------------------------------------------------------
    // Inputs
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn set_input_known_code() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_input("23").await;
        assert_eq!(handle.sent_data(), vec![b"!1SLI23\r".to_vec()]);
        assert_eq!(rx.state().input().unwrap().name, "CD");
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn set_input_unknown_code_ignored() {
        let (rx, handle) = lenient_receiver().await;
        rx.set_input("7F").await;
        rx.set_input("bogus").await;
        assert!(handle.sent_data().is_empty());
        assert!(rx.state().input().is_none());
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn get_input_after_report() {
        let (rx, handle) = lenient_receiver().await;
        let mut events = rx.subscribe();
        handle.inject(b"!1SLI24\x1a");
        next_event(&mut events).await;

        let input = rx.get_input().await.unwrap();
        assert_eq!(input.name, "FM");
        assert_eq!(handle.sent_data(), vec![b"!1SLIQSTN\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn inputs_and_lookup() {
        let (rx, _handle) = lenient_receiver().await;
        assert_eq!(rx.inputs().len(), 11);
        assert_eq!(rx.input("10").unwrap().name, "BD/DVD");
        assert!(rx.input("7F").is_none());
        let _ = rx.shutdown().await;
    }

    // ---------------------------------------------------------------
    // Refresh, raw, lifecycle
    // ---------------------------------------------------------------

    #[tokio::test]
    async fn refresh_sends_all_queries() {
        let (rx, handle) = lenient_receiver().await;
        rx.refresh().await;
        assert_eq!(
            handle.sent_data(),
            vec![
                b"!1PWRQSTN\r".to_vec(),
                b"!1AMTQSTN\r".to_vec(),
                b"!1MVLQSTN\r".to_vec(),
                b"!1SLIQSTN\r".to_vec(),
            ]
        );
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn send_raw_validates() {
        let (rx, handle) = lenient_receiver().await;
        rx.send_raw("TUNQSTN").await.unwrap();
        assert!(rx.send_raw("PWR\r01").await.is_err());
        assert_eq!(handle.sent_data(), vec![b"!1TUNQSTN\r".to_vec()]);
        let _ = rx.shutdown().await;
    }

    #[tokio::test]
    async fn accessors_survive_disconnect() {
        let (rx, handle) = lenient_receiver().await;
        let mut events = rx.subscribe();
        rx.set_volume(50.0).await;

        handle.set_connected(false);
        assert_eq!(next_event(&mut events).await, ReceiverEvent::Disconnected);

        // Cached values are still served; writes are logged and dropped.
        assert_eq!(rx.get_volume().await, 50.0);
        rx.set_power(true).await;
        assert_eq!(rx.state().power, SwitchState::Unknown);
    }

    #[tokio::test]
    async fn info_from_builder() {
        let rx = IscpBuilder::new()
            .display_name("Living Room")
            .query_on_connect(false)
            .build_with_transport(Box::new(MockTransport::lenient()))
            .await
            .unwrap();
        assert_eq!(rx.info().display_name, "Living Room");
        let _ = rx.shutdown().await;
    }
}
