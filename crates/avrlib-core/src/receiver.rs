//! The `Receiver` trait -- characteristic-level interface to an A/V receiver.
//!
//! This is the surface a home-automation bridge binds its characteristics
//! to. Each "get" returns the best-known cached value immediately and may
//! trigger a refresh query; each "set" records the intended value locally
//! and sends the command without waiting for the receiver to confirm it.
//!
//! None of these methods return errors. A receiver that is disconnected or
//! never answers simply leaves the cache as it was, and the failure is
//! logged by the implementation.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::events::ReceiverEvent;
use crate::types::*;

/// Asynchronous interface for controlling a receiver.
///
/// Confirmations and spontaneous changes arrive later as
/// [`ReceiverEvent`]s; use [`subscribe()`](Receiver::subscribe) to follow
/// them instead of polling.
#[async_trait]
pub trait Receiver: Send + Sync {
    /// Static identification of the receiver.
    fn info(&self) -> &ReceiverInfo;

    /// Query the power state and return the cached value.
    async fn get_power(&self) -> SwitchState;

    /// Turn the receiver on or off.
    async fn set_power(&self, on: bool);

    /// Query the mute state and return the cached value.
    async fn get_mute(&self) -> SwitchState;

    /// Mute or unmute.
    async fn set_mute(&self, muted: bool);

    /// Query the master volume and return the cached percentage (0-100).
    async fn get_volume(&self) -> f64;

    /// Set the master volume; out-of-range values are clamped to 0-100.
    async fn set_volume(&self, percent: f64);

    /// Step the master volume one notch up or down.
    async fn step_volume(&self, up: bool);

    /// Return the locally stored brightness.
    async fn get_brightness(&self) -> u8;

    /// Store a brightness value. Nothing is sent to the receiver.
    async fn set_brightness(&self, value: u8);

    /// Query the selected input and return the cached one, if known.
    async fn get_input(&self) -> Option<Input>;

    /// Select an input by code. Codes missing from the catalog are ignored.
    async fn set_input(&self, code: &str);

    /// Snapshot of the input catalog.
    fn inputs(&self) -> InputCatalog;

    /// Subscribe to state change events.
    fn subscribe(&self) -> broadcast::Receiver<ReceiverEvent>;
}
