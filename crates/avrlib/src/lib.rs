//! # avrlib -- Async Control for A/V Receivers
//!
//! `avrlib` drives home-theater receivers over their serial control port
//! and exposes them through a small characteristic-style interface
//! (power, mute, volume, input, brightness) suited to home-automation
//! bridges.
//!
//! ## Quick Start
//!
//! ```no_run
//! use avrlib::Receiver;
//! use avrlib::iscp::IscpBuilder;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let receiver = IscpBuilder::new()
//!         .serial_port("/dev/ttyUSB0")
//!         .build()
//!         .await?;
//!
//!     receiver.set_power(true).await;
//!     receiver.set_volume(30.0).await;
//!     println!("volume: {:.0}%", receiver.get_volume().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! | Crate               | Purpose                                          |
//! |---------------------|--------------------------------------------------|
//! | `avrlib-core`       | [`Receiver`] and [`Transport`] traits, types, errors |
//! | `avrlib-transport`  | Serial transport                                 |
//! | `avrlib-iscp`       | Onkyo/Integra ISCP protocol driver               |
//! | **`avrlib`**        | This facade crate -- re-exports everything       |
//!
//! ## Cached, fire-and-forget access
//!
//! Receivers answer queries asynchronously and also report front-panel
//! changes on their own. Accessors therefore never block on the device:
//! getters return the cached value (and ask for a fresh one), setters
//! update the cache and send the command. Follow the receiver's actual
//! state through [`subscribe`](Receiver::subscribe):
//!
//! ```no_run
//! use avrlib::{Receiver, ReceiverEvent};
//! # async fn example(receiver: &dyn Receiver) {
//! let mut events = receiver.subscribe();
//! while let Ok(event) = events.recv().await {
//!     match event {
//!         ReceiverEvent::VolumeChanged { percent } => println!("volume {percent:.0}%"),
//!         ReceiverEvent::Disconnected => break,
//!         other => println!("{other:?}"),
//!     }
//! }
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Enables                         | Default |
//! |---------|---------------------------------|---------|
//! | `iscp`  | [`iscp`] module (ISCP protocol) | yes     |

pub use avrlib_core::*;

/// Serial transport ([`SerialTransport`](serial::SerialTransport)).
pub mod serial {
    pub use avrlib_transport::*;
}

/// ISCP protocol backend.
///
/// Provides [`IscpReceiver`](iscp::IscpReceiver) and
/// [`IscpBuilder`](iscp::IscpBuilder) for Onkyo and Integra receivers
/// controlled over RS-232.
#[cfg(feature = "iscp")]
pub mod iscp {
    pub use avrlib_iscp::*;
}
