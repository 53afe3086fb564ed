//! ISCP protocol backend for avrlib.
//!
//! This crate implements ISCP (Integra Serial Control Protocol), the ASCII
//! protocol spoken by Onkyo/Integra receivers on their RS-232 port. It
//! provides:
//!
//! - **Protocol codec** ([`protocol`]) -- the `!1...\r` command envelope and
//!   EOF-delimited inbound frames, as a `tokio_util` codec.
//! - **Command builders** ([`commands`]) -- power, mute, volume and input
//!   commands and queries, plus argument parsers.
//! - **Volume scaling** ([`volume`]) -- percent to raw `MVL` level and back.
//! - **State and routing** ([`state`], [`router`]) -- cached receiver state
//!   and the frame router that keeps it current.
//! - **IO task** ([`io`]) -- single task owning the transport and state.
//! - **Receiver driver** ([`receiver`]) -- the [`Receiver`](avrlib_core::Receiver)
//!   implementation.
//! - **Builder** ([`builder`]) -- fluent builder for [`IscpReceiver`].
//!
//! # Fire and forget
//!
//! ISCP has no request/response correlation: the receiver answers a query
//! with the same frame it sends when the front panel changes. Commands are
//! therefore never awaited. Getters return the cached value and trigger a
//! query; every frame that arrives, for whatever reason, updates the cache.
//!
//! # Example
//!
//! ```
//! use avrlib_iscp::protocol::{encode, Frame, ParsedFrame};
//! use avrlib_iscp::commands::cmd_set_volume;
//! use avrlib_iscp::volume::VolumeScaler;
//!
//! // 50 % of the default 0..70 range is raw level 35 (0x23).
//! let raw = VolumeScaler::default().percent_to_raw(50.0);
//! assert_eq!(encode(cmd_set_volume(raw).as_str()), b"!1MVL23\r");
//!
//! // The receiver reports the new level back.
//! let frame = Frame::new(&b"!1MVL23"[..]);
//! if let ParsedFrame::Response { code, argument, .. } = frame.parse() {
//!     assert_eq!(code, "MVL");
//!     assert_eq!(argument, "23");
//! }
//! ```

pub mod builder;
pub mod commands;
pub mod inputs;
pub mod io;
pub mod protocol;
pub mod receiver;
pub mod router;
pub mod state;
pub mod volume;

pub use builder::IscpBuilder;
pub use receiver::IscpReceiver;
