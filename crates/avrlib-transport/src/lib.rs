//! Transport implementations for avrlib.
//!
//! Provides [`SerialTransport`], the RS-232 / USB-serial implementation of
//! the [`Transport`](avrlib_core::Transport) trait used to talk to A/V
//! receivers.
//!
//! # Example
//!
//! ```no_run
//! use avrlib_transport::SerialTransport;
//! use avrlib_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> avrlib_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // Ask the receiver for its power state.
//! transport.send(b"!1PWRQSTN\r").await?;
//!
//! let mut buf = [0u8; 64];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};
