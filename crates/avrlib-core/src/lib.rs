//! avrlib-core: Core traits, types, and error definitions for avrlib.
//!
//! This crate defines the protocol-agnostic abstractions that receiver
//! backends implement. Home-automation bridges depend on these types without
//! pulling in a specific wire protocol or serial stack.
//!
//! # Key types
//!
//! - [`Receiver`] -- the characteristic-level interface to an A/V receiver
//! - [`Transport`] -- byte-level communication channel
//! - [`ReceiverEvent`] -- asynchronous state change notifications
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod events;
pub mod receiver;
pub mod transport;
pub mod types;

// Re-export key types at crate root for ergonomic `use avrlib_core::*`.
pub use error::{Error, Result};
pub use events::ReceiverEvent;
pub use receiver::Receiver;
pub use transport::Transport;
pub use types::*;
