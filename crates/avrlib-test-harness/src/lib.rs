//! avrlib-test-harness: Test utilities and mock transports for avrlib.
//!
//! [`MockTransport`] lets protocol engines be tested deterministically
//! without a receiver attached. Because the transport is moved into the IO
//! task, tests keep a [`MockHandle`] to inject receiver notifications and
//! inspect what was written.

pub mod mock_serial;

pub use mock_serial::{MockHandle, MockTransport};
