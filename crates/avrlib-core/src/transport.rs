//! Transport trait for receiver communication.
//!
//! The [`Transport`] trait abstracts over the physical link to a receiver.
//! `avrlib-transport` provides a serial implementation; the test harness
//! provides a scripted mock. Protocol engines (the ISCP IO task) only ever
//! see this trait, which keeps them testable without hardware.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a receiver.
///
/// Framing is not the transport's concern: `receive` hands back whatever
/// bytes arrived, and the protocol engine reassembles frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write raw bytes to the receiver, returning once they are flushed.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Read available bytes into `buf`, waiting at most `timeout`.
    ///
    /// Returns the number of bytes read, or
    /// [`Error::Timeout`](crate::error::Error::Timeout) if nothing arrived
    /// before the deadline.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the connection. Later calls return
    /// [`Error::NotConnected`](crate::error::Error::NotConnected).
    async fn close(&mut self) -> Result<()>;

    /// Whether the transport is currently open.
    fn is_connected(&self) -> bool;
}
