//! Mock transport for deterministic testing of protocol engines.
//!
//! [`MockTransport`] implements [`Transport`] with two sources of inbound
//! bytes:
//!
//! - scripted replies, released when the matching request is written, and
//! - unsolicited data, injected at any time through a [`MockHandle`].
//!
//! # Example
//!
//! ```
//! use avrlib_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When "!1PWRQSTN\r" is written, the receiver answers "!1PWR01<EOF>".
//! mock.expect(b"!1PWRQSTN\r", b"!1PWR01\x1a");
//!
//! let handle = mock.handle();
//! handle.inject(b"!1AMT01\x1a");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use avrlib_core::error::{Error, Result};
use avrlib_core::transport::Transport;

/// A pre-loaded request/reply pair.
#[derive(Debug, Clone)]
struct Expectation {
    request: Vec<u8>,
    reply: Vec<u8>,
}

#[derive(Debug)]
struct MockState {
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be handed out by `receive()`.
    inbound: VecDeque<u8>,
    connected: bool,
    /// When set, writes with no matching expectation are accepted.
    lenient: bool,
    sent_log: Vec<Vec<u8>>,
}

/// A mock [`Transport`] for testing protocol engines without hardware.
///
/// Expectations are consumed in order. In strict mode (the default) a
/// write that does not match the next expectation, or arrives after the
/// queue is exhausted, fails with [`Error::Protocol`]. In lenient mode
/// unmatched writes are only recorded.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// Shared view of a [`MockTransport`] that outlives moving the transport
/// into an IO task.
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    // A panicking test thread must not hide the log from other assertions.
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    /// Create a strict mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            state: Arc::new(Mutex::new(MockState {
                expectations: VecDeque::new(),
                inbound: VecDeque::new(),
                connected: true,
                lenient: false,
                sent_log: Vec::new(),
            })),
        }
    }

    /// Create a mock that accepts any write, replying only where an
    /// expectation matches.
    pub fn lenient() -> Self {
        let mock = Self::new();
        lock(&mock.state).lenient = true;
        mock
    }

    /// Add an expected request and the reply it releases.
    ///
    /// An empty `reply` models a command the receiver does not answer.
    pub fn expect(&mut self, request: &[u8], reply: &[u8]) {
        lock(&self.state).expectations.push_back(Expectation {
            request: request.to_vec(),
            reply: reply.to_vec(),
        });
    }

    /// Get a handle for injecting data and inspecting writes.
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// Queue unsolicited bytes as if the receiver had sent them.
    pub fn inject(&self, data: &[u8]) {
        lock(&self.state).inbound.extend(data.iter().copied());
    }

    /// Every write made through the transport, one entry per `send()`.
    pub fn sent_data(&self) -> Vec<Vec<u8>> {
        lock(&self.state).sent_log.clone()
    }

    /// Number of expectations not yet consumed.
    pub fn remaining_expectations(&self) -> usize {
        lock(&self.state).expectations.len()
    }

    /// Simulate the link going up or down.
    pub fn set_connected(&self, connected: bool) {
        lock(&self.state).connected = connected;
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(Error::NotConnected);
        }
        state.sent_log.push(data.to_vec());

        let matches_next = state
            .expectations
            .front()
            .is_some_and(|e| e.request.as_slice() == data);

        if matches_next {
            if let Some(expectation) = state.expectations.pop_front() {
                state.inbound.extend(expectation.reply);
            }
            return Ok(());
        }
        if state.lenient {
            return Ok(());
        }
        match state.expectations.front() {
            Some(expectation) => Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            ))),
            None => Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            )),
        }
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(Error::NotConnected);
        }
        if state.inbound.is_empty() {
            return Err(Error::Timeout);
        }
        let n = state.inbound.len().min(buf.len());
        for (slot, byte) in buf.iter_mut().zip(state.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        state.connected = false;
        state.inbound.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }
}
