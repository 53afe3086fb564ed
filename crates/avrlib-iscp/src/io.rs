//! IO task for the ISCP backend.
//!
//! One tokio task owns the transport and the [`DeviceState`]. It writes
//! commands, reads and routes every frame the receiver sends, and shuts
//! down gracefully on request. Commands are fire-and-forget: a request is
//! acknowledged once its bytes are written, and the receiver's answer shows
//! up later as a routed frame.
//!
//! The state is published through a `watch` channel, so readers always see
//! a consistent snapshot while all writes stay on this task.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use avrlib_core::error::{Error, Result};
use avrlib_core::events::ReceiverEvent;
use avrlib_core::transport::Transport;

use crate::commands::Command;
use crate::protocol::{self, FrameDecoder};
use crate::router::ResponseRouter;
use crate::state::{DeviceState, StateUpdate};

/// Pause after an empty idle read before polling again.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Configuration for the ISCP IO task.
#[derive(Debug, Clone)]
pub struct IoConfig {
    /// Read timeout for each idle poll of the transport.
    pub poll_interval: Duration,
    /// How long a caller waits for the IO task to acknowledge a request.
    pub request_timeout: Duration,
    /// Buffer limit before undelimited input is discarded.
    pub max_frame_len: usize,
    /// Commands written once when the task starts (e.g. state queries).
    pub startup_commands: Vec<Command>,
}

impl Default for IoConfig {
    fn default() -> Self {
        IoConfig {
            poll_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(2),
            max_frame_len: protocol::MAX_FRAME_LEN,
            startup_commands: Vec::new(),
        }
    }
}

/// A request sent from the receiver handle to the IO task.
pub enum Request {
    /// Write a command, applying an optimistic update first.
    Send {
        command: Command,
        update: Option<StateUpdate>,
        reply: oneshot::Sender<Result<()>>,
    },
    /// Change local state without writing anything.
    Update {
        update: StateUpdate,
        reply: oneshot::Sender<()>,
    },
    /// Graceful shutdown; returns the transport for recovery.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

/// Handle to the IO task. Stored inside the receiver struct.
pub struct ReceiverIo {
    /// Request channel into the IO task.
    pub tx: mpsc::Sender<Request>,
    /// Latest published state.
    pub state: watch::Receiver<DeviceState>,
    /// Cancellation token for abrupt shutdown.
    pub cancel: CancellationToken,
    /// Join handle for the IO task.
    pub task: JoinHandle<()>,
    request_timeout: Duration,
}

impl ReceiverIo {
    /// Write a command and wait until it is on the wire.
    ///
    /// `update` is applied to the state immediately before the write.
    pub async fn send(&self, command: Command, update: Option<StateUpdate>) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Send {
                command,
                update,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Apply a local-only state change.
    pub async fn update(&self, update: StateUpdate) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Request::Update {
                update,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        match tokio::time::timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(Error::NotConnected),
            Err(_) => Err(Error::Timeout),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> DeviceState {
        self.state.borrow().clone()
    }

    /// Shut down the IO task and recover the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self.tx.send(Request::Shutdown { reply: reply_tx }).await;
        let transport = reply_rx.await.map_err(|_| Error::NotConnected)?;
        let _ = self.task.await;
        Ok(transport)
    }
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Spawn the IO task. Returns the handle for sending commands.
///
/// The task takes ownership of `transport` and `initial_state`; events
/// produced by `router` are broadcast on `event_tx`.
pub fn spawn_io_task(
    transport: Box<dyn Transport>,
    config: IoConfig,
    initial_state: DeviceState,
    event_tx: broadcast::Sender<ReceiverEvent>,
    router: ResponseRouter,
) -> ReceiverIo {
    let (tx, rx) = mpsc::channel::<Request>(32);
    let (state_tx, state_rx) = watch::channel(initial_state);
    let cancel = CancellationToken::new();
    let request_timeout = config.request_timeout;

    let task = tokio::spawn(io_loop(
        transport,
        config,
        state_tx,
        event_tx,
        router,
        rx,
        cancel.clone(),
    ));

    ReceiverIo {
        tx,
        state: state_rx,
        cancel,
        task,
        request_timeout,
    }
}

// ---------------------------------------------------------------------------
// IO loop
// ---------------------------------------------------------------------------

async fn io_loop(
    mut transport: Box<dyn Transport>,
    config: IoConfig,
    state_tx: watch::Sender<DeviceState>,
    event_tx: broadcast::Sender<ReceiverEvent>,
    router: ResponseRouter,
    mut rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    let mut decoder = FrameDecoder::with_max_frame_len(config.max_frame_len);

    for command in &config.startup_commands {
        if let Err(e) = dispatch(&mut *transport, command, &state_tx).await {
            warn!(command = %command, error = %e, "startup command failed");
        }
    }

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("ISCP IO task cancelled");
                break;
            }

            req = rx.recv() => {
                match req {
                    Some(Request::Send { command, update, reply }) => {
                        let result = handle_send(&mut *transport, &command, update, &state_tx).await;
                        let _ = reply.send(result);
                    }
                    Some(Request::Update { update, reply }) => {
                        state_tx.send_if_modified(|state| state.apply(&update));
                        let _ = reply.send(());
                    }
                    Some(Request::Shutdown { reply }) => {
                        debug!("IO task shutdown requested");
                        let _ = reply.send(transport);
                        return;
                    }
                    None => {
                        debug!("request channel closed, exiting IO task");
                        break;
                    }
                }
            }

            // Idle: read whatever the receiver sends.
            read = read_idle(&mut *transport, &mut decoder, config.poll_interval) => {
                match read {
                    Ok(0) => {}
                    Ok(_) => route_frames(&mut decoder, &router, &state_tx, &event_tx),
                    Err(Error::ConnectionLost | Error::NotConnected) => {
                        warn!("receiver link lost, stopping IO task");
                        let _ = event_tx.send(ReceiverEvent::Disconnected);
                        break;
                    }
                    Err(e) => {
                        debug!(error = %e, "idle read failed");
                        tokio::time::sleep(IDLE_BACKOFF).await;
                    }
                }
            }
        }
    }
}

/// Apply the optimistic update, then write the command.
async fn handle_send(
    transport: &mut dyn Transport,
    command: &Command,
    update: Option<StateUpdate>,
    state_tx: &watch::Sender<DeviceState>,
) -> Result<()> {
    if let Some(update) = &update {
        state_tx.send_if_modified(|state| state.apply(update));
    }
    let result = dispatch(transport, command, state_tx).await;
    if let Err(e) = &result {
        warn!(command = %command, error = %e, "command write failed");
    }
    result
}

/// Write one command. Queries mark their code as awaiting a reply.
async fn dispatch(
    transport: &mut dyn Transport,
    command: &Command,
    state_tx: &watch::Sender<DeviceState>,
) -> Result<()> {
    debug!(command = %command, "sending command");
    transport.send(&protocol::encode(command.as_str())).await?;

    if let Some(code) = command.query_code() {
        // Bookkeeping only; not worth waking readers for.
        state_tx.send_if_modified(|state| {
            state.mark_pending(code);
            false
        });
    }
    Ok(())
}

/// Read once into the decoder. Returns the byte count, 0 on timeout.
async fn read_idle(
    transport: &mut dyn Transport,
    decoder: &mut FrameDecoder,
    timeout: Duration,
) -> Result<usize> {
    let mut buf = [0u8; 256];
    match transport.receive(&mut buf, timeout).await {
        Ok(n) => {
            decoder.extend(&buf[..n]);
            Ok(n)
        }
        Err(Error::Timeout) => {
            // Yield briefly so the loop can check for requests.
            tokio::time::sleep(IDLE_BACKOFF).await;
            Ok(0)
        }
        Err(e) => Err(e),
    }
}

fn route_frames(
    decoder: &mut FrameDecoder,
    router: &ResponseRouter,
    state_tx: &watch::Sender<DeviceState>,
    event_tx: &broadcast::Sender<ReceiverEvent>,
) {
    for frame in decoder.frames() {
        debug!(frame = %frame, "received frame");
        let mut event = None;
        state_tx.send_if_modified(|state| {
            event = router.route(&frame, state);
            event.is_some()
        });
        if let Some(event) = event {
            let _ = event_tx.send(event);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
