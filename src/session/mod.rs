//! # Controller Session
//!
//! Owns the serial link and the virtual gamepad and runs the
//! read → parse → map → diff → emit cycle.
//!
//! ## States
//!
//! ```text
//! Disconnected ──connect()──▶ Connecting ──ok──▶ Connected
//!      ▲                          │                  │
//!      └─────────── failure ──────┴──── I/O error ───┘
//!
//! any state ──shutdown()──▶ Stopped
//! ```
//!
//! Nothing that goes wrong while the loop runs is returned to the caller.
//! Connection failures are retried on a fixed interval, malformed frames are
//! dropped, device write failures are logged and retried on the next frame,
//! and I/O errors drop the link and pause briefly. Only
//! [`SessionHandle::stop`] ends [`ControllerSession::run_loop`].
//!
//! ## Update batching
//!
//! Writes to the virtual gamepad are staged and committed with a single
//! flush per frame. A flush also happens when no write was needed but the
//! keep-alive interval has passed since the previous one.

use chrono::Utc;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{Config, SerialConfig};
use crate::controller::{FrameError, NormalizedState, RawFrame, SentState, SignalMapper, StateDiffer};
use crate::device::VirtualGamepad;
use crate::error::{BridgeError, Result};
use crate::serial::{Connector, LineTransport};
use crate::status::{Connectivity, Snapshot, SnapshotPublisher, StatusHandle};

/// Connection lifecycle of a [`ControllerSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    /// Terminal
    Stopped,
}

/// What happened to one serial line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// Blank line or read timeout
    Skipped,
    /// Malformed frame, dropped
    Rejected(FrameError),
    /// Valid frame: snapshot published, device updated as needed
    Applied { wrote: bool, flushed: bool },
}

/// Cooperative stop flag for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    running: Arc<AtomicBool>,
}

impl SessionHandle {
    /// Asks the loop to stop; observed within one read timeout or sleep.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Bridges one serial controller to one virtual gamepad.
pub struct ControllerSession<C, G> {
    serial: SerialConfig,
    keep_alive: Duration,
    error_pause: Duration,
    device_name: String,

    connector: C,
    transport: Option<Box<dyn LineTransport>>,
    gamepad: G,

    mapper: SignalMapper,
    differ: StateDiffer,
    sent: SentState,

    publisher: Arc<SnapshotPublisher>,
    connectivity: Connectivity,
    running: Arc<AtomicBool>,
    state: SessionState,

    last_flush: Instant,
    /// Writes staged on the device but not yet flushed
    unflushed: bool,
}

impl<C, G> std::fmt::Debug for ControllerSession<C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerSession")
            .field("port", &self.serial.port)
            .field("state", &self.state)
            .field("sent", &self.sent)
            .finish_non_exhaustive()
    }
}

impl<C: Connector, G: VirtualGamepad> ControllerSession<C, G> {
    /// Creates a disconnected session. Nothing is opened until
    /// [`connect`](Self::connect) or [`run_loop`](Self::run_loop).
    pub fn new(config: &Config, connector: C, gamepad: G) -> Self {
        Self {
            serial: config.serial.clone(),
            keep_alive: config.session.keep_alive(),
            error_pause: config.session.error_pause(),
            device_name: config.session.device_name.clone(),
            connector,
            transport: None,
            gamepad,
            mapper: SignalMapper::from_config(&config.mapping),
            differ: StateDiffer::from_config(&config.session),
            sent: SentState::new(),
            publisher: Arc::new(SnapshotPublisher::new()),
            connectivity: Connectivity::new(),
            running: Arc::new(AtomicBool::new(true)),
            state: SessionState::Disconnected,
            last_flush: Instant::now(),
            unflushed: false,
        }
    }

    /// Stop flag for use from another task.
    #[must_use]
    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            running: Arc::clone(&self.running),
        }
    }

    /// Snapshot and connectivity reader for the web layer.
    #[must_use]
    pub fn status(&self) -> StatusHandle {
        StatusHandle::new(
            Arc::clone(&self.publisher),
            self.connectivity.clone(),
            &self.device_name,
        )
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last state committed to the virtual gamepad.
    #[must_use]
    pub fn sent_state(&self) -> &NormalizedState {
        self.sent.state()
    }

    /// Opens the serial link, discards stale input and resets the gamepad.
    ///
    /// Returns whether the session is now connected; failures are logged.
    pub async fn connect(&mut self) -> bool {
        if self.state == SessionState::Stopped {
            return false;
        }

        self.state = SessionState::Connecting;
        self.transport = None;

        match self.open_transport().await {
            Ok(transport) => {
                info!("Connected to Arduino on {}", transport.description());
                self.transport = Some(transport);
                self.reset_device();
                self.last_flush = Instant::now();
                self.state = SessionState::Connected;
                self.connectivity.set(true);
                true
            }
            Err(e) => {
                warn!("Connection error: {}", e);
                self.state = SessionState::Disconnected;
                self.connectivity.set(false);
                false
            }
        }
    }

    async fn open_transport(&mut self) -> Result<Box<dyn LineTransport>> {
        let mut transport = self
            .connector
            .connect(&self.serial.port, self.serial.baud_rate)
            .await?;
        transport.clear_input().await.map_err(|e| {
            BridgeError::Connection(format!("Failed to clear input on {}: {}", transport.description(), e))
        })?;
        Ok(transport)
    }

    /// Runs until [`SessionHandle::stop`], then tears down via
    /// [`shutdown`](Self::shutdown).
    pub async fn run_loop(&mut self) {
        info!("Controller session running on {}", self.serial.port);

        while self.running.load(Ordering::SeqCst) {
            if self.transport.is_none() {
                self.connectivity.set(false);

                if !self.connect().await {
                    tokio::time::sleep(self.serial.reconnect_delay()).await;
                    continue;
                }
            }

            if let Err(e) = self.poll_line().await {
                self.lose_connection(&e);
                tokio::time::sleep(self.error_pause).await;
            }
        }

        self.shutdown();
    }

    /// Reads and handles at most one line.
    async fn poll_line(&mut self) -> Result<()> {
        let Some(transport) = self.transport.as_mut() else {
            return Ok(());
        };

        let line = match tokio::time::timeout(self.serial.read_timeout(), transport.read_line()).await {
            Err(_) => return Ok(()),
            Ok(read) => read?,
        };

        let Some(line) = line else {
            return Err(BridgeError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial stream closed",
            )));
        };

        match self.handle_line(&line, Instant::now()) {
            LineOutcome::Rejected(e @ FrameError::Parse { .. }) => warn!("Data parsing error: {}", e),
            LineOutcome::Rejected(e) => debug!("Dropping frame: {}", e),
            LineOutcome::Skipped | LineOutcome::Applied { .. } => {}
        }
        Ok(())
    }

    /// Processes one serial line as if it was read at `now`.
    ///
    /// Every valid frame is published as a snapshot. Device writes are
    /// limited to groups that changed, followed by at most one flush.
    pub fn handle_line(&mut self, line: &str, now: Instant) -> LineOutcome {
        if line.trim().is_empty() {
            return LineOutcome::Skipped;
        }

        let frame = match RawFrame::parse(line) {
            Ok(frame) => frame,
            Err(e) => return LineOutcome::Rejected(e),
        };

        let state = self.mapper.map_frame(&frame);
        self.publisher
            .publish(Snapshot::from_state(&state, &self.device_name, Utc::now()));

        let wrote = self.apply_changes(&state);
        let flushed = self.flush_if_due(wrote, now);
        LineOutcome::Applied { wrote, flushed }
    }

    /// Stages writes for whatever differs from the sent state; returns
    /// whether anything was written.
    fn apply_changes(&mut self, state: &NormalizedState) -> bool {
        let changes = self.differ.diff(state, &self.sent);
        let mut wrote = false;

        if changes.sticks {
            let result = self
                .gamepad
                .set_left_stick(state.lx, state.ly)
                .and_then(|()| self.gamepad.set_right_stick(state.rx, state.ry));
            match result {
                Ok(()) => {
                    self.sent.commit_sticks(state);
                    wrote = true;
                }
                Err(e) => warn!("Stick update failed: {}", e),
            }
        }

        if changes.triggers {
            let result = self
                .gamepad
                .set_left_trigger(state.lt)
                .and_then(|()| self.gamepad.set_right_trigger(state.rt));
            match result {
                Ok(()) => {
                    self.sent.commit_triggers(state);
                    wrote = true;
                }
                Err(e) => warn!("Trigger update failed: {}", e),
            }
        }

        for (button, pressed) in changes.buttons {
            let result = if pressed {
                self.gamepad.press_button(button)
            } else {
                self.gamepad.release_button(button)
            };
            match result {
                Ok(()) => {
                    self.sent.commit_button(button, pressed);
                    wrote = true;
                }
                Err(e) => warn!("Button {} update failed: {}", button.name(), e),
            }
        }

        wrote
    }

    fn flush_if_due(&mut self, wrote: bool, now: Instant) -> bool {
        self.unflushed |= wrote;
        let keep_alive_due = now.saturating_duration_since(self.last_flush) > self.keep_alive;
        if !self.unflushed && !keep_alive_due {
            return false;
        }

        match self.gamepad.flush() {
            Ok(()) => {
                if !self.unflushed {
                    debug!("Keep-alive flush");
                }
                self.last_flush = now;
                self.unflushed = false;
                true
            }
            Err(e) => {
                warn!("Device flush failed: {}", e);
                false
            }
        }
    }

    fn reset_device(&mut self) {
        match self.gamepad.reset() {
            Ok(()) => {
                self.sent.reset();
                self.unflushed = false;
            }
            Err(e) => warn!("Failed to reset virtual gamepad: {}", e),
        }
    }

    /// Drops the link after a failed read; the loop reconnects next.
    fn lose_connection(&mut self, error: &BridgeError) {
        warn!("Loop error: {}", error);
        if self.state == SessionState::Connected {
            warn!("Serial disconnected. Reconnecting...");
        }
        self.drop_connection();
    }

    fn drop_connection(&mut self) {
        if let Some(transport) = self.transport.take() {
            debug!("Closing {}", transport.description());
        }
        if self.state != SessionState::Stopped {
            self.state = SessionState::Disconnected;
        }
        self.connectivity.set(false);
    }

    /// Stops the loop, closes the link and resets the gamepad to neutral.
    ///
    /// Safe to call more than once; later calls do nothing.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if self.state == SessionState::Stopped {
            return;
        }

        self.drop_connection();
        self.reset_device();
        self.state = SessionState::Stopped;
        info!("Cleanup done.");
    }
}
