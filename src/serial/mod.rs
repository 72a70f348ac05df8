//! # Serial Communication Module
//!
//! Handles the serial link to the Arduino controller.
//!
//! This module handles:
//! - Opening the serial port (8N1, no flow control)
//! - Waiting for the board to come out of its DTR reset
//! - Splitting the byte stream into lines

pub mod port_trait;

use async_trait::async_trait;
use bytes::BytesMut;
use std::io;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
pub use port_trait::{Connector, LineTransport};

/// Longest line kept while waiting for a newline; a valid frame is < 64 bytes
pub const MAX_LINE_BYTES: usize = 256;

/// Splits a byte stream into newline-terminated lines.
///
/// Lines are decoded as lossy UTF-8 and trimmed, so `\r\n` endings and stray
/// non-UTF-8 bytes never fail a read. A run of more than [`MAX_LINE_BYTES`]
/// without a newline is dropped.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: BytesMut,
}

impl LineBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(MAX_LINE_BYTES),
        }
    }

    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<String> {
        match self.buffer.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let line = self.buffer.split_to(pos + 1);
                Some(String::from_utf8_lossy(&line).trim().to_string())
            }
            None => {
                if self.buffer.len() > MAX_LINE_BYTES {
                    debug!("Dropping {} bytes without newline", self.buffer.len());
                    self.buffer.clear();
                }
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Arduino Serial Port Handler
pub struct ArduinoSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyACM0)
    device_path: String,
    lines: LineBuffer,
}

impl std::fmt::Debug for ArduinoSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArduinoSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl ArduinoSerial {
    /// Open a serial port with 8N1 settings
    ///
    /// # Errors
    ///
    /// Returns `Connection` if the port cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use arduino_pad_bridge::serial::ArduinoSerial;
    ///
    /// let serial = ArduinoSerial::open("/dev/ttyACM0", 9600)?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Connection(format!("Failed to open {}: {}", path, e)))?;

        Ok(Self {
            port,
            device_path: path.to_string(),
            lines: LineBuffer::new(),
        })
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

#[async_trait]
impl LineTransport for ArduinoSerial {
    async fn read_line(&mut self) -> io::Result<Option<String>> {
        loop {
            if let Some(line) = self.lines.next_line() {
                return Ok(Some(line));
            }

            let mut chunk = [0u8; 64];
            let n = self.port.read(&mut chunk).await?;
            if n == 0 {
                return Ok(None);
            }
            self.lines.extend(&chunk[..n]);
        }
    }

    async fn clear_input(&mut self) -> io::Result<()> {
        self.lines.clear();
        tokio_serial::SerialPort::clear(&self.port, tokio_serial::ClearBuffer::Input)
            .map_err(io::Error::from)
    }

    fn description(&self) -> &str {
        &self.device_path
    }
}

/// Opens [`ArduinoSerial`] ports for the session
#[derive(Debug, Clone)]
pub struct SerialConnector {
    settle: Duration,
}

impl SerialConnector {
    /// `settle` is slept after every successful open
    #[must_use]
    pub fn new(settle: Duration) -> Self {
        Self { settle }
    }
}

#[async_trait]
impl Connector for SerialConnector {
    async fn connect(&mut self, port: &str, baud_rate: u32) -> Result<Box<dyn LineTransport>> {
        let serial = ArduinoSerial::open(port, baud_rate)?;
        if !self.settle.is_zero() {
            debug!("Waiting {:?} for {} to settle", self.settle, port);
            tokio::time::sleep(self.settle).await;
        }
        info!("Opened serial port {} at {} baud", serial.device_path(), baud_rate);
        Ok(Box::new(serial))
    }
}
