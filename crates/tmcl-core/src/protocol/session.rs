//! Link session
//!
//! Owns the open/closed lifecycle of the transport handle.

use std::sync::Arc;

use super::{PortOpener, ProtocolError, Transport};

/// At most one open transport to a board
pub struct LinkSession {
    port_name: String,
    baud_rate: u32,
    opener: Arc<dyn PortOpener>,
    port: Option<Box<dyn Transport>>,
}

impl LinkSession {
    /// Create a closed session
    pub fn new(port_name: impl Into<String>, baud_rate: u32, opener: Arc<dyn PortOpener>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            opener,
            port: None,
        }
    }

    /// Open the transport. A no-op if it is already open.
    pub fn open(&mut self) -> Result<(), ProtocolError> {
        if self.port.is_some() {
            return Ok(());
        }

        let port = self.opener.open(&self.port_name, self.baud_rate)?;
        tracing::debug!(port = %self.port_name, baud = self.baud_rate, "opened port");
        self.port = Some(port);
        Ok(())
    }

    /// Release the transport. A no-op if it is already closed.
    pub fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::debug!(port = %self.port_name, "closed port");
        }
    }

    /// Whether a transport is currently held
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    /// Write all bytes to the open transport
    pub fn write(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.port_mut()?.write_all(data)
    }

    /// Read currently available bytes; `Ok(0)` when nothing is pending
    pub fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        self.port_mut()?.read_available(buf)
    }

    /// Drop stale received bytes
    pub fn discard_input(&mut self) -> Result<(), ProtocolError> {
        self.port_mut()?.discard_input()
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn Transport>, ProtocolError> {
        self.port.as_mut().ok_or(ProtocolError::NotConnected)
    }
}

impl std::fmt::Debug for LinkSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkSession")
            .field("port_name", &self.port_name)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.is_open())
            .finish()
    }
}
