//! Connection management
//!
//! Handles the session lifecycle and serialized command execution with the board.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use super::{
    Frame, LinkSession, PortOpener, ProtocolError, Reply, SerialOpener, DEFAULT_BAUD_RATE,
    DEFAULT_POLL_INTERVAL_MS, DEFAULT_TIMEOUT_MS, FRAME_LEN,
};

/// Connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Serial port name (e.g. "/dev/ttyACM0" or "COM3")
    pub port_name: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Module address written to byte 0 of every request
    pub module_address: u8,
    /// Reply timeout in milliseconds, measured from the start of the receive loop
    pub timeout_ms: u64,
    /// Sleep between empty polls in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            module_address: 0,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl ConnectionConfig {
    /// Default configuration for the given port
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    /// Override the baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Override the reply timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Reply timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Sleep between empty polls, never shorter than 1 ms
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    /// Load a configuration from a JSON file
    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Save the configuration as pretty-printed JSON
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(path, content)
    }
}

/// Board connection executing one TMCL exchange at a time
///
/// The transport lives inside the connection behind a mutex; concurrent
/// callers of [`Connection::execute`] block until the in-flight exchange has
/// consumed its reply. Share it across threads with `Arc`.
pub struct Connection {
    config: ConnectionConfig,
    session: Mutex<LinkSession>,
}

impl Connection {
    /// Create a connection over a real serial port (not yet opened)
    pub fn new(config: ConnectionConfig) -> Self {
        Self::with_opener(config, Arc::new(SerialOpener))
    }

    /// Create a connection whose transports come from `opener`
    pub fn with_opener(config: ConnectionConfig, opener: Arc<dyn PortOpener>) -> Self {
        let session = LinkSession::new(config.port_name.clone(), config.baud_rate, opener);
        Self {
            config,
            session: Mutex::new(session),
        }
    }

    /// Get the connection configuration
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Open the port now instead of on the first exchange
    pub fn open(&self) -> Result<(), ProtocolError> {
        self.lock_session().open()
    }

    /// Close the port. Safe to call repeatedly and after any error.
    pub fn close(&self) {
        self.lock_session().close()
    }

    /// Whether the port is currently open
    pub fn is_open(&self) -> bool {
        self.lock_session().is_open()
    }

    /// Execute one command on the board and return its value
    ///
    /// Opens the port if needed, sends the request frame and waits for the
    /// reply. Fails on transport errors, timeout, a bad reply checksum or a
    /// status other than success. Nothing is retried.
    pub fn execute(
        &self,
        command: impl Into<u8>,
        type_no: u8,
        motor_or_bank: u8,
        value: i32,
    ) -> Result<i32, ProtocolError> {
        let frame = Frame::new(command, type_no, motor_or_bank, value)
            .with_address(self.config.module_address);

        let mut session = self.lock_session();
        session.open()?;

        session.discard_input()?;
        let request = frame.encode();
        tracing::debug!("tx {:02x?}", request);
        session.write(&request)?;

        let received = receive_reply(
            &mut session,
            self.config.timeout(),
            self.config.poll_interval(),
        )?;
        drop(session);

        if received.len() > FRAME_LEN {
            tracing::warn!(
                "discarding {} extra reply bytes: {:02x?}",
                received.len() - FRAME_LEN,
                &received[FRAME_LEN..]
            );
        }

        let mut bytes = [0u8; FRAME_LEN];
        bytes.copy_from_slice(&received[..FRAME_LEN]);
        tracing::debug!("rx {:02x?}", bytes);

        interpret_reply(Reply::decode(&bytes))
    }

    /// Lock the session, recovering it if a previous holder panicked
    fn lock_session(&self) -> MutexGuard<'_, LinkSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Accumulate reply bytes until a full frame arrived or `timeout` elapsed
fn receive_reply(
    session: &mut LinkSession,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<Vec<u8>, ProtocolError> {
    let start = Instant::now();
    let mut received = Vec::with_capacity(FRAME_LEN);
    let mut chunk = [0u8; FRAME_LEN];

    loop {
        let n = session.read_available(&mut chunk)?;
        if n > 0 {
            received.extend_from_slice(&chunk[..n]);
            tracing::trace!("read {} bytes, total = {}", n, received.len());
        }

        if received.len() >= FRAME_LEN {
            return Ok(received);
        }

        if start.elapsed() >= timeout {
            return Err(ProtocolError::Timeout {
                received: received.len(),
            });
        }

        if n == 0 {
            std::thread::sleep(poll_interval);
        }
    }
}

/// Turn a decoded reply into the command result
fn interpret_reply(reply: Reply) -> Result<i32, ProtocolError> {
    if !reply.checksum_valid {
        return Err(ProtocolError::ChecksumMismatch {
            expected: reply.expected_checksum(),
            actual: reply.checksum,
        });
    }

    if !reply.is_success() {
        return Err(ProtocolError::BoardStatus {
            status: reply.status,
        });
    }

    Ok(reply.value)
}
