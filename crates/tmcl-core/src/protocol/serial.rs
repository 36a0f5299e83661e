//! Serial port handling
//!
//! The exchange engine talks to the board through the [`Transport`] trait and
//! obtains transports from a [`PortOpener`]. [`SerialOpener`] is the real
//! implementation on top of the `serialport` crate; tests and the simulated
//! board provide their own.

use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;

use super::ProtocolError;

/// Byte-level link to a board
///
/// Closing a transport is dropping it.
pub trait Transport: Send {
    /// Write all bytes to the link
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError>;

    /// Read whatever is available right now, up to `buf.len()` bytes.
    ///
    /// Returns `Ok(0)` when no data is pending. Must not block for long; the
    /// caller owns timeout accounting.
    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError>;

    /// Drop any bytes received but not yet read
    fn discard_input(&mut self) -> Result<(), ProtocolError> {
        Ok(())
    }
}

/// Opens transports on demand
pub trait PortOpener: Send + Sync {
    /// Open the link at `port_name` with the given baud rate
    fn open(&self, port_name: &str, baud_rate: u32) -> Result<Box<dyn Transport>, ProtocolError>;
}

/// Opens real serial ports
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialOpener;

impl PortOpener for SerialOpener {
    fn open(&self, port_name: &str, baud_rate: u32) -> Result<Box<dyn Transport>, ProtocolError> {
        let mut port = open_port(port_name, baud_rate)?;
        configure_port(port.as_mut()).map_err(|e| ProtocolError::PortOpen {
            port: port_name.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Box::new(SerialTransport { port }))
    }
}

/// [`Transport`] over a `serialport` handle
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
}

impl Transport for SerialTransport {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        // Poll bytes_to_read() so read() never blocks on an empty line
        let available = self
            .port
            .bytes_to_read()
            .map_err(|e| ProtocolError::SerialError(e.to_string()))? as usize;
        if available == 0 || buf.is_empty() {
            return Ok(0);
        }

        let to_read = available.min(buf.len());
        match self.port.read(&mut buf[..to_read]) {
            Ok(n) => Ok(n),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::TimedOut
                    || e.kind() == std::io::ErrorKind::WouldBlock =>
            {
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> Result<(), ProtocolError> {
        clear_input(self.port.as_mut())
    }
}

/// Open a serial port with a short read timeout
pub fn open_port(name: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>, ProtocolError> {
    serialport::new(name, baud_rate)
        .timeout(Duration::from_millis(10))
        .open()
        .map_err(|e| ProtocolError::PortOpen {
            port: name.to_string(),
            reason: e.to_string(),
        })
}

/// Configure a serial port for TMCL communication (8N1, no flow control)
pub fn configure_port(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.set_data_bits(serialport::DataBits::Eight)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_parity(serialport::Parity::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_stop_bits(serialport::StopBits::One)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    port.set_flow_control(serialport::FlowControl::None)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))?;
    Ok(())
}

/// Clear the serial port receive buffer
pub fn clear_input(port: &mut dyn SerialPort) -> Result<(), ProtocolError> {
    port.clear(serialport::ClearBuffer::Input)
        .map_err(|e| ProtocolError::SerialError(e.to_string()))
}
