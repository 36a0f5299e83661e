//! TMCL Protocol Communication
//!
//! Implements the fixed 9-byte TMCL command/response protocol used by
//! stepper-motor controller boards on a serial link.
//!
//! Every exchange is one request frame followed by exactly one reply frame.
//! Frames carry a single-byte checksum (wrapping sum of the first 8 bytes).

pub mod commands;
mod connection;
mod error;
mod frame;
pub mod serial;
mod session;

pub use commands::{Command, MoveMode, Status};
pub use connection::{Connection, ConnectionConfig};
pub use error::ProtocolError;
pub use frame::{checksum, Frame, Reply};
pub use serial::{PortOpener, SerialOpener, Transport};
pub use session::LinkSession;

/// Default baud rate for TMCL boards
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default timeout for a reply frame in milliseconds, measured from the start
/// of the receive loop
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Default sleep between empty polls of the transport in milliseconds
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Size of every frame on the wire, in both directions
pub const FRAME_LEN: usize = 9;

/// Status byte reported by the board for a successfully executed command
pub const STATUS_SUCCESS: u8 = 100;
