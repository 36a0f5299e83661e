//! # tmcl-core
//!
//! Host-side client for the TMCL protocol spoken by stepper-motor controller
//! boards over a serial link.

#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//!
//! This library provides:
//! - The fixed 9-byte frame codec and its checksum
//! - A link session owning the serial port lifecycle
//! - An exchange engine that runs one command at a time and validates replies
//! - Typed wrappers for the standard TMCL instructions
//! - A simulated board for testing without hardware
//!
//! ## Example
//!
//! ```rust,no_run
//! use tmcl_core::protocol::{Connection, ConnectionConfig};
//!
//! let conn = Connection::new(ConnectionConfig::new("/dev/ttyACM0"));
//!
//! // The port is opened on the first command
//! conn.rotate_right(0, 500)?;
//! let position = conn.get_axis_parameter(1, 0)?;
//! println!("position: {position}");
//! conn.motor_stop(0)?;
//! # Ok::<(), tmcl_core::protocol::ProtocolError>(())
//! ```

pub mod board;
pub mod demo;
pub mod protocol;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::board::{ApplicationState, ApplicationStatus, FirmwareVersion};
    pub use crate::demo::SimulatedBoard;
    pub use crate::protocol::{
        Command, Connection, ConnectionConfig, MoveMode, ProtocolError, Status,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
