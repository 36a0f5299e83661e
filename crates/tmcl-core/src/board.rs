//! Typed TMCL commands
//!
//! Each method is a single [`Connection::execute`] call. Values pass through
//! unchanged; units and parameter meanings depend on the module and are left
//! to the caller.

use serde::{Deserialize, Serialize};

use crate::protocol::commands::DIGITAL_OUTPUT_BANK;
use crate::protocol::{Command, Connection, MoveMode, ProtocolError};

/// Axis parameter: target position
pub const AXIS_TARGET_POSITION: u8 = 0;
/// Axis parameter: actual position
pub const AXIS_ACTUAL_POSITION: u8 = 1;
/// Axis parameter: target speed
pub const AXIS_TARGET_SPEED: u8 = 2;
/// Axis parameter: actual speed
pub const AXIS_ACTUAL_SPEED: u8 = 3;

/// Run state of the stored TMCL application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplicationState {
    /// Not executing
    Stopped,
    /// Executing continuously
    Running,
    /// Paused after a single-step
    Step,
    /// Program counter was reset
    Reset,
    /// State byte not defined by the protocol
    Unknown(u8),
}

impl From<u8> for ApplicationState {
    fn from(value: u8) -> Self {
        match value {
            0 => ApplicationState::Stopped,
            1 => ApplicationState::Running,
            2 => ApplicationState::Step,
            3 => ApplicationState::Reset,
            other => ApplicationState::Unknown(other),
        }
    }
}

/// Reply to the application status query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationStatus {
    /// Run state (top byte of the reply value)
    pub state: ApplicationState,
    /// Program counter (low 24 bits of the reply value)
    pub program_counter: u32,
}

impl ApplicationStatus {
    /// Unpack a raw reply value: top byte is the run state
    pub fn from_value(value: i32) -> Self {
        let raw = value as u32;
        Self {
            state: ApplicationState::from((raw >> 24) as u8),
            program_counter: raw & 0x00FF_FFFF,
        }
    }
}

/// Binary firmware version reply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirmwareVersion {
    /// Module type number, e.g. 1110 for a TMCM-1110
    pub module_type: u16,
    /// Major firmware version
    pub major: u8,
    /// Minor firmware version
    pub minor: u8,
}

impl FirmwareVersion {
    /// Unpack a raw reply value: module type in the high 16 bits, then major, then minor
    pub fn from_value(value: i32) -> Self {
        let raw = value as u32;
        Self {
            module_type: (raw >> 16) as u16,
            major: (raw >> 8) as u8,
            minor: raw as u8,
        }
    }
}

impl std::fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TMCM-{} V{}.{:02}", self.module_type, self.major, self.minor)
    }
}

impl Connection {
    /// ROR: rotate right at `velocity`
    pub fn rotate_right(&self, motor: u8, velocity: i32) -> Result<(), ProtocolError> {
        self.execute(Command::RotateRight, 0, motor, velocity)?;
        Ok(())
    }

    /// ROL: rotate left at `velocity`
    pub fn rotate_left(&self, motor: u8, velocity: i32) -> Result<(), ProtocolError> {
        self.execute(Command::RotateLeft, 0, motor, velocity)?;
        Ok(())
    }

    /// MST: stop the motor
    pub fn motor_stop(&self, motor: u8) -> Result<(), ProtocolError> {
        self.execute(Command::MotorStop, 0, motor, 0)?;
        Ok(())
    }

    /// MVP: start a positioning move
    pub fn move_to(&self, mode: MoveMode, motor: u8, value: i32) -> Result<(), ProtocolError> {
        self.execute(Command::MoveToPosition, mode.into(), motor, value)?;
        Ok(())
    }

    /// SAP: set an axis parameter
    pub fn set_axis_parameter(&self, index: u8, motor: u8, value: i32) -> Result<(), ProtocolError> {
        self.execute(Command::SetAxisParameter, index, motor, value)?;
        Ok(())
    }

    /// GAP: read an axis parameter
    pub fn get_axis_parameter(&self, index: u8, motor: u8) -> Result<i32, ProtocolError> {
        self.execute(Command::GetAxisParameter, index, motor, 0)
    }

    /// STAP: store an axis parameter to EEPROM
    pub fn store_axis_parameter(&self, index: u8, motor: u8) -> Result<(), ProtocolError> {
        self.execute(Command::StoreAxisParameter, index, motor, 0)?;
        Ok(())
    }

    /// RSAP: restore an axis parameter from EEPROM
    pub fn restore_axis_parameter(&self, index: u8, motor: u8) -> Result<(), ProtocolError> {
        self.execute(Command::RestoreAxisParameter, index, motor, 0)?;
        Ok(())
    }

    /// SGP: set a global parameter
    pub fn set_global_parameter(&self, index: u8, bank: u8, value: i32) -> Result<(), ProtocolError> {
        self.execute(Command::SetGlobalParameter, index, bank, value)?;
        Ok(())
    }

    /// GGP: read a global parameter
    pub fn get_global_parameter(&self, index: u8, bank: u8) -> Result<i32, ProtocolError> {
        self.execute(Command::GetGlobalParameter, index, bank, 0)
    }

    /// STGP: store a global parameter to EEPROM
    pub fn store_global_parameter(&self, index: u8, bank: u8) -> Result<i32, ProtocolError> {
        self.execute(Command::StoreGlobalParameter, index, bank, 0)
    }

    /// RSGP: restore a global parameter from EEPROM
    pub fn restore_global_parameter(&self, index: u8, bank: u8) -> Result<i32, ProtocolError> {
        self.execute(Command::RestoreGlobalParameter, index, bank, 0)
    }

    /// SIO: switch a digital output
    pub fn set_output(&self, port: u8, on: bool) -> Result<(), ProtocolError> {
        self.execute(Command::SetOutput, port, DIGITAL_OUTPUT_BANK, i32::from(on))?;
        Ok(())
    }

    /// GIO: read an input or output from `bank`
    pub fn get_input(&self, port: u8, bank: u8) -> Result<i32, ProtocolError> {
        self.execute(Command::GetInput, port, bank, 0)
    }

    /// Stop the stored application
    pub fn stop_application(&self) -> Result<(), ProtocolError> {
        self.execute(Command::StopApplication, 0, 0, 0)?;
        Ok(())
    }

    /// Run the stored application, from `address` if given, else from the
    /// current program counter
    pub fn run_application(&self, address: Option<u32>) -> Result<(), ProtocolError> {
        match address {
            Some(address) => self.execute(Command::RunApplication, 1, 0, address as i32)?,
            None => self.execute(Command::RunApplication, 0, 0, 0)?,
        };
        Ok(())
    }

    /// Execute a single application instruction
    pub fn step_application(&self) -> Result<(), ProtocolError> {
        self.execute(Command::StepApplication, 0, 0, 0)?;
        Ok(())
    }

    /// Reset the application program counter
    pub fn reset_application(&self) -> Result<(), ProtocolError> {
        self.execute(Command::ResetApplication, 0, 0, 0)?;
        Ok(())
    }

    /// Query the application run state and program counter
    pub fn application_status(&self) -> Result<ApplicationStatus, ProtocolError> {
        let value = self.execute(Command::GetApplicationStatus, 0, 0, 0)?;
        Ok(ApplicationStatus::from_value(value))
    }

    /// Query the firmware version in binary form
    pub fn firmware_version(&self) -> Result<FirmwareVersion, ProtocolError> {
        let value = self.execute(Command::GetFirmwareVersion, 1, 0, 0)?;
        Ok(FirmwareVersion::from_value(value))
    }
}
