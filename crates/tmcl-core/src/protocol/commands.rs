//! Protocol commands
//!
//! Command and status codes of the TMCL instruction set. Codes are referenced
//! symbolically everywhere else in the crate.

use serde::{Deserialize, Serialize};

/// Bank holding the global (program) variables
pub const GLOBAL_PARAMETER_BANK: u8 = 2;

/// Bank used with GIO for digital inputs
pub const DIGITAL_INPUT_BANK: u8 = 0;

/// Bank used with GIO for analog inputs
pub const ANALOG_INPUT_BANK: u8 = 1;

/// Bank used with SIO/GIO for the digital outputs
pub const DIGITAL_OUTPUT_BANK: u8 = 2;

/// TMCL instruction codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Command {
    /// Rotate right (ROR)
    RotateRight = 1,
    /// Rotate left (ROL)
    RotateLeft = 2,
    /// Motor stop (MST)
    MotorStop = 3,
    /// Move to position (MVP)
    MoveToPosition = 4,
    /// Set axis parameter (SAP)
    SetAxisParameter = 5,
    /// Get axis parameter (GAP)
    GetAxisParameter = 6,
    /// Store axis parameter to EEPROM (STAP)
    StoreAxisParameter = 7,
    /// Restore axis parameter from EEPROM (RSAP)
    RestoreAxisParameter = 8,
    /// Set global parameter (SGP)
    SetGlobalParameter = 9,
    /// Get global parameter (GGP)
    GetGlobalParameter = 10,
    /// Store global parameter to EEPROM (STGP)
    StoreGlobalParameter = 11,
    /// Restore global parameter from EEPROM (RSGP)
    RestoreGlobalParameter = 12,
    /// Set output (SIO)
    SetOutput = 14,
    /// Get input/output (GIO)
    GetInput = 15,
    /// Stop the stored TMCL application
    StopApplication = 128,
    /// Run the stored TMCL application
    RunApplication = 129,
    /// Execute a single application instruction
    StepApplication = 130,
    /// Reset the application program counter
    ResetApplication = 131,
    /// Query application run state and program counter
    GetApplicationStatus = 135,
    /// Query firmware version
    GetFirmwareVersion = 136,
}

impl Command {
    /// Numeric instruction code sent in byte 1 of a request frame
    pub fn code(self) -> u8 {
        self as u8
    }

    /// TMCL mnemonic, as used in board manuals
    pub fn mnemonic(self) -> &'static str {
        match self {
            Command::RotateRight => "ROR",
            Command::RotateLeft => "ROL",
            Command::MotorStop => "MST",
            Command::MoveToPosition => "MVP",
            Command::SetAxisParameter => "SAP",
            Command::GetAxisParameter => "GAP",
            Command::StoreAxisParameter => "STAP",
            Command::RestoreAxisParameter => "RSAP",
            Command::SetGlobalParameter => "SGP",
            Command::GetGlobalParameter => "GGP",
            Command::StoreGlobalParameter => "STGP",
            Command::RestoreGlobalParameter => "RSGP",
            Command::SetOutput => "SIO",
            Command::GetInput => "GIO",
            Command::StopApplication => "STOP",
            Command::RunApplication => "RUN",
            Command::StepApplication => "STEP",
            Command::ResetApplication => "RESET",
            Command::GetApplicationStatus => "STATUS",
            Command::GetFirmwareVersion => "VERSION",
        }
    }
}

impl From<Command> for u8 {
    fn from(cmd: Command) -> u8 {
        cmd.code()
    }
}

impl TryFrom<u8> for Command {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Command::RotateRight,
            2 => Command::RotateLeft,
            3 => Command::MotorStop,
            4 => Command::MoveToPosition,
            5 => Command::SetAxisParameter,
            6 => Command::GetAxisParameter,
            7 => Command::StoreAxisParameter,
            8 => Command::RestoreAxisParameter,
            9 => Command::SetGlobalParameter,
            10 => Command::GetGlobalParameter,
            11 => Command::StoreGlobalParameter,
            12 => Command::RestoreGlobalParameter,
            14 => Command::SetOutput,
            15 => Command::GetInput,
            128 => Command::StopApplication,
            129 => Command::RunApplication,
            130 => Command::StepApplication,
            131 => Command::ResetApplication,
            135 => Command::GetApplicationStatus,
            136 => Command::GetFirmwareVersion,
            other => return Err(other),
        })
    }
}

/// Status codes reported in byte 2 of a reply frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    /// Request frame checksum was wrong
    WrongChecksum = 1,
    /// Unknown instruction code
    InvalidCommand = 2,
    /// Type byte out of range for the instruction
    WrongType = 3,
    /// Value out of range for the instruction
    InvalidValue = 4,
    /// Configuration EEPROM is locked
    ConfigurationLocked = 5,
    /// Instruction not available on this module
    CommandNotAvailable = 6,
    /// Command executed successfully
    Success = 100,
    /// Command stored into EEPROM (download mode)
    LoadedIntoEeprom = 101,
}

impl Status {
    /// Numeric status code
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable description of a raw status code
    pub fn describe(code: u8) -> &'static str {
        match Status::try_from(code) {
            Ok(Status::WrongChecksum) => "wrong checksum",
            Ok(Status::InvalidCommand) => "invalid command",
            Ok(Status::WrongType) => "wrong type",
            Ok(Status::InvalidValue) => "invalid value",
            Ok(Status::ConfigurationLocked) => "configuration memory locked",
            Ok(Status::CommandNotAvailable) => "command not available",
            Ok(Status::Success) => "success",
            Ok(Status::LoadedIntoEeprom) => "command loaded into EEPROM",
            Err(_) => "unknown status",
        }
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            1 => Status::WrongChecksum,
            2 => Status::InvalidCommand,
            3 => Status::WrongType,
            4 => Status::InvalidValue,
            5 => Status::ConfigurationLocked,
            6 => Status::CommandNotAvailable,
            100 => Status::Success,
            101 => Status::LoadedIntoEeprom,
            other => return Err(other),
        })
    }
}

/// Positioning mode for MVP, sent as the type byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MoveMode {
    /// Absolute target position
    Absolute = 0,
    /// Target relative to the current position
    Relative = 1,
    /// Move to a stored coordinate
    Coordinate = 2,
}

impl From<MoveMode> for u8 {
    fn from(mode: MoveMode) -> u8 {
        mode as u8
    }
}
