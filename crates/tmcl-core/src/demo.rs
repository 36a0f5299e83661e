//! Demo Mode - Simulated TMCL board for testing
//!
//! Answers TMCL requests from in-memory state so the exchange engine and the
//! command wrappers can be exercised without hardware. Replies are delivered
//! in randomly sized chunks, the way a USB serial adapter tends to hand them
//! over.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::board::{AXIS_ACTUAL_POSITION, AXIS_ACTUAL_SPEED, AXIS_TARGET_POSITION, AXIS_TARGET_SPEED};
use crate::protocol::commands::{ANALOG_INPUT_BANK, DIGITAL_INPUT_BANK, DIGITAL_OUTPUT_BANK};
use crate::protocol::{
    Command, Frame, MoveMode, PortOpener, ProtocolError, Reply, Status, Transport, FRAME_LEN,
};

/// Firmware reported by the simulator: TMCM-1110 V1.39
const SIMULATED_FIRMWARE: i32 = 0x0456_0127;

/// Number of outputs on the simulated module
const OUTPUT_COUNT: u8 = 8;

#[derive(Debug)]
struct BoardState {
    module_address: u8,
    motor_count: u8,
    /// (motor, index) -> value
    axis: HashMap<(u8, u8), i32>,
    axis_eeprom: HashMap<(u8, u8), i32>,
    /// (bank, index) -> value
    globals: HashMap<(u8, u8), i32>,
    globals_eeprom: HashMap<(u8, u8), i32>,
    /// (bank, port) -> value
    inputs: HashMap<(u8, u8), i32>,
    outputs: [bool; OUTPUT_COUNT as usize],
    app_state: u8,
    program_counter: u32,
    silent: bool,
    unavailable: bool,
    corrupt_next: bool,
    opens: usize,
    requests: Vec<Frame>,
}

impl BoardState {
    fn new(motor_count: u8) -> Self {
        Self {
            module_address: 0,
            motor_count,
            axis: HashMap::new(),
            axis_eeprom: HashMap::new(),
            globals: HashMap::new(),
            globals_eeprom: HashMap::new(),
            inputs: HashMap::new(),
            outputs: [false; OUTPUT_COUNT as usize],
            app_state: 0,
            program_counter: 0,
            silent: false,
            unavailable: false,
            corrupt_next: false,
            opens: 0,
            requests: Vec::new(),
        }
    }

    fn axis_value(&self, motor: u8, index: u8) -> i32 {
        self.axis.get(&(motor, index)).copied().unwrap_or(0)
    }

    /// Handle one request frame; `None` means the board stays silent
    fn respond(&mut self, bytes: &[u8; FRAME_LEN]) -> Option<[u8; FRAME_LEN]> {
        if self.silent {
            return None;
        }

        let (command, result) = match Frame::decode(bytes) {
            Ok(frame) => {
                if frame.address != self.module_address {
                    return None;
                }
                self.requests.push(frame);
                (frame.command, self.execute(&frame))
            }
            Err(_) => (bytes[1], Err(Status::WrongChecksum)),
        };

        let reply = match result {
            Ok(value) => Reply::new(self.module_address, Status::Success, command, value),
            Err(status) => Reply::new(self.module_address, status, command, 0),
        };

        let mut out = reply.encode();
        if self.corrupt_next {
            self.corrupt_next = false;
            out[7] ^= 0x01;
        }
        Some(out)
    }

    fn execute(&mut self, frame: &Frame) -> Result<i32, Status> {
        let command = Command::try_from(frame.command).map_err(|_| Status::InvalidCommand)?;
        let motor = frame.motor_or_bank;

        match command {
            Command::RotateRight | Command::RotateLeft | Command::MotorStop => {
                self.check_motor(motor)?;
                let speed = match command {
                    Command::RotateRight => frame.value,
                    Command::RotateLeft => frame.value.wrapping_neg(),
                    _ => 0,
                };
                self.axis.insert((motor, AXIS_TARGET_SPEED), speed);
                self.axis.insert((motor, AXIS_ACTUAL_SPEED), speed);
                Ok(0)
            }
            Command::MoveToPosition => {
                self.check_motor(motor)?;
                let target = match frame.type_no {
                    t if t == MoveMode::Absolute as u8 => frame.value,
                    t if t == MoveMode::Relative as u8 => self
                        .axis_value(motor, AXIS_ACTUAL_POSITION)
                        .wrapping_add(frame.value),
                    // No stored coordinates on the simulated module
                    t if t == MoveMode::Coordinate as u8 => return Err(Status::InvalidValue),
                    _ => return Err(Status::WrongType),
                };
                self.axis.insert((motor, AXIS_TARGET_POSITION), target);
                self.axis.insert((motor, AXIS_ACTUAL_POSITION), target);
                Ok(target)
            }
            Command::SetAxisParameter => {
                self.check_motor(motor)?;
                self.axis.insert((motor, frame.type_no), frame.value);
                Ok(0)
            }
            Command::GetAxisParameter => {
                self.check_motor(motor)?;
                Ok(self.axis_value(motor, frame.type_no))
            }
            Command::StoreAxisParameter => {
                self.check_motor(motor)?;
                let value = self.axis_value(motor, frame.type_no);
                self.axis_eeprom.insert((motor, frame.type_no), value);
                Ok(0)
            }
            Command::RestoreAxisParameter => {
                self.check_motor(motor)?;
                let key = (motor, frame.type_no);
                let value = self.axis_eeprom.get(&key).copied().unwrap_or(0);
                self.axis.insert(key, value);
                Ok(0)
            }
            Command::SetGlobalParameter => {
                self.globals.insert((motor, frame.type_no), frame.value);
                Ok(0)
            }
            Command::GetGlobalParameter => {
                Ok(self.globals.get(&(motor, frame.type_no)).copied().unwrap_or(0))
            }
            Command::StoreGlobalParameter => {
                let key = (motor, frame.type_no);
                let value = self.globals.get(&key).copied().unwrap_or(0);
                self.globals_eeprom.insert(key, value);
                Ok(0)
            }
            Command::RestoreGlobalParameter => {
                let key = (motor, frame.type_no);
                let value = self.globals_eeprom.get(&key).copied().unwrap_or(0);
                self.globals.insert(key, value);
                Ok(0)
            }
            Command::SetOutput => {
                if frame.motor_or_bank != DIGITAL_OUTPUT_BANK {
                    return Err(Status::InvalidValue);
                }
                let slot = self
                    .outputs
                    .get_mut(frame.type_no as usize)
                    .ok_or(Status::WrongType)?;
                *slot = frame.value != 0;
                Ok(0)
            }
            Command::GetInput => match frame.motor_or_bank {
                DIGITAL_OUTPUT_BANK => self
                    .outputs
                    .get(frame.type_no as usize)
                    .map(|on| i32::from(*on))
                    .ok_or(Status::WrongType),
                DIGITAL_INPUT_BANK | ANALOG_INPUT_BANK => Ok(self
                    .inputs
                    .get(&(frame.motor_or_bank, frame.type_no))
                    .copied()
                    .unwrap_or(0)),
                _ => Err(Status::InvalidValue),
            },
            Command::StopApplication => {
                self.app_state = 0;
                Ok(0)
            }
            Command::RunApplication => {
                if frame.type_no == 1 {
                    self.program_counter = frame.value as u32 & 0x00FF_FFFF;
                }
                self.app_state = 1;
                Ok(0)
            }
            Command::StepApplication => {
                self.app_state = 2;
                self.program_counter = (self.program_counter + 1) & 0x00FF_FFFF;
                Ok(0)
            }
            Command::ResetApplication => {
                self.app_state = 3;
                self.program_counter = 0;
                Ok(0)
            }
            Command::GetApplicationStatus => {
                Ok((((self.app_state as u32) << 24) | self.program_counter) as i32)
            }
            Command::GetFirmwareVersion => match frame.type_no {
                1 => Ok(SIMULATED_FIRMWARE),
                // The string form needs a non-standard reply frame
                _ => Err(Status::WrongType),
            },
        }
    }

    fn check_motor(&self, motor: u8) -> Result<(), Status> {
        if motor < self.motor_count {
            Ok(())
        } else {
            Err(Status::InvalidValue)
        }
    }
}

/// Simulated TMCL module
///
/// Cloning yields a handle to the same board. Use it as the [`PortOpener`] of
/// a [`Connection`](crate::protocol::Connection); each open produces a fresh
/// [`SimulatedPort`].
#[derive(Debug, Clone)]
pub struct SimulatedBoard {
    state: Arc<Mutex<BoardState>>,
    seed: Option<u64>,
}

impl Default for SimulatedBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedBoard {
    /// Three-axis module with random reply chunking
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BoardState::new(3))),
            seed: None,
        }
    }

    /// Same as [`SimulatedBoard::new`] but with reproducible reply chunking
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::new()
        }
    }

    /// Set the module address the board answers to
    pub fn set_module_address(&self, address: u8) {
        self.state().module_address = address;
    }

    /// Stop answering requests
    pub fn set_silent(&self, silent: bool) {
        self.state().silent = silent;
    }

    /// Make opening the port fail
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Flip a value bit in the next reply without fixing its checksum
    pub fn corrupt_next_reply(&self) {
        self.state().corrupt_next = true;
    }

    /// Drive an input pin
    pub fn set_input(&self, bank: u8, port: u8, value: i32) {
        self.state().inputs.insert((bank, port), value);
    }

    /// Current value of an axis parameter
    pub fn axis_parameter(&self, motor: u8, index: u8) -> i32 {
        self.state().axis_value(motor, index)
    }

    /// Current state of a digital output
    pub fn output(&self, port: u8) -> bool {
        self.state()
            .outputs
            .get(port as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Number of times a port has been opened on this board
    pub fn open_count(&self) -> usize {
        self.state().opens
    }

    /// Every well-formed request the board has answered, oldest first
    pub fn requests(&self) -> Vec<Frame> {
        self.state().requests.clone()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PortOpener for SimulatedBoard {
    fn open(&self, port_name: &str, _baud_rate: u32) -> Result<Box<dyn Transport>, ProtocolError> {
        let mut state = self.state();
        if state.unavailable {
            return Err(ProtocolError::PortOpen {
                port: port_name.to_string(),
                reason: "simulated board unavailable".to_string(),
            });
        }
        state.opens += 1;

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(state.opens as u64)),
            None => StdRng::from_entropy(),
        };

        Ok(Box::new(SimulatedPort {
            board: Arc::clone(&self.state),
            request: Vec::with_capacity(FRAME_LEN),
            pending: VecDeque::new(),
            rng,
        }))
    }
}

/// Transport end of a [`SimulatedBoard`]
pub struct SimulatedPort {
    board: Arc<Mutex<BoardState>>,
    /// Request bytes not yet forming a full frame
    request: Vec<u8>,
    /// Reply bytes not yet read by the host
    pending: VecDeque<u8>,
    rng: StdRng,
}

impl Transport for SimulatedPort {
    fn write_all(&mut self, data: &[u8]) -> Result<(), ProtocolError> {
        self.request.extend_from_slice(data);

        while self.request.len() >= FRAME_LEN {
            let mut frame = [0u8; FRAME_LEN];
            frame.copy_from_slice(&self.request[..FRAME_LEN]);
            self.request.drain(..FRAME_LEN);

            let reply = self
                .board
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .respond(&frame);
            if let Some(reply) = reply {
                self.pending.extend(reply);
            }
        }
        Ok(())
    }

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        if self.pending.is_empty() || buf.is_empty() {
            return Ok(0);
        }

        // Now and then nothing has arrived yet
        if self.rng.gen_bool(0.25) {
            return Ok(0);
        }

        let max = self.pending.len().min(buf.len());
        let n = self.rng.gen_range(1..=max);
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn discard_input(&mut self) -> Result<(), ProtocolError> {
        self.pending.clear();
        Ok(())
    }
}
