//! Frame encoding/decoding
//!
//! Every TMCL frame is exactly 9 bytes in both directions.
//!
//! Request frame:
//! - 1 byte: Module address
//! - 1 byte: Command code
//! - 1 byte: Type / sub-index
//! - 1 byte: Motor number or parameter bank
//! - 4 bytes: Value (signed, big-endian)
//! - 1 byte: Checksum (wrapping sum of the 8 bytes before it)
//!
//! Reply frame:
//! - 1 byte: Reply (host) address
//! - 1 byte: Module address
//! - 1 byte: Status code (100 = success)
//! - 1 byte: Command code being answered
//! - 4 bytes: Value (signed, big-endian)
//! - 1 byte: Checksum

use byteorder::{BigEndian, ByteOrder};

use super::{ProtocolError, FRAME_LEN, STATUS_SUCCESS};

/// Wrapping byte-wise sum used as the frame checksum
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

/// A request frame sent from the host to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Module address (0 for single-board setups)
    pub address: u8,
    /// Instruction code
    pub command: u8,
    /// Type or sub-index
    pub type_no: u8,
    /// Motor number or parameter bank
    pub motor_or_bank: u8,
    /// Signed 32-bit value
    pub value: i32,
}

impl Frame {
    /// Create a request frame addressed to module 0
    pub fn new(command: impl Into<u8>, type_no: u8, motor_or_bank: u8, value: i32) -> Self {
        Self {
            address: 0,
            command: command.into(),
            type_no,
            motor_or_bank,
            value,
        }
    }

    /// Set the module address
    pub fn with_address(mut self, address: u8) -> Self {
        self.address = address;
        self
    }

    /// Encode the frame to its 9 wire bytes, checksum included
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = self.address;
        bytes[1] = self.command;
        bytes[2] = self.type_no;
        bytes[3] = self.motor_or_bank;
        BigEndian::write_i32(&mut bytes[4..8], self.value);
        bytes[8] = checksum(&bytes[..8]);
        bytes
    }

    /// Decode a request frame, rejecting it if the checksum does not match
    pub fn decode(bytes: &[u8; FRAME_LEN]) -> Result<Self, ProtocolError> {
        let expected = checksum(&bytes[..8]);
        if bytes[8] != expected {
            return Err(ProtocolError::ChecksumMismatch {
                expected,
                actual: bytes[8],
            });
        }

        Ok(Self {
            address: bytes[0],
            command: bytes[1],
            type_no: bytes[2],
            motor_or_bank: bytes[3],
            value: BigEndian::read_i32(&bytes[4..8]),
        })
    }
}

/// A reply frame received from the board
///
/// Decoding never fails: any 9 bytes produce a `Reply`. Callers must check
/// [`Reply::checksum_valid`] before trusting `status` or `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply {
    /// Address of the host the reply is sent to
    pub reply_address: u8,
    /// Address of the answering module
    pub module_address: u8,
    /// Status code (100 = success)
    pub status: u8,
    /// Command code being answered
    pub command: u8,
    /// Signed 32-bit return value
    pub value: i32,
    /// Checksum byte as received
    pub checksum: u8,
    /// Whether `checksum` matches the sum of the first 8 bytes
    pub checksum_valid: bool,
}

impl Reply {
    /// Build a well-formed reply
    pub fn new(module_address: u8, status: impl Into<u8>, command: u8, value: i32) -> Self {
        let mut reply = Self {
            reply_address: 2,
            module_address,
            status: status.into(),
            command,
            value,
            checksum: 0,
            checksum_valid: true,
        };
        reply.checksum = checksum(&reply.encode()[..8]);
        reply
    }

    /// Structurally decode 9 bytes
    pub fn decode(bytes: &[u8; FRAME_LEN]) -> Self {
        Self {
            reply_address: bytes[0],
            module_address: bytes[1],
            status: bytes[2],
            command: bytes[3],
            value: BigEndian::read_i32(&bytes[4..8]),
            checksum: bytes[8],
            checksum_valid: bytes[8] == checksum(&bytes[..8]),
        }
    }

    /// Encode the reply to its 9 wire bytes with a freshly computed checksum
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut bytes = [0u8; FRAME_LEN];
        bytes[0] = self.reply_address;
        bytes[1] = self.module_address;
        bytes[2] = self.status;
        bytes[3] = self.command;
        BigEndian::write_i32(&mut bytes[4..8], self.value);
        bytes[8] = checksum(&bytes[..8]);
        bytes
    }

    /// Checksum the first 8 received bytes should have produced
    pub fn expected_checksum(&self) -> u8 {
        checksum(&self.encode()[..8])
    }

    /// Whether the board reported success
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Command;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_encode_layout() {
        let frame = Frame::new(Command::MoveToPosition, 0, 1, 300);
        assert_eq!(
            frame.encode(),
            [0x00, 0x04, 0x00, 0x01, 0x00, 0x00, 0x01, 0x2C, 0x32]
        );
    }

    #[test]
    fn test_encode_negative_value() {
        let bytes = Frame::new(Command::RotateLeft, 0, 0, -1).encode();
        assert_eq!(&bytes[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);
        // 2 + 4 * 0xFF wraps to 0xFE
        assert_eq!(bytes[8], 0xFE);
    }

    #[test]
    fn test_checksum_wraps() {
        assert_eq!(checksum(&[0xFF, 0x01]), 0x00);
        assert_eq!(checksum(&[0x80, 0x80, 0x05]), 0x05);
        assert_eq!(checksum(&[]), 0);
    }

    #[test]
    fn test_request_roundtrip() {
        let frame = Frame::new(Command::SetAxisParameter, 4, 2, i32::MIN).with_address(1);
        let decoded = Frame::decode(&frame.encode()).expect("Should decode successfully");
        assert_eq!(frame, decoded);
    }

    #[test]
    fn test_request_bad_checksum() {
        let mut bytes = Frame::new(Command::GetInput, 1, 0, 0).encode();
        bytes[8] = bytes[8].wrapping_add(1);
        assert!(matches!(
            Frame::decode(&bytes),
            Err(ProtocolError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_reply_decode_success() {
        let mut bytes = [0x02, 0x01, 100, 0x06, 0x00, 0x00, 0x01, 0x2C, 0x00];
        bytes[8] = checksum(&bytes[..8]);
        let reply = Reply::decode(&bytes);
        assert!(reply.checksum_valid);
        assert!(reply.is_success());
        assert_eq!(reply.value, 300);
        assert_eq!(reply.command, 6);
    }

    #[test]
    fn test_reply_decode_any_bytes() {
        let reply = Reply::decode(&[0xAA; FRAME_LEN]);
        assert!(!reply.checksum_valid);
        assert_eq!(reply.status, 0xAA);
        assert_eq!(reply.expected_checksum(), checksum(&[0xAA; 8]));
    }

    #[test]
    fn test_reply_encode_decode() {
        let reply = Reply::new(1, 5u8, 9, -42);
        let decoded = Reply::decode(&reply.encode());
        assert_eq!(reply, decoded);
        assert!(!decoded.is_success());
    }
}
