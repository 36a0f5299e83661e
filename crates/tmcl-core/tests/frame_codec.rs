//! Frame codec properties

use pretty_assertions::assert_eq;
use tmcl_core::protocol::{checksum, Command, Frame, Reply, FRAME_LEN};

const VALUES: [i32; 9] = [0, 1, -1, 300, -300, 0x0102_0304, i32::MAX, i32::MIN, 0x7F00_00FF];

#[test]
fn test_encode_decode_preserves_fields() {
    for command in [1u8, 6, 15, 128, 255] {
        for type_no in [0u8, 7, 255] {
            for motor in [0u8, 2] {
                for value in VALUES {
                    let frame = Frame::new(command, type_no, motor, value);
                    let bytes = frame.encode();

                    // Reply decoding reads the same slots structurally
                    let reply = Reply::decode(&bytes);
                    assert!(reply.checksum_valid);
                    assert_eq!(reply.value, value);
                    assert_eq!(reply.module_address, command);
                    assert_eq!(reply.status, type_no);
                    assert_eq!(reply.command, motor);

                    assert_eq!(Frame::decode(&bytes).expect("valid frame"), frame);
                }
            }
        }
    }
}

#[test]
fn test_value_is_big_endian() {
    let bytes = Frame::new(Command::SetAxisParameter, 4, 0, 0x0102_0304).encode();
    assert_eq!(&bytes[4..8], &[0x01, 0x02, 0x03, 0x04]);
}

#[test]
fn test_single_bit_flip_invalidates() {
    let bytes = Frame::new(Command::MoveToPosition, 1, 2, -123_456).encode();
    for index in 0..8 {
        for bit in 0..8 {
            let mut corrupted = bytes;
            corrupted[index] ^= 1 << bit;
            assert!(
                !Reply::decode(&corrupted).checksum_valid,
                "flip of bit {bit} in byte {index} went unnoticed"
            );
        }
    }
}

#[test]
fn test_sum_preserving_permutation_keeps_checksum() {
    let bytes = Frame::new(Command::GetGlobalParameter, 9, 2, 0x1122_3344).encode();

    let mut swapped = bytes;
    swapped.swap(1, 6);
    swapped.swap(2, 4);
    assert!(Reply::decode(&swapped).checksum_valid);

    let mut shifted = bytes;
    shifted[3] = shifted[3].wrapping_add(10);
    shifted[5] = shifted[5].wrapping_sub(10);
    assert!(Reply::decode(&shifted).checksum_valid);
}

#[test]
fn test_checksum_matches_trailing_byte() {
    for value in VALUES {
        let bytes = Frame::new(Command::GetInput, 0, 1, value).encode();
        assert_eq!(bytes.len(), FRAME_LEN);
        assert_eq!(bytes[8], checksum(&bytes[..8]));
    }
}
