//! Property tests for the red-channel LSB codec.

use avatar_stego::processing::lsb::{self, CodecError, BITS_PER_CHAR, MARKER_BITS};
use proptest::prelude::*;

/// Random RGBA buffer with room for at least `min_bits` payload bits.
fn buffer_with_capacity(min_bits: usize) -> impl Strategy<Value = Vec<u8>> {
    (0usize..64).prop_flat_map(move |extra_pixels| {
        prop::collection::vec(any::<u8>(), (min_bits + extra_pixels) * 4)
    })
}

proptest! {
    #[test]
    fn round_trip_printable_ascii(
        (text, buffer) in "[ -~]{0,40}".prop_flat_map(|text| {
            let bits = text.len() * BITS_PER_CHAR + MARKER_BITS;
            (Just(text), buffer_with_capacity(bits))
        })
    ) {
        let mut carrier = buffer.clone();
        lsb::encode(&mut carrier, &text).unwrap();
        prop_assert_eq!(lsb::decode(&carrier).unwrap(), Some(text));
    }

    #[test]
    fn encode_touches_only_red_lsb(
        (text, buffer) in "[ -~]{0,24}".prop_flat_map(|text| {
            let bits = text.len() * BITS_PER_CHAR + MARKER_BITS;
            (Just(text), buffer_with_capacity(bits))
        })
    ) {
        let mut carrier = buffer.clone();
        lsb::encode(&mut carrier, &text).unwrap();

        for (before, after) in buffer.chunks_exact(4).zip(carrier.chunks_exact(4)) {
            prop_assert_eq!(&before[1..], &after[1..]);
            prop_assert!(before[0].abs_diff(after[0]) <= 1);
        }
    }

    #[test]
    fn decode_never_mutates(buffer in prop::collection::vec(any::<u8>(), 0..2048)) {
        let len = buffer.len() / 4 * 4;
        let buffer = buffer[..len].to_vec();
        let snapshot = buffer.clone();
        let _ = lsb::decode(&buffer).unwrap();
        prop_assert_eq!(buffer, snapshot);
    }

    #[test]
    fn one_bit_short_is_rejected_without_mutation(text in "[a-z]{1,20}") {
        let required = text.len() * BITS_PER_CHAR + MARKER_BITS;
        let mut buffer = vec![0x55u8; (required - 1) * 4];
        let snapshot = buffer.clone();

        prop_assert_eq!(
            lsb::encode(&mut buffer, &text),
            Err(CodecError::CapacityExceeded { required_bits: required, available_bits: required - 1 })
        );
        prop_assert_eq!(buffer, snapshot);
    }
}

#[test]
fn short_random_buffer_without_marker_is_none() {
    // Fewer than 16 pixels can never hold the marker.
    let buffer: Vec<u8> = (0..15 * 4).map(|i| (i * 73 % 256) as u8).collect();
    assert_eq!(lsb::decode(&buffer), Ok(None));
}

#[test]
fn alternating_bits_have_no_marker() {
    let buffer: Vec<u8> = (0..4096).map(|i| if (i / 4) % 2 == 0 { 1 } else { 0 }).collect();
    assert_eq!(lsb::decode(&buffer), Ok(None));
}
