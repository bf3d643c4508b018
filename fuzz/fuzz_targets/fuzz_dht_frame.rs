//! Fuzz target: DHT11 frame decoding
//!
//! Arbitrary pulse widths and raw frames must never panic the decoder,
//! and every accepted frame must carry a matching checksum.
//!
//! cargo fuzz run fuzz_dht_frame

#![no_main]

use gasguard::error::SensorError;
use gasguard::sensors::temperature::{decode_frame, pulses_to_frame};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 5 {
        return;
    }
    let frame = [data[0], data[1], data[2], data[3], data[4]];
    let sum = frame[..4].iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    match decode_frame(frame) {
        Ok(t) => {
            assert_eq!(sum, frame[4]);
            assert!(t.abs() < 270.0);
        }
        Err(e) => assert_eq!(e, SensorError::ChecksumMismatch),
    }

    let mut pulses = [0u32; 40];
    for (slot, b) in pulses.iter_mut().zip(data.iter().skip(5)) {
        *slot = u32::from(*b);
    }
    let _ = decode_frame(pulses_to_frame(&pulses));
});
