//! Property tests for volume scaling and frame splitting.

use avrlib_iscp::protocol::{DELIMITER, Frame, FrameDecoder};
use avrlib_iscp::volume::VolumeScaler;
use proptest::prelude::*;

/// A valid raw range with `min < max`.
fn raw_range() -> impl Strategy<Value = (u32, u32)> {
    (0u32..200, 1u32..200).prop_map(|(min, span)| (min, min + span))
}

// ── Volume scaler ─────────────────────────────────────────────

proptest! {
    #[test]
    fn raw_round_trips_within_one_step(
        (min, max) in raw_range(),
        offset in 0u32..200,
    ) {
        let scaler = VolumeScaler::new(min, max).unwrap();
        let raw = min + offset % (max - min + 1);
        let back = scaler.percent_to_raw(scaler.raw_to_percent(raw));
        prop_assert!(
            back.abs_diff(raw) <= 1,
            "raw {raw} came back as {back} for range {min}..{max}"
        );
    }

    #[test]
    fn raw_to_percent_is_monotonic(
        (min, max) in raw_range(),
        a in 0u32..500,
        b in 0u32..500,
    ) {
        let scaler = VolumeScaler::new(min, max).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scaler.raw_to_percent(lo) <= scaler.raw_to_percent(hi));
    }

    #[test]
    fn percent_always_maps_into_range(
        (min, max) in raw_range(),
        percent in -1000.0f64..1000.0,
    ) {
        let scaler = VolumeScaler::new(min, max).unwrap();
        let raw = scaler.percent_to_raw(percent);
        prop_assert!((min..=max).contains(&raw));
        let back = scaler.raw_to_percent(raw);
        prop_assert!((0.0..=100.0).contains(&back));
    }
}

// ── Frame decoder ─────────────────────────────────────────────

/// Frame bodies: anything but the delimiter.
fn frame_body() -> impl Strategy<Value = Vec<u8>> {
    let byte = any::<u8>().prop_filter("no delimiter", |b| *b != DELIMITER);
    proptest::collection::vec(byte, 0..40)
}

proptest! {
    #[test]
    fn frames_recovered_in_order_regardless_of_chunking(
        bodies in proptest::collection::vec(frame_body(), 1..8),
        chunk in 1usize..16,
    ) {
        let mut stream = Vec::new();
        for body in &bodies {
            stream.extend_from_slice(body);
            stream.push(DELIMITER);
        }

        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for piece in stream.chunks(chunk) {
            decoder.extend(piece);
            frames.extend(decoder.frames());
        }

        let expected: Vec<Frame> = bodies.into_iter().map(Frame::new).collect();
        prop_assert_eq!(frames, expected);
        prop_assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn parse_never_panics(raw in proptest::collection::vec(any::<u8>(), 0..64)) {
        let _ = Frame::new(raw).parse();
    }
}
