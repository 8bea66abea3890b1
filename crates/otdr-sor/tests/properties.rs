// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests over arbitrary and generated trace files.
#![allow(missing_docs)]

use otdr_dry_tests::{DataPointsFixture, FixedFixture, SorBuilder};
use otdr_sor::{decode, read_block_map, DecodeErrorKind};
use proptest::prelude::*;

fn file_with_samples(samples: Vec<u16>, spacing: u32) -> Vec<u8> {
    let points = u32::try_from(samples.len()).unwrap_or(u32::MAX);
    SorBuilder::v2()
        .fixed(&FixedFixture {
            data_spacing: vec![spacing],
            ..FixedFixture::at_wavelength(15500, points)
        })
        .data_points(&DataPointsFixture::single(samples))
        .with_checksum()
        .build()
}

proptest! {
    #[test]
    fn fuzz_decode_no_panics(bytes in prop::collection::vec(any::<u8>(), 0..2048)) {
        // The goal is simply to ensure this does not panic.
        let _ = decode(&bytes);
    }

    #[test]
    fn fuzz_marker_then_garbage_no_panics(
        revision in any::<u16>(),
        map_size in 0u32..4096,
        count in any::<u16>(),
        tail in prop::collection::vec(any::<u8>(), 0..1024)
    ) {
        let mut data = b"Map\0".to_vec();
        data.extend_from_slice(&revision.to_le_bytes());
        data.extend_from_slice(&map_size.to_le_bytes());
        data.extend_from_slice(&count.to_le_bytes());
        data.extend_from_slice(&tail);
        let _ = decode(&data);
    }

    #[test]
    fn sample_count_matches_samples(
        samples in prop::collection::vec(any::<u16>(), 0..512),
        spacing in 1u32..1_000_000
    ) {
        let bytes = file_with_samples(samples.clone(), spacing);
        let file = decode(&bytes).unwrap();
        prop_assert_eq!(file.traces().len(), 1);
        let trace = &file.traces()[0];
        prop_assert_eq!(trace.sample_count(), trace.samples_db().len());
        prop_assert_eq!(trace.sample_count(), samples.len());
        prop_assert!(file.checksum_valid());
    }

    #[test]
    fn distance_is_monotone(
        len in 2usize..512,
        spacing in 1u32..1_000_000
    ) {
        let bytes = file_with_samples(vec![1000; len], spacing);
        let file = decode(&bytes).unwrap();
        let trace = &file.traces()[0];
        for i in 1..trace.sample_count() {
            let prev = trace.distance_m(i - 1).unwrap();
            let next = trace.distance_m(i).unwrap();
            prop_assert!(next > prev);
        }
        prop_assert!(trace.distance_m(trace.sample_count()).is_none());
    }

    #[test]
    fn decode_is_deterministic(samples in prop::collection::vec(any::<u16>(), 0..128)) {
        let bytes = file_with_samples(samples, 146_800);
        prop_assert_eq!(decode(&bytes).unwrap(), decode(&bytes).unwrap());
    }

    #[test]
    fn oversize_directory_is_truncated(extra in 1u32..100_000) {
        let mut bytes = file_with_samples(vec![1, 2, 3], 146_800);
        let map = read_block_map(&bytes).unwrap();
        // Grow the last declared length past the end of the buffer.
        let last = map.entries.last().unwrap();
        let new_len = last.length + extra;
        let id_pos = bytes
            .windows(6)
            .position(|w| w == b"Cksum\0")
            .unwrap();
        let len_pos = id_pos + 6 + 2;
        bytes[len_pos..len_pos + 4].copy_from_slice(&new_len.to_le_bytes());
        let err = decode(&bytes).unwrap_err();
        let is_truncated = matches!(err.kind, DecodeErrorKind::TruncatedDirectory { .. });
        prop_assert!(is_truncated);
    }
}
