// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end decoding of canned trace files.
#![allow(missing_docs)]

use otdr_dry_tests::{
    metadata_only_file, single_wavelength_file, two_wavelength_file, EventFixture,
    FixedFixture, GeneralFixture, KeyEventsFixture, SorBuilder, SupplierFixture,
};
use otdr_sor::{
    decode, BlockKind, ChecksumStatus, DecodeError, DecodeErrorKind, DecodeStage, EventKind,
    FormatVersion, OtdrFile, Trace,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn two_wavelength_file_decodes_in_file_order() {
    let file = decode(&two_wavelength_file()).unwrap();

    assert_eq!(file.version(), FormatVersion::V2);
    assert_eq!(file.map_revision(), 200);
    assert_eq!(file.traces().len(), 2);
    assert!(close(file.traces()[0].wavelength_nm(), 1310.0));
    assert!(close(file.traces()[1].wavelength_nm(), 1550.0));
    assert_eq!(file.traces()[0].sample_count(), 64);
    assert_eq!(file.key_events().summary.count, 5);
    assert_eq!(file.key_events().len(), 5);
    assert!(file.checksum_valid());

    assert_eq!(file.general().cable_id, "CABLE-07");
    assert_eq!(file.supplier().supplier, "Acme Photonics");
    assert!(close(file.key_events().summary.end_to_end_loss_db, 1.75));
    assert_eq!(file.link().map(|l| l.landmarks.len()), Some(1));
}

#[test]
fn samples_use_declared_scale() {
    let file = decode(&two_wavelength_file()).unwrap();
    let t1310 = &file.traces()[0];
    // linear(64, 2000, 35) at scale 1000.
    assert!(close(t1310.power_db(0).unwrap(), 2.0));
    assert!(close(t1310.power_db(10).unwrap(), 2.35));
    let t1550 = &file.traces()[1];
    assert!(close(t1550.power_db(63).unwrap(), 1.5 + 63.0 * 0.02));
}

#[test]
fn event_distances_are_meters() {
    let file = decode(&two_wavelength_file()).unwrap();
    let events = &file.key_events().events;
    // 50000 x 100 ps at n = 1.468.
    assert!(close(events[1].distance_m, 50_000.0 * 1e-4 * 299.792_458 / 1.468));
    assert_eq!(events[0].kind, EventKind::Reflective);
    assert_eq!(events[1].kind, EventKind::NonReflective);
    assert_eq!(events[4].kind, EventKind::EndOfFiber);
    let numbers: Vec<u16> = events.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert!(close(events[4].cumulative_loss_db, 0.25 + 0.08 + 0.12 + 0.3));
}

#[test]
fn zeroed_magic_is_bad_magic() {
    let mut bytes = two_wavelength_file();
    bytes[..4].fill(0);
    let err = decode(&bytes).unwrap_err();
    assert_eq!(err.kind, DecodeErrorKind::BadMagic { found: [0; 4] });
    assert_eq!(err.stage, DecodeStage::Start);
    assert!(err.block.is_none());
}

#[test]
fn flipped_checksum_byte_is_advisory() {
    let mut bytes = two_wavelength_file();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xFF;
    let file = decode(&bytes).unwrap();
    assert!(!file.checksum_valid());
    assert!(matches!(file.checksum(), ChecksumStatus::Mismatch { .. }));
    assert_eq!(file.traces().len(), 2);
}

#[test]
fn flipped_payload_byte_is_a_mismatch() {
    let mut bytes = two_wavelength_file();
    // Last sample of the second trace, well inside the checksummed range.
    let at = bytes.len() - 2 - "Cksum\0".len() - 1;
    bytes[at] ^= 0x01;
    let file = decode(&bytes).unwrap();
    assert!(!file.checksum_valid());
}

#[test]
fn vendor_block_preserved_byte_for_byte() {
    let bytes = two_wavelength_file();
    let file = decode(&bytes).unwrap();
    assert_eq!(file.opaque_blocks().len(), 1);
    let vendor = &file.opaque_blocks()[0];
    assert_eq!(vendor.id.as_str(), "AcmeTrace");
    assert_eq!(vendor.revision, 105);
    assert_eq!(vendor.bytes, b"\x01\x02vendor\x00\xff");
    assert_eq!(
        &bytes[vendor.offset..vendor.offset + vendor.bytes.len()],
        vendor.bytes.as_slice()
    );
    let entry = &file.directory()[3];
    assert_eq!(entry.id.kind(), BlockKind::Unknown);
    assert_eq!(entry.offset, vendor.offset);
}

#[test]
fn directory_past_buffer_is_truncated() {
    let bytes = two_wavelength_file();
    let err = decode(&bytes[..bytes.len() - 10]).unwrap_err();
    assert!(matches!(
        err.kind,
        DecodeErrorKind::TruncatedDirectory { .. }
    ));
    assert_eq!(err.block.as_ref().map(|b| b.as_str()), Some("DataPts"));
}

#[test]
fn old_block_revision_is_unsupported() {
    let bytes = SorBuilder::v2()
        .general(&GeneralFixture::default())
        .fixed(&FixedFixture::default())
        .revision(42)
        .build();
    let err = decode(&bytes).unwrap_err();
    assert_eq!(
        err.kind,
        DecodeErrorKind::UnsupportedRevision {
            revision: 42,
            minimum: 100
        }
    );
    assert_eq!(err.block.as_ref().map(|b| b.as_str()), Some("FxdParams"));
}

#[test]
fn old_map_revision_is_unsupported() {
    let bytes = SorBuilder::v2().map_revision(50).build();
    assert!(matches!(
        decode(&bytes).unwrap_err().kind,
        DecodeErrorKind::UnsupportedRevision { revision: 50, .. }
    ));
}

#[test]
fn v1_file_decodes() {
    let bytes = SorBuilder::v1()
        .general(&GeneralFixture::default())
        .supplier(&SupplierFixture::default())
        .fixed(&FixedFixture::at_wavelength(13100, 8))
        .key_events(&KeyEventsFixture {
            events: vec![EventFixture::end_of_fiber(1, 1_000)],
            ..KeyEventsFixture::default()
        })
        .data_points(&otdr_dry_tests::DataPointsFixture::linear(8, 100, 1))
        .with_checksum()
        .build();
    let file = decode(&bytes).unwrap();
    assert_eq!(file.version(), FormatVersion::V1);
    assert_eq!(file.general().fiber_type, None);
    assert_eq!(file.traces().len(), 1);
    assert!(file.key_events().events[0].markers.is_none());
    assert!(file.checksum_valid());
}

#[test]
fn metadata_only_file_has_no_traces() {
    let file = decode(&metadata_only_file()).unwrap();
    assert!(file.traces().is_empty());
    assert!(file.key_events().is_empty());
    assert_eq!(file.general().operator, "A. Splicer");
    assert!(file.checksum_valid());
}

#[test]
fn unreported_loss_keeps_samples_for_derivation() {
    let file = decode(&single_wavelength_file()).unwrap();
    assert!(!file.key_events().summary.reports_end_to_end_loss());
    let trace = &file.traces()[0];
    let events = &file.key_events().events;
    let first = trace.index_at(events[0].distance_m).unwrap();
    let last = trace.index_at(events[events.len() - 1].distance_m).unwrap();
    assert_eq!((first, last), (0, 50));
    let derived = trace.power_db(last).unwrap() - trace.power_db(first).unwrap();
    assert!(close(derived, 1.25));
}

#[test]
fn decoding_is_deterministic() {
    let bytes = two_wavelength_file();
    assert_eq!(decode(&bytes).unwrap(), decode(&bytes).unwrap());
}

#[test]
fn aggregate_serializes_to_json() {
    let file = decode(&two_wavelength_file()).unwrap();
    let json = serde_json::to_value(&file).unwrap();
    assert_eq!(json["general"]["cable_id"], "CABLE-07");
    assert_eq!(json["opaque_blocks"][0]["id"], "AcmeTrace");
}

#[test]
fn decoded_values_cross_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<OtdrFile>();
    assert_send_sync::<Trace>();
    assert_send_sync::<DecodeError>();

    let file = std::sync::Arc::new(decode(&two_wavelength_file()).unwrap());
    let shared = std::sync::Arc::clone(&file);
    let traces = std::thread::spawn(move || shared.traces().len()).join().unwrap();
    assert_eq!(traces, 2);
    assert_eq!(file.traces()[0].declared_sample_count(), 64);
}
