// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Canned trace files shared across test suites.

use crate::sor::{
    DataPointsFixture, EventFixture, FixedFixture, GeneralFixture, KeyEventsFixture,
    LandmarkFixture, LinkFixture, SorBuilder, SupplierFixture,
};

/// Points per trace in the canned files.
pub const SCENARIO_POINTS: u16 = 64;

/// Five events along a short link, the last one being the fiber end.
pub fn five_events() -> Vec<EventFixture> {
    vec![
        EventFixture::connector(1, 0, 250),
        EventFixture::splice(2, 50_000, 80),
        EventFixture::splice(3, 100_000, 120),
        EventFixture::connector(4, 150_000, 300),
        EventFixture::end_of_fiber(5, 200_000),
    ]
}

/// A V2 file with 1310 nm and 1550 nm acquisitions, five key events, a
/// vendor block between known blocks and a correct checksum.
pub fn two_wavelength_file() -> Vec<u8> {
    SorBuilder::v2()
        .general(&GeneralFixture::default())
        .supplier(&SupplierFixture::default())
        .fixed(&FixedFixture::at_wavelength(13100, u32::from(SCENARIO_POINTS)))
        .raw_block("AcmeTrace", 105, b"\x01\x02vendor\x00\xff".to_vec())
        .fixed(&FixedFixture::at_wavelength(15500, u32::from(SCENARIO_POINTS)))
        .key_events(&KeyEventsFixture {
            events: five_events(),
            total_loss: 1_750,
            orl: 38_500,
            ..KeyEventsFixture::default()
        })
        .link(&LinkFixture {
            landmarks: vec![LandmarkFixture::default()],
        })
        .data_points(&DataPointsFixture::linear(SCENARIO_POINTS, 2_000, 35))
        .data_points(&DataPointsFixture::linear(SCENARIO_POINTS, 1_500, 20))
        .with_checksum()
        .build()
}

/// A V2 single-wavelength file whose summary reports zero end-to-end loss.
///
/// The end event sits at 741 x 100 ps, which with the default group index
/// and spacing lands between samples 50 and 51.
pub fn single_wavelength_file() -> Vec<u8> {
    SorBuilder::v2()
        .general(&GeneralFixture::default())
        .supplier(&SupplierFixture::default())
        .fixed(&FixedFixture::at_wavelength(15500, u32::from(SCENARIO_POINTS)))
        .key_events(&KeyEventsFixture {
            events: vec![
                EventFixture::connector(1, 0, 200),
                EventFixture::end_of_fiber(2, 741),
            ],
            total_loss: 0,
            ..KeyEventsFixture::default()
        })
        .data_points(&DataPointsFixture::linear(SCENARIO_POINTS, 1_000, 25))
        .with_checksum()
        .build()
}

/// A V1 file carrying only general and supplier parameters.
pub fn metadata_only_file() -> Vec<u8> {
    SorBuilder::v1()
        .general(&GeneralFixture::default())
        .supplier(&SupplierFixture::default())
        .with_checksum()
        .build()
}
