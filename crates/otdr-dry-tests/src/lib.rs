// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared fixtures for OpenOTDR crates.
#![forbid(unsafe_code)]
//!
//! Builds synthetic SR-4731 trace files byte-by-byte so decoder and
//! collaborator tests do not depend on vendor sample files.
//!
//! # Modules
//!
//! - [`writer`] - Little-endian byte writer used by the builders
//! - [`sor`] - Block fixtures and the [`SorBuilder`] file assembler
//! - [`scenarios`] - Canned files (two-wavelength link, single trace, etc.)

pub mod scenarios;
pub mod sor;
pub mod writer;

pub use scenarios::{metadata_only_file, single_wavelength_file, two_wavelength_file};
pub use sor::{
    crc16_ccitt_false, DataPointsFixture, EventFixture, FixedFixture, GeneralFixture,
    KeyEventsFixture, LandmarkFixture, LayoutVersion, LinkFixture, SorBuilder, SupplierFixture,
};
pub use writer::ByteWriter;
