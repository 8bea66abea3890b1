// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decoder for Bellcore/Telcordia SR-4731 OTDR trace files (`.sor`, `.sod`).
//!
//! A trace file is a directory ("Map") block followed by the blocks it
//! lists, back to back:
//!
//! | block       | contents                                        |
//! |-------------|-------------------------------------------------|
//! | `Map`       | revision, own size, block ids/revisions/lengths |
//! | `GenParams` | cable, fiber, locations, operator               |
//! | `SupParams` | instrument vendor, model, serials               |
//! | `FxdParams` | wavelength, pulse widths, spacing, group index  |
//! | `KeyEvents` | detected events and end-to-end summary          |
//! | `LnkParams` | landmarks (optional)                            |
//! | `DataPts`   | sampled power, fixed-point                      |
//! | vendor      | anything else, kept verbatim                    |
//! | `Cksum`     | CRC-16 over the preceding bytes                 |
//!
//! All integers are little-endian. Revision 2 files start with `"Map\0"`
//! and repeat each block's name at the start of its body; revision 1 files
//! have neither.
//!
//! ```
//! let bytes = otdr_dry_tests::two_wavelength_file();
//! let file = otdr_sor::decode(&bytes)?;
//! assert_eq!(file.traces().len(), 2);
//! assert!(file.checksum_valid());
//! # Ok::<(), otdr_sor::DecodeError>(())
//! ```

pub mod blocks;
pub mod cursor;
mod decode;
mod error;
pub mod integrity;
pub mod map;
mod trace;

pub use blocks::{
    AcquisitionSlot, Block, BuildCondition, DataPoints, DataSegment, DeclaredChecksum,
    DistanceUnit, EventKind, EventMarkers, FixedParameters, GeneralParameters, KeyEvent,
    KeyEventSummary, KeyEvents, Landmark, LinkParameters, OpaqueBlock, SupplierParameters,
};
pub use cursor::{Cursor, CursorError, Scale};
pub use decode::{decode, OtdrFile};
pub use error::{DecodeError, DecodeErrorKind, DecodeStage};
pub use integrity::ChecksumStatus;
pub use map::{read_block_map, BlockDirectoryEntry, BlockId, BlockKind, BlockMap, FormatVersion};
pub use trace::{assemble_traces, Trace};
