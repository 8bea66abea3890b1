// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-block decoders and the tagged [`Block`] result.
//!
//! Each decoder sees only the slice the directory assigned to its block, so
//! a malformed block can never read into its neighbours. Offsets in the
//! errors raised here are relative to that slice; the orchestrator adds the
//! block's absolute start.

mod checksum;
mod data_points;
mod events;
mod fixed;
mod general;
mod link;
mod supplier;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cursor::{Cursor, CursorError};
use crate::error::{BlockError, DecodeErrorKind};
use crate::map::{BlockDirectoryEntry, BlockId, BlockKind, FormatVersion};

pub use checksum::DeclaredChecksum;
pub use data_points::{DataPoints, DataSegment};
pub use events::{
    EventKind, EventMarkers, KeyEvent, KeyEventBlock, KeyEventRecord, KeyEventSummary, KeyEvents,
};
pub use fixed::{AcquisitionSlot, DistanceUnit, FixedParameters, SPEED_OF_LIGHT_M_PER_US};
pub use general::{BuildCondition, GeneralParameters};
pub use link::{Landmark, LinkParameters};
pub use supplier::SupplierParameters;

/// Lowest block revision the standard decoders accept.
pub const MIN_BLOCK_REVISION: u16 = 100;

/// A block that was not decoded, kept byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueBlock {
    /// Identifier from the directory.
    pub id: BlockId,
    /// Revision from the directory.
    pub revision: u16,
    /// Absolute start offset in the file.
    pub offset: usize,
    /// The block's bytes exactly as they appear in the file.
    pub bytes: Vec<u8>,
}

/// One decoded block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Block {
    /// `GenParams`.
    General(GeneralParameters),
    /// `SupParams`.
    Supplier(SupplierParameters),
    /// `FxdParams`.
    Fixed(FixedParameters),
    /// `KeyEvents`, still in raw time units.
    KeyEvents(KeyEventBlock),
    /// `LnkParams`.
    Link(LinkParameters),
    /// `DataPts`.
    DataPoints(DataPoints),
    /// `Cksum`.
    Checksum(DeclaredChecksum),
    /// Vendor or unrecognized block.
    Opaque(OpaqueBlock),
}

impl Block {
    /// Short name of the variant, for logs and tables.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::General(_) => "general",
            Self::Supplier(_) => "supplier",
            Self::Fixed(_) => "fixed",
            Self::KeyEvents(_) => "key-events",
            Self::Link(_) => "link",
            Self::DataPoints(_) => "data-points",
            Self::Checksum(_) => "checksum",
            Self::Opaque(_) => "opaque",
        }
    }
}

/// Decode one block from its slice.
///
/// Unknown identifiers always succeed as [`Block::Opaque`].
pub(crate) fn decode_block(
    entry: &BlockDirectoryEntry,
    body: &[u8],
    version: FormatVersion,
) -> Result<Block, BlockError> {
    let kind = entry.id.kind();
    if kind == BlockKind::Unknown {
        return Ok(opaque(entry, body));
    }

    if entry.revision < MIN_BLOCK_REVISION {
        return Err(BlockError::new(
            DecodeErrorKind::UnsupportedRevision {
                revision: entry.revision,
                minimum: MIN_BLOCK_REVISION,
            },
            0,
        ));
    }

    let mut cur = Cursor::new(body);
    if version == FormatVersion::V2 {
        skip_name_header(&mut cur, &entry.id);
    }

    let block = match kind {
        BlockKind::General => Block::General(general::decode(&mut cur, version)?),
        BlockKind::Supplier => Block::Supplier(supplier::decode(&mut cur)?),
        BlockKind::Fixed => Block::Fixed(fixed::decode(&mut cur, version)?),
        BlockKind::KeyEvents => Block::KeyEvents(events::decode(&mut cur, version)?),
        BlockKind::Link => Block::Link(link::decode(&mut cur)?),
        BlockKind::DataPoints => Block::DataPoints(data_points::decode(&mut cur)?),
        BlockKind::Checksum => Block::Checksum(checksum::decode(&mut cur)?),
        BlockKind::Unknown => opaque(entry, body),
    };
    Ok(block)
}

fn opaque(entry: &BlockDirectoryEntry, body: &[u8]) -> Block {
    Block::Opaque(OpaqueBlock {
        id: entry.id.clone(),
        revision: entry.revision,
        offset: entry.offset,
        bytes: body.to_vec(),
    })
}

/// Skip the `"<id>\0"` header that opens every revision 2 block body.
fn skip_name_header(cur: &mut Cursor<'_>, id: &BlockId) {
    let name = id.as_str().as_bytes();
    let header_len = name.len() + 1;
    let matches = cur.rest().get(..header_len).is_some_and(|head| {
        head.get(..name.len()) == Some(name) && head.last() == Some(&0)
    });
    if !matches || cur.skip(header_len).is_err() {
        warn!(block = %id, "block name header missing or mismatched; decoding from block start");
    }
}

/// NUL-terminated text bounded by the block end; empty once the block is exhausted.
pub(crate) fn optional_text(cur: &mut Cursor<'_>) -> Result<String, CursorError> {
    if cur.is_empty() {
        return Ok(String::new());
    }
    let limit = cur.remaining();
    cur.read_string(limit)
}

/// Fixed-width text; empty once the block is exhausted.
pub(crate) fn optional_fixed_text(
    cur: &mut Cursor<'_>,
    width: usize,
) -> Result<String, CursorError> {
    if cur.is_empty() {
        Ok(String::new())
    } else {
        cur.read_fixed_str(width)
    }
}

/// Apply `read` unless the block is exhausted, in which case yield the default.
pub(crate) fn optional<'a, T: Default>(
    cur: &mut Cursor<'a>,
    read: impl FnOnce(&mut Cursor<'a>) -> Result<T, CursorError>,
) -> Result<T, CursorError> {
    if cur.is_empty() {
        Ok(T::default())
    } else {
        read(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, revision: u16, len: usize) -> BlockDirectoryEntry {
        BlockDirectoryEntry {
            id: BlockId::new(id),
            revision,
            length: u32::try_from(len).unwrap(),
            offset: 1000,
        }
    }

    #[test]
    fn unknown_block_is_kept_verbatim() {
        let body = b"JDSU\0\x01\x02\x03";
        let block = decode_block(&entry("JDSUEvenementsMTS", 3, body.len()), body, FormatVersion::V2)
            .unwrap();
        let Block::Opaque(opaque) = &block else {
            unreachable!("expected opaque, got {}", block.label());
        };
        assert_eq!(opaque.bytes, body);
        assert_eq!(opaque.offset, 1000);
        assert_eq!(opaque.revision, 3);
    }

    #[test]
    fn known_block_below_minimum_revision_fails() {
        let err = decode_block(&entry("Cksum", 99, 2), &[0, 0], FormatVersion::V1).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::UnsupportedRevision {
                revision: 99,
                minimum: 100
            }
        );
    }

    #[test]
    fn v2_header_skipped_when_present() {
        let body = b"Cksum\0\x34\x12";
        let block = decode_block(&entry("Cksum", 200, body.len()), body, FormatVersion::V2).unwrap();
        assert_eq!(
            block,
            Block::Checksum(DeclaredChecksum {
                value: 0x1234,
                value_offset: 6
            })
        );
    }

    #[test]
    fn v2_mismatched_header_decodes_from_start() {
        let body = [0x34, 0x12];
        let block = decode_block(&entry("Cksum", 200, 2), &body, FormatVersion::V2).unwrap();
        assert_eq!(
            block,
            Block::Checksum(DeclaredChecksum {
                value: 0x1234,
                value_offset: 0
            })
        );
    }

    #[test]
    fn optional_helpers_default_when_exhausted() {
        let mut cur = Cursor::new(&[]);
        assert_eq!(optional_text(&mut cur).unwrap(), "");
        assert_eq!(optional_fixed_text(&mut cur, 2).unwrap(), "");
        assert_eq!(optional(&mut cur, |c| c.read_u16()).unwrap(), 0);
    }
}
