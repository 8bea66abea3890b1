// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Directory ("Map") block reader.
//!
//! Wire format (Little-Endian):
//! ```text
//! field                 size   notes
//! marker                4      ASCII "Map\0" (revision 2 only)
//! revision              2      u16; 100..=199 for revision 1, 200.. for 2
//! map_size              4      u32; size of this directory block in bytes
//! block_count           2      u16; includes the Map block itself
//! entries               var    block_count - 1 times:
//!   id                  var      NUL-terminated name, e.g. "FxdParams\0"
//!   revision            2        u16
//!   length              4        u32; block size in bytes
//! ```
//!
//! Blocks follow the directory back to back in entry order, so the first
//! block starts at `map_size` and every later one at the running sum of the
//! lengths before it.

#![allow(clippy::cast_possible_truncation)] // offsets are checked against the buffer length first

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cursor::{Cursor, CursorError};
use crate::error::{DecodeError, DecodeErrorKind, DecodeStage};

/// Directory marker for revision 2 files.
pub const MAP_MARKER: [u8; 4] = *b"Map\0";

/// Lowest map revision accepted.
pub const MIN_MAP_REVISION: u16 = 100;

/// Revision 1 files have no marker; their leading u16 must fall in this range.
pub const V1_REVISIONS: Range<u16> = 100..200;

/// Upper bound on block identifier length while scanning for the terminator.
pub const MAX_BLOCK_ID_LEN: usize = 64;

/// File layout generation, detected from the directory header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatVersion {
    /// Revision 1.x: no `Map` marker and no per-block name headers.
    V1,
    /// Revision 2.x: `Map` marker, each block body begins with its name.
    V2,
}

/// Block identifier as written in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Wrap an identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Standard block this identifier names, if any.
    pub fn kind(&self) -> BlockKind {
        BlockKind::from_id(&self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Standard SR-4731 blocks the decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    /// `GenParams`: cable, fiber, locations, operator.
    General,
    /// `SupParams`: instrument vendor and model.
    Supplier,
    /// `FxdParams`: acquisition settings.
    Fixed,
    /// `KeyEvents`: instrument-detected events and summary.
    KeyEvents,
    /// `LnkParams`: landmarks along the link.
    Link,
    /// `DataPts`: sampled trace.
    DataPoints,
    /// `Cksum`: file checksum.
    Checksum,
    /// Vendor-specific or unrecognized block.
    Unknown,
}

impl BlockKind {
    /// Classify an identifier.
    pub fn from_id(id: &str) -> Self {
        match id {
            "GenParams" => Self::General,
            "SupParams" => Self::Supplier,
            "FxdParams" => Self::Fixed,
            "KeyEvents" => Self::KeyEvents,
            "LnkParams" => Self::Link,
            "DataPts" => Self::DataPoints,
            "Cksum" => Self::Checksum,
            _ => Self::Unknown,
        }
    }
}

/// One directory entry with its derived absolute offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDirectoryEntry {
    /// Block identifier.
    pub id: BlockId,
    /// Block revision number.
    pub revision: u16,
    /// Declared length in bytes.
    pub length: u32,
    /// Absolute start offset in the file.
    pub offset: usize,
}

impl BlockDirectoryEntry {
    /// Byte range of the block within the file.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Absolute offset one past the block's last byte.
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.length as usize)
    }
}

/// Parsed directory block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMap {
    /// Layout generation.
    pub version: FormatVersion,
    /// Map revision number (e.g. 200 for 2.00).
    pub revision: u16,
    /// Declared size of the directory block itself.
    pub map_size: u32,
    /// Entries in declared file order.
    pub entries: Vec<BlockDirectoryEntry>,
}

impl BlockMap {
    /// Absolute offset one past the last declared block.
    pub fn declared_end(&self) -> usize {
        self.entries
            .last()
            .map_or(self.map_size as usize, BlockDirectoryEntry::end)
    }
}

fn leading_bytes(bytes: &[u8]) -> [u8; 4] {
    let mut found = [0u8; 4];
    for (dst, src) in found.iter_mut().zip(bytes) {
        *dst = *src;
    }
    found
}

fn truncated(declared: u64, available: usize, offset: usize) -> DecodeError {
    DecodeError::new(
        DecodeErrorKind::TruncatedDirectory {
            declared,
            available: available as u64,
        },
        DecodeStage::Start,
        offset,
    )
}

fn read_entry(cur: &mut Cursor<'_>) -> Result<(String, u16, u32), CursorError> {
    let id = cur.read_string(MAX_BLOCK_ID_LEN)?;
    let revision = cur.read_u16()?;
    let length = cur.read_u32()?;
    Ok((id, revision, length))
}

/// Parse the directory at the start of `bytes`.
///
/// Fails with `BadMagic` when neither a revision 2 marker nor a revision 1
/// header is present, `UnsupportedRevision` for map revisions below
/// [`MIN_MAP_REVISION`], and `TruncatedDirectory` when the directory or the
/// blocks it declares do not fit in the buffer.
pub fn read_block_map(bytes: &[u8]) -> Result<BlockMap, DecodeError> {
    let mut cur = Cursor::new(bytes);

    let version = if cur.starts_with(&MAP_MARKER) {
        cur.skip(MAP_MARKER.len())
            .map_err(|_| truncated(MAP_MARKER.len() as u64, bytes.len(), 0))?;
        FormatVersion::V2
    } else {
        match cur.peek_u16() {
            Ok(rev) if V1_REVISIONS.contains(&rev) => FormatVersion::V1,
            _ => {
                return Err(DecodeError::new(
                    DecodeErrorKind::BadMagic {
                        found: leading_bytes(bytes),
                    },
                    DecodeStage::Start,
                    0,
                ))
            }
        }
    };

    let header_err = |pos: usize| truncated(pos as u64 + 8, bytes.len(), pos);
    let header_pos = cur.position();
    let revision = cur.read_u16().map_err(|_| header_err(header_pos))?;
    if revision < MIN_MAP_REVISION {
        return Err(DecodeError::new(
            DecodeErrorKind::UnsupportedRevision {
                revision,
                minimum: MIN_MAP_REVISION,
            },
            DecodeStage::Start,
            header_pos,
        ));
    }
    let map_size = cur.read_u32().map_err(|_| header_err(header_pos))?;
    let block_count = cur.read_u16().map_err(|_| header_err(header_pos))?;

    // The count includes the directory block itself.
    let declared_entries = usize::from(block_count.saturating_sub(1));
    let mut raw_entries = Vec::with_capacity(declared_entries.min(cur.remaining() / 7));
    for _ in 0..declared_entries {
        let entry_pos = cur.position();
        let (id, rev, len) = read_entry(&mut cur).map_err(|_| {
            truncated(
                u64::from(map_size).max(entry_pos as u64 + 7),
                bytes.len(),
                entry_pos,
            )
        })?;
        raw_entries.push((BlockId::new(id), rev, len));
    }

    let map_end = cur.position();
    if map_end > map_size as usize {
        return Err(truncated(map_end as u64, map_size as usize, map_end));
    }

    if map_size as usize > bytes.len() {
        return Err(truncated(u64::from(map_size), bytes.len(), map_end));
    }

    let mut offset = u64::from(map_size);
    let mut entries = Vec::with_capacity(raw_entries.len());
    for (id, revision, length) in raw_entries {
        let end = offset + u64::from(length);
        if end > bytes.len() as u64 {
            return Err(truncated(end, bytes.len(), offset as usize).at_block(&id));
        }
        entries.push(BlockDirectoryEntry {
            id,
            revision,
            length,
            offset: offset as usize,
        });
        offset = end;
    }

    if (offset as usize) < bytes.len() {
        debug!(
            trailing = bytes.len() - offset as usize,
            "bytes after last declared block ignored"
        );
    }
    debug!(
        ?version,
        revision,
        map_size,
        blocks = entries.len(),
        "read block map"
    );

    Ok(BlockMap {
        version,
        revision,
        map_size,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v2_map(entries: &[(&str, u16, u32)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (id, rev, len) in entries {
            body.extend_from_slice(id.as_bytes());
            body.push(0);
            body.extend_from_slice(&rev.to_le_bytes());
            body.extend_from_slice(&len.to_le_bytes());
        }
        let map_size = (12 + body.len()) as u32;
        let mut out = b"Map\0".to_vec();
        out.extend_from_slice(&200u16.to_le_bytes());
        out.extend_from_slice(&map_size.to_le_bytes());
        out.extend_from_slice(&((entries.len() + 1) as u16).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn offsets_are_running_sums() {
        let mut bytes = v2_map(&[("GenParams", 200, 10), ("Vendor", 3, 4), ("Cksum", 200, 8)]);
        let map_size = bytes.len();
        bytes.resize(map_size + 22, 0);
        let map = read_block_map(&bytes).unwrap();
        assert_eq!(map.version, FormatVersion::V2);
        assert_eq!(map.map_size as usize, map_size);
        let offsets: Vec<usize> = map.entries.iter().map(|e| e.offset).collect();
        assert_eq!(offsets, vec![map_size, map_size + 10, map_size + 14]);
        assert_eq!(map.entries[1].id.as_str(), "Vendor");
        assert_eq!(map.entries[1].id.kind(), BlockKind::Unknown);
        assert_eq!(map.declared_end(), bytes.len());
    }

    #[test]
    fn preserves_declared_order_including_repeats() {
        let mut bytes = v2_map(&[("DataPts", 200, 2), ("FxdParams", 200, 2), ("DataPts", 200, 2)]);
        let n = bytes.len();
        bytes.resize(n + 6, 0);
        let map = read_block_map(&bytes).unwrap();
        let ids: Vec<&str> = map.entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["DataPts", "FxdParams", "DataPts"]);
    }

    #[test]
    fn v2_header_bytes() {
        let bytes = v2_map(&[]);
        assert_eq!(hex::encode(&bytes), "4d617000c8000c0000000100");
        let map = read_block_map(&bytes).unwrap();
        assert_eq!(map.revision, 200);
        assert!(map.entries.is_empty());
        assert_eq!(map.declared_end(), 12);
    }

    #[test]
    fn zeroed_marker_is_bad_magic() {
        let mut bytes = v2_map(&[("Cksum", 200, 0)]);
        bytes[..4].fill(0);
        let err = read_block_map(&bytes).unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::BadMagic { found: [0; 4] });
        assert_eq!(err.stage, DecodeStage::Start);
    }

    #[test]
    fn empty_and_tiny_buffers_are_bad_magic() {
        assert!(matches!(
            read_block_map(&[]).unwrap_err().kind,
            DecodeErrorKind::BadMagic { .. }
        ));
        assert!(matches!(
            read_block_map(&[0x64]).unwrap_err().kind,
            DecodeErrorKind::BadMagic { found: [0x64, 0, 0, 0] }
        ));
    }

    #[test]
    fn v1_header_detected_by_revision() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&100u16.to_le_bytes());
        bytes.extend_from_slice(&(8u32 + 12).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(b"Cksum\0");
        bytes.extend_from_slice(&100u16.to_le_bytes());
        bytes.extend_from_slice(&2u32.to_le_bytes());
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let map = read_block_map(&bytes).unwrap();
        assert_eq!(map.version, FormatVersion::V1);
        assert_eq!(map.entries[0].offset, 20);
        assert_eq!(map.entries[0].range(), 20..22);
    }

    #[test]
    fn old_v2_revision_is_unsupported() {
        let mut bytes = v2_map(&[]);
        bytes[4..6].copy_from_slice(&99u16.to_le_bytes());
        let err = read_block_map(&bytes).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::UnsupportedRevision {
                revision: 99,
                minimum: 100
            }
        );
    }

    #[test]
    fn oversize_block_is_truncated_directory() {
        let mut bytes = v2_map(&[("GenParams", 200, 10), ("DataPts", 200, 1000)]);
        let n = bytes.len();
        bytes.resize(n + 10 + 20, 0);
        let err = read_block_map(&bytes).unwrap_err();
        assert_eq!(err.block.as_ref().map(BlockId::as_str), Some("DataPts"));
        assert_eq!(err.offset, n + 10);
        assert_eq!(
            err.kind,
            DecodeErrorKind::TruncatedDirectory {
                declared: (n + 1010) as u64,
                available: bytes.len() as u64,
            }
        );
    }

    #[test]
    fn huge_lengths_do_not_overflow() {
        let bytes = v2_map(&[("A", 200, u32::MAX), ("B", 200, u32::MAX)]);
        assert!(matches!(
            read_block_map(&bytes).unwrap_err().kind,
            DecodeErrorKind::TruncatedDirectory { .. }
        ));
    }

    #[test]
    fn entries_cut_short_are_truncated_directory() {
        let bytes = v2_map(&[("GenParams", 200, 0)]);
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            read_block_map(cut).unwrap_err().kind,
            DecodeErrorKind::TruncatedDirectory { .. }
        ));
    }

    #[test]
    fn entries_past_declared_map_size_are_rejected() {
        let mut bytes = v2_map(&[("GenParams", 200, 0)]);
        bytes[6..10].copy_from_slice(&12u32.to_le_bytes());
        assert!(matches!(
            read_block_map(&bytes).unwrap_err().kind,
            DecodeErrorKind::TruncatedDirectory { .. }
        ));
    }

    #[test]
    fn block_kinds_classify_standard_names() {
        assert_eq!(BlockKind::from_id("GenParams"), BlockKind::General);
        assert_eq!(BlockKind::from_id("SupParams"), BlockKind::Supplier);
        assert_eq!(BlockKind::from_id("FxdParams"), BlockKind::Fixed);
        assert_eq!(BlockKind::from_id("KeyEvents"), BlockKind::KeyEvents);
        assert_eq!(BlockKind::from_id("LnkParams"), BlockKind::Link);
        assert_eq!(BlockKind::from_id("DataPts"), BlockKind::DataPoints);
        assert_eq!(BlockKind::from_id("Cksum"), BlockKind::Checksum);
        assert_eq!(BlockKind::from_id("genparams"), BlockKind::Unknown);
    }
}
