// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Decode failures with positional context.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cursor::CursorError;
use crate::map::BlockId;

/// Decoder progress, in transition order.
///
/// A [`DecodeError`] records the stage the decoder had reached when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecodeStage {
    /// Nothing read yet.
    Start,
    /// Directory parsed; blocks not yet decoded.
    MapRead,
    /// Every block decoded in file order.
    BlocksDecoded,
    /// Traces and key events assembled.
    Assembled,
    /// Checksum compared.
    Validated,
    /// Aggregate produced.
    Done,
}

/// Fatal decode conditions.
///
/// A checksum mismatch is deliberately absent: it is reported on the
/// successful result instead (see `ChecksumStatus`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeErrorKind {
    /// The buffer does not start with a recognizable directory marker.
    #[error("bad magic: not an SR-4731 trace file (leading bytes {found:02x?})")]
    BadMagic {
        /// First four bytes of the buffer, zero padded.
        found: [u8; 4],
    },

    /// Directory entries declare more bytes than the buffer holds.
    #[error("truncated directory: {declared} bytes declared, {available} available")]
    TruncatedDirectory {
        /// Bytes the directory requires.
        declared: u64,
        /// Bytes actually present.
        available: u64,
    },

    /// A field read ran past the end of its block.
    #[error("out of bounds: need {needed} bytes, {remaining} remaining")]
    OutOfBounds {
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the block.
        remaining: usize,
    },

    /// A block revision older than the decoder understands.
    #[error("unsupported revision {revision} (minimum {minimum})")]
    UnsupportedRevision {
        /// Revision found in the file.
        revision: u16,
        /// Lowest revision accepted.
        minimum: u16,
    },

    /// Declared sample count disagrees with the data present.
    #[error("trace length mismatch: {declared} points declared, {actual} present")]
    TraceLengthMismatch {
        /// Points the header declares.
        declared: u64,
        /// Points present or available.
        actual: u64,
    },
}

/// A fatal decode failure, tagged with where it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in {} at byte {offset} (stage {stage:?})", .block.as_ref().map_or("directory", BlockId::as_str))]
pub struct DecodeError {
    /// What went wrong.
    pub kind: DecodeErrorKind,
    /// Stage the decoder had reached.
    pub stage: DecodeStage,
    /// Offending block, when the failure is block-scoped.
    pub block: Option<BlockId>,
    /// Absolute byte offset in the file.
    pub offset: usize,
}

impl DecodeError {
    /// Construct a file-scoped error.
    pub fn new(kind: DecodeErrorKind, stage: DecodeStage, offset: usize) -> Self {
        Self {
            kind,
            stage,
            block: None,
            offset,
        }
    }

    /// Attach the offending block identifier.
    #[must_use]
    pub fn at_block(mut self, id: &BlockId) -> Self {
        self.block = Some(id.clone());
        self
    }
}

/// Block-relative failure raised inside a block decoder.
///
/// The orchestrator lifts it into a [`DecodeError`] by adding the block's
/// absolute start offset and identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BlockError {
    pub(crate) kind: DecodeErrorKind,
    pub(crate) offset: usize,
}

impl BlockError {
    pub(crate) fn new(kind: DecodeErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }

    pub(crate) fn into_decode_error(
        self,
        id: &BlockId,
        block_start: usize,
        stage: DecodeStage,
    ) -> DecodeError {
        DecodeError::new(self.kind, stage, block_start.saturating_add(self.offset)).at_block(id)
    }
}

impl From<CursorError> for BlockError {
    fn from(err: CursorError) -> Self {
        let CursorError::OutOfBounds {
            offset,
            needed,
            remaining,
        } = err;
        Self::new(DecodeErrorKind::OutOfBounds { needed, remaining }, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_error_keeps_relative_offset() {
        let err: BlockError = CursorError::OutOfBounds {
            offset: 12,
            needed: 4,
            remaining: 1,
        }
        .into();
        assert_eq!(err.offset, 12);
        let lifted = err.into_decode_error(&BlockId::new("FxdParams"), 400, DecodeStage::MapRead);
        assert_eq!(lifted.offset, 412);
        assert_eq!(lifted.block.as_ref().map(BlockId::as_str), Some("FxdParams"));
        assert!(matches!(
            lifted.kind,
            DecodeErrorKind::OutOfBounds {
                needed: 4,
                remaining: 1
            }
        ));
    }

    #[test]
    fn display_names_block_and_offset() {
        let err = DecodeError::new(
            DecodeErrorKind::UnsupportedRevision {
                revision: 90,
                minimum: 100,
            },
            DecodeStage::MapRead,
            77,
        )
        .at_block(&BlockId::new("KeyEvents"));
        let msg = err.to_string();
        assert!(msg.contains("KeyEvents"), "{msg}");
        assert!(msg.contains("byte 77"), "{msg}");
        assert!(msg.contains("unsupported revision 90"), "{msg}");
    }

    #[test]
    fn display_without_block_mentions_directory() {
        let err = DecodeError::new(
            DecodeErrorKind::BadMagic { found: [0; 4] },
            DecodeStage::Start,
            0,
        );
        assert!(err.to_string().contains("directory"));
    }
}
