// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! File checksum recomputation.
//!
//! SR-4731 files carry a CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF, no
//! reflection, no final xor) over every byte that precedes the declared
//! value. A mismatch never fails the decode.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Outcome of comparing the declared checksum with the recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChecksumStatus {
    /// Declared and computed values agree.
    Valid {
        /// The checksum.
        value: u16,
    },
    /// Declared and computed values differ.
    Mismatch {
        /// Value stored in the file.
        declared: u16,
        /// Value computed over the file.
        computed: u16,
    },
    /// The file has no `Cksum` block.
    Absent,
}

impl ChecksumStatus {
    /// True only for [`ChecksumStatus::Valid`].
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Short label for tables.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::Mismatch { .. } => "mismatch",
            Self::Absent => "absent",
        }
    }
}

const POLY: u16 = 0x1021;

/// CRC-16/CCITT-FALSE of `data`.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    data.iter().fold(0xFFFF_u16, |crc, &byte| {
        (0..8).fold(crc ^ (u16::from(byte) << 8), |crc, _| {
            if crc & 0x8000 == 0 {
                crc << 1
            } else {
                (crc << 1) ^ POLY
            }
        })
    })
}

/// Compare `declared` with the CRC of `bytes[..value_offset]`.
///
/// `value_offset` is the absolute position of the declared value; an offset
/// past the buffer end is clamped.
pub fn validate(bytes: &[u8], value_offset: usize, declared: u16) -> ChecksumStatus {
    let covered = bytes.get(..value_offset).unwrap_or(bytes);
    let computed = crc16_ccitt_false(covered);
    if computed == declared {
        ChecksumStatus::Valid { value: computed }
    } else {
        warn!(
            declared = format_args!("{declared:#06x}"),
            computed = format_args!("{computed:#06x}"),
            "checksum mismatch"
        );
        ChecksumStatus::Mismatch { declared, computed }
    }
}
