// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Cksum`: the declared file checksum.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, CursorError};

/// Checksum value as written by the instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredChecksum {
    /// Declared CRC-16.
    pub value: u16,
    /// Offset of the value within the block.
    pub value_offset: usize,
}

pub(super) fn decode(cur: &mut Cursor<'_>) -> Result<DeclaredChecksum, CursorError> {
    let value_offset = cur.position();
    let value = cur.read_u16()?;
    Ok(DeclaredChecksum {
        value,
        value_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_value_and_position() {
        let mut cur = Cursor::new(&[0xAA, 0xB1, 0x29]);
        cur.skip(1).unwrap();
        let ck = decode(&mut cur).unwrap();
        assert_eq!(ck.value, 0x29B1);
        assert_eq!(ck.value_offset, 1);
    }

    #[test]
    fn empty_block_is_out_of_bounds() {
        assert!(decode(&mut Cursor::new(&[])).is_err());
    }
}
