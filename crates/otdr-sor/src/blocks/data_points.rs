// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `DataPts`: the sampled trace.
//!
//! ```text
//! total points                   u32
//! segment count                  u16
//! per segment:
//!   points                       u32
//!   scale factor                 u16      /1000
//!   samples                      points x u16   /1000 dB
//! ```
//!
//! A sample's power is `raw / 1000 * scale / 1000` dB, using the scale of
//! the segment it belongs to.

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, Scale};
use crate::error::{BlockError, DecodeErrorKind};

/// Header of one scale-factor segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSegment {
    /// Points in this segment.
    pub point_count: u32,
    /// Scale factor, thousandths.
    pub scale_factor: u16,
}

impl DataSegment {
    /// Scale factor as a multiplier.
    pub fn multiplier(&self) -> f64 {
        Scale::THOUSANDTHS.apply(f64::from(self.scale_factor))
    }
}

/// Decoded `DataPts` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataPoints {
    /// Total points declared in the block header.
    pub declared_points: u32,
    /// Segment headers in file order.
    pub segments: Vec<DataSegment>,
    /// Samples in dB, every segment's scale applied.
    pub samples_db: Vec<f64>,
}

fn mismatch(declared: u64, actual: u64, offset: usize) -> BlockError {
    BlockError::new(
        DecodeErrorKind::TraceLengthMismatch { declared, actual },
        offset,
    )
}

pub(super) fn decode(cur: &mut Cursor<'_>) -> Result<DataPoints, BlockError> {
    let declared_points = cur.read_u32()?;
    let segment_count = cur.read_u16()?;

    let mut segments = Vec::with_capacity(usize::from(segment_count).min(cur.remaining() / 6));
    let mut samples_db =
        Vec::with_capacity((declared_points as usize).min(cur.remaining() / 2));
    let mut present: u64 = 0;

    for _ in 0..segment_count {
        let segment = DataSegment {
            point_count: cur.read_u32()?,
            scale_factor: cur.read_u16()?,
        };
        let available = cur.remaining() / 2;
        if u64::from(segment.point_count) > available as u64 {
            return Err(mismatch(
                u64::from(segment.point_count),
                available as u64,
                cur.position(),
            ));
        }
        let multiplier = segment.multiplier();
        for _ in 0..segment.point_count {
            let raw = cur.read_fixed_u16(Scale::THOUSANDTHS)?;
            samples_db.push(raw * multiplier);
        }
        present += u64::from(segment.point_count);
        segments.push(segment);
    }

    if present != u64::from(declared_points) {
        return Err(mismatch(
            u64::from(declared_points),
            present,
            cur.position(),
        ));
    }

    Ok(DataPoints {
        declared_points,
        segments,
        samples_db,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use otdr_dry_tests::DataPointsFixture;

    #[test]
    fn single_segment_scaled_to_db() {
        let body = DataPointsFixture::single(vec![0, 1000, 25_500]).body();
        let dp = decode(&mut Cursor::new(&body)).unwrap();
        assert_eq!(dp.declared_points, 3);
        assert_eq!(dp.samples_db, vec![0.0, 1.0, 25.5]);
    }

    #[test]
    fn each_segment_uses_its_own_scale() {
        let body = DataPointsFixture {
            segments: vec![(1000, vec![2000, 4000]), (500, vec![2000])],
            declared_total: None,
        }
        .body();
        let dp = decode(&mut Cursor::new(&body)).unwrap();
        assert_eq!(dp.segments.len(), 2);
        assert_eq!(dp.samples_db, vec![2.0, 4.0, 1.0]);
    }

    #[test]
    fn declared_total_must_match_segments() {
        let body = DataPointsFixture {
            declared_total: Some(5),
            ..DataPointsFixture::single(vec![1, 2, 3])
        }
        .body();
        let err = decode(&mut Cursor::new(&body)).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::TraceLengthMismatch {
                declared: 5,
                actual: 3
            }
        );
    }

    #[test]
    fn samples_past_block_end_are_a_length_mismatch() {
        let body = DataPointsFixture::single(vec![7; 10]).body();
        let cut = &body[..body.len() - 4];
        let err = decode(&mut Cursor::new(cut)).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::TraceLengthMismatch {
                declared: 10,
                actual: 8
            }
        );
        assert_eq!(err.offset, 12);
    }

    #[test]
    fn empty_trace_is_allowed() {
        let body = DataPointsFixture::default().body();
        let dp = decode(&mut Cursor::new(&body)).unwrap();
        assert!(dp.samples_db.is_empty());
        assert_eq!(dp.declared_points, 0);
    }

    #[test]
    fn truncated_header_is_out_of_bounds() {
        let err = decode(&mut Cursor::new(&[1, 0, 0])).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::OutOfBounds { .. }));
    }
}
