// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `LnkParams`: landmarks along the link.

use serde::{Deserialize, Serialize};

use super::optional_text;
use crate::cursor::{Cursor, CursorError, Scale};

const MIN_LANDMARK_LEN: usize = 2 + 2 + 4 + 2 + 4 + 4 + 2 + 4 + 4 + 2 + 2;

/// One landmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    /// Landmark number.
    pub number: u16,
    /// Two-letter landmark code (e.g. `MH` for manhole).
    pub code: String,
    /// Location, raw time units.
    pub location: i32,
    /// Related key event number.
    pub event_number: u16,
    /// GPS longitude, degrees.
    pub longitude_deg: f64,
    /// GPS latitude, degrees.
    pub latitude_deg: f64,
    /// Fiber correction factor, raw.
    pub fiber_correction: i16,
    /// Sheath marker entering the landmark.
    pub sheath_marker_in: i32,
    /// Sheath marker leaving the landmark.
    pub sheath_marker_out: i32,
    /// Two-letter unit code of the sheath markers.
    pub sheath_marker_units: String,
    /// Mode field diameter, raw.
    pub mode_field_diameter: i16,
    /// Comment.
    pub comment: String,
}

/// Decoded `LnkParams` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkParameters {
    /// Landmarks in file order.
    pub landmarks: Vec<Landmark>,
}

fn decode_landmark(cur: &mut Cursor<'_>) -> Result<Landmark, CursorError> {
    Ok(Landmark {
        number: cur.read_u16()?,
        code: cur.read_fixed_str(2)?,
        location: cur.read_i32()?,
        event_number: cur.read_u16()?,
        longitude_deg: cur.read_fixed_i32(Scale::MILLIONTHS)?,
        latitude_deg: cur.read_fixed_i32(Scale::MILLIONTHS)?,
        fiber_correction: cur.read_i16()?,
        sheath_marker_in: cur.read_i32()?,
        sheath_marker_out: cur.read_i32()?,
        sheath_marker_units: cur.read_fixed_str(2)?,
        mode_field_diameter: cur.read_i16()?,
        comment: optional_text(cur)?,
    })
}

pub(super) fn decode(cur: &mut Cursor<'_>) -> Result<LinkParameters, CursorError> {
    let count = cur.read_u16()?;
    let mut landmarks =
        Vec::with_capacity(usize::from(count).min(cur.remaining() / MIN_LANDMARK_LEN));
    for _ in 0..count {
        landmarks.push(decode_landmark(cur)?);
    }
    Ok(LinkParameters { landmarks })
}
