// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `GenParams`: cable, fiber and site identification.
//!
//! ```text
//! field                  type    rev
//! language               2 chr   1, 2
//! cable id               string  1, 2
//! fiber id               string  1, 2
//! fiber type             u16     2
//! nominal wavelength     u16     1, 2   nm
//! location A             string  1, 2
//! location B             string  1, 2
//! cable code             string  1, 2
//! build condition        2 chr   1, 2
//! user offset            i32     1, 2
//! user offset distance   i32     2
//! operator               string  1, 2
//! comment                string  1, 2
//! ```
//!
//! Every field is optional at the tail: once the block is exhausted the
//! remaining text fields are empty and numbers are zero.

use serde::{Deserialize, Serialize};

use super::{optional, optional_fixed_text, optional_text};
use crate::cursor::{Cursor, CursorError};
use crate::map::FormatVersion;

/// Cable build condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildCondition {
    /// `BC`: as built.
    AsBuilt,
    /// `CC`: as current.
    AsCurrent,
    /// `RC`: as repaired.
    AsRepaired,
    /// `OT` or anything else.
    Other,
}

impl BuildCondition {
    /// Classify a two-letter code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "BC" => Self::AsBuilt,
            "CC" => Self::AsCurrent,
            "RC" => Self::AsRepaired,
            _ => Self::Other,
        }
    }

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::AsBuilt => "as-built",
            Self::AsCurrent => "as-current",
            Self::AsRepaired => "as-repaired",
            Self::Other => "other",
        }
    }
}

/// Decoded `GenParams` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralParameters {
    /// Two-letter language code.
    pub language: String,
    /// Cable identifier.
    pub cable_id: String,
    /// Fiber identifier.
    pub fiber_id: String,
    /// ITU-T fiber type code (e.g. 652). Absent in revision 1 files.
    pub fiber_type: Option<u16>,
    /// Nominal wavelength in nm.
    pub nominal_wavelength_nm: u16,
    /// Originating location.
    pub location_a: String,
    /// Terminating location.
    pub location_b: String,
    /// Cable code.
    pub cable_code: String,
    /// Two-letter build condition code as written.
    pub build_condition: String,
    /// User offset, raw.
    pub user_offset: i32,
    /// User offset distance, raw. Zero in revision 1 files.
    pub user_offset_distance: i32,
    /// Operator name.
    pub operator: String,
    /// Free-text comment.
    pub comment: String,
}

impl GeneralParameters {
    /// Parsed build condition.
    pub fn build_condition_kind(&self) -> BuildCondition {
        BuildCondition::from_code(&self.build_condition)
    }

    /// Fiber type in the `G.652` form, or empty when absent.
    pub fn fiber_type_label(&self) -> String {
        self.fiber_type.map(|code| format!("G.{code}")).unwrap_or_default()
    }
}

pub(super) fn decode(
    cur: &mut Cursor<'_>,
    version: FormatVersion,
) -> Result<GeneralParameters, CursorError> {
    let v2 = version == FormatVersion::V2;
    let language = optional_fixed_text(cur, 2)?;
    let cable_id = optional_text(cur)?;
    let fiber_id = optional_text(cur)?;
    let fiber_type = if v2 && !cur.is_empty() {
        Some(cur.read_u16()?)
    } else {
        None
    };
    let nominal_wavelength_nm = optional(cur, |c| c.read_u16())?;
    let location_a = optional_text(cur)?;
    let location_b = optional_text(cur)?;
    let cable_code = optional_text(cur)?;
    let build_condition = optional_fixed_text(cur, 2)?;
    let user_offset = optional(cur, |c| c.read_i32())?;
    let user_offset_distance = if v2 {
        optional(cur, |c| c.read_i32())?
    } else {
        0
    };
    let operator = optional_text(cur)?;
    let comment = optional_text(cur)?;

    Ok(GeneralParameters {
        language,
        cable_id,
        fiber_id,
        fiber_type,
        nominal_wavelength_nm,
        location_a,
        location_b,
        cable_code,
        build_condition,
        user_offset,
        user_offset_distance,
        operator,
        comment,
    })
}
