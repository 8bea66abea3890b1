// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `SupParams`: seven NUL-terminated strings, same layout in both revisions.

use serde::{Deserialize, Serialize};

use super::optional_text;
use crate::cursor::{Cursor, CursorError};

/// Decoded `SupParams` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierParameters {
    /// Instrument vendor.
    pub supplier: String,
    /// OTDR mainframe name.
    pub otdr_name: String,
    /// OTDR serial number.
    pub otdr_serial: String,
    /// Optical module name.
    pub module_name: String,
    /// Optical module serial number.
    pub module_serial: String,
    /// Software version.
    pub software_version: String,
    /// Other free text.
    pub other: String,
}

pub(super) fn decode(cur: &mut Cursor<'_>) -> Result<SupplierParameters, CursorError> {
    Ok(SupplierParameters {
        supplier: optional_text(cur)?,
        otdr_name: optional_text(cur)?,
        otdr_serial: optional_text(cur)?,
        module_name: optional_text(cur)?,
        module_serial: optional_text(cur)?,
        software_version: optional_text(cur)?,
        other: optional_text(cur)?,
    })
}
