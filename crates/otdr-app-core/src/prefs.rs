// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Saved preferences for trace inspection tools.

use serde::{Deserialize, Serialize};

use crate::summary::DistanceDisplay;

/// Config key the preferences are stored under.
pub const PREFS_KEY: &str = "inspector";

/// Saved preferences for an inspection surface.
///
/// Missing fields fall back to their defaults so older config files keep
/// loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InspectorPrefs {
    /// Chart and trace export settings.
    pub chart: ChartPrefs,
    /// Summary display settings.
    pub display: DisplayPrefs,
}

/// Chart and trace export settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartPrefs {
    /// Plot every n-th sample.
    pub stride: usize,
    /// Output format for exported traces.
    pub trace_format: TraceFormat,
}

impl Default for ChartPrefs {
    fn default() -> Self {
        Self {
            stride: 10,
            trace_format: TraceFormat::Csv,
        }
    }
}

/// Summary display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPrefs {
    /// Unit for link length and range.
    pub length_unit: DistanceDisplay,
    /// Surface checksum mismatches as warnings.
    pub warn_on_checksum_mismatch: bool,
}

impl Default for DisplayPrefs {
    fn default() -> Self {
        Self {
            length_unit: DistanceDisplay::Kilometers,
            warn_on_checksum_mismatch: true,
        }
    }
}

/// Delimited text format for exported trace samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceFormat {
    /// Comma separated.
    #[default]
    Csv,
    /// Tab separated.
    Tsv,
}

impl TraceFormat {
    /// Field separator.
    pub const fn separator(self) -> char {
        match self {
            Self::Csv => ',',
            Self::Tsv => '\t',
        }
    }
}
