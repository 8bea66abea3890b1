// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Link summary: the metadata panel shown for a decoded trace file.

use otdr_sor::{OtdrFile, Trace};
use serde::{Deserialize, Serialize};

const NOT_AVAILABLE: &str = "N/A";

/// Unit used when printing link length and acquisition range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DistanceDisplay {
    /// Kilometers, three decimals.
    #[default]
    #[serde(rename = "km")]
    Kilometers,
    /// Meters, one decimal.
    #[serde(rename = "m")]
    Meters,
}

impl DistanceDisplay {
    /// Format a distance given in meters.
    pub fn format(self, meters: f64) -> String {
        match self {
            Self::Kilometers => format!("{:.3} km", meters / 1_000.0),
            Self::Meters => format!("{meters:.1} m"),
        }
    }
}

/// Where the end-to-end loss figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EndToEndLoss {
    /// Filled in by the instrument.
    Reported(f64),
    /// Computed from the first trace between the first and last event.
    Derived(f64),
    /// Not reported and no trace to derive it from.
    Unavailable,
}

impl EndToEndLoss {
    /// Loss in dB, when known.
    pub const fn value_db(self) -> Option<f64> {
        match self {
            Self::Reported(db) | Self::Derived(db) => Some(db),
            Self::Unavailable => None,
        }
    }

    /// Display label, e.g. `1.750 dB` or `1.250 dB (derived)`.
    pub fn label(self) -> String {
        match self {
            Self::Reported(db) => format!("{db:.3} dB"),
            Self::Derived(db) => format!("{db:.3} dB (derived)"),
            Self::Unavailable => NOT_AVAILABLE.to_string(),
        }
    }

    fn for_file(file: &OtdrFile) -> Self {
        let summary = &file.key_events().summary;
        if summary.reports_end_to_end_loss() {
            return Self::Reported(summary.end_to_end_loss_db);
        }
        file.trace(0)
            .and_then(|trace| derive_loss(file, trace))
            .map_or(Self::Unavailable, Self::Derived)
    }
}

/// Sample at the last event minus sample at the first. Without events the
/// whole trace is spanned.
fn derive_loss(file: &OtdrFile, trace: &Trace) -> Option<f64> {
    let events = &file.key_events().events;
    let (first, last) = match (events.first(), events.last()) {
        (Some(first), Some(last)) => (
            trace.index_at(first.distance_m)?,
            trace.index_at(last.distance_m)?,
        ),
        _ => (0, trace.sample_count().checked_sub(1)?),
    };
    Some(trace.power_db(last)? - trace.power_db(first)?)
}

/// Metadata panel for one trace file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSummary {
    /// `"{fiber}/{cable}"`.
    pub circuit_id: String,
    /// `"ITU-G.652"`, or `N/A` when the file has no fiber type.
    pub fiber_type: String,
    /// End-to-end loss and its provenance.
    pub end_to_end_loss: EndToEndLoss,
    /// Distance to the last key event, meters.
    pub length_m: Option<f64>,
    /// Group index of refraction.
    pub ior: f64,
    /// Location A.
    pub location_a: String,
    /// Location B.
    pub location_b: String,
    /// `"{supplier} {otdr} ({software}) - {serial}"`.
    pub model: String,
    /// Operator name.
    pub operator: String,
    /// First pulse width, ns.
    pub pulse_width_ns: Option<u16>,
    /// Acquisition range distance, meters.
    pub range_m: f64,
    /// Sample spacing of the first slot, meters.
    pub resolution_m: Option<f64>,
    /// Distinct trace wavelengths, nm.
    pub wavelengths_nm: Vec<f64>,
    /// Unit for length and range labels.
    pub display: DistanceDisplay,
}

impl LinkSummary {
    /// Build the panel for `file`.
    pub fn from_file(file: &OtdrFile, display: DistanceDisplay) -> Self {
        let general = file.general();
        let supplier = file.supplier();
        let fixed = file.fixed();
        let slot = fixed.primary_slot();
        let fiber_type = if general.fiber_type.is_some() {
            format!("ITU-{}", general.fiber_type_label())
        } else {
            NOT_AVAILABLE.to_string()
        };
        Self {
            circuit_id: format!("{}/{}", general.fiber_id, general.cable_id),
            fiber_type,
            end_to_end_loss: EndToEndLoss::for_file(file),
            length_m: file.key_events().events.last().map(|e| e.distance_m),
            ior: fixed.group_index,
            location_a: general.location_a.clone(),
            location_b: general.location_b.clone(),
            model: format!(
                "{} {} ({}) - {}",
                supplier.supplier,
                supplier.otdr_name,
                supplier.software_version,
                supplier.otdr_serial
            ),
            operator: general.operator.clone(),
            pulse_width_ns: slot.map(|s| s.pulse_width_ns),
            range_m: fixed.acquisition_range_distance_m(),
            resolution_m: slot.map(|s| s.resolution_m),
            wavelengths_nm: file.wavelengths(),
            display,
        }
    }

    /// Link length in the display unit.
    pub fn length_label(&self) -> String {
        self.length_m
            .map_or_else(|| NOT_AVAILABLE.to_string(), |m| self.display.format(m))
    }

    /// Acquisition range in the display unit.
    pub fn range_label(&self) -> String {
        self.display.format(self.range_m)
    }

    /// Resolution, e.g. `0.30m`.
    pub fn resolution_label(&self) -> String {
        self.resolution_m
            .map_or_else(|| NOT_AVAILABLE.to_string(), |m| format!("{m:.2}m"))
    }

    /// Pulse width, e.g. `100ns`.
    pub fn pulse_width_label(&self) -> String {
        self.pulse_width_ns
            .map_or_else(|| NOT_AVAILABLE.to_string(), |ns| format!("{ns}ns"))
    }

    /// Comma-separated wavelengths, e.g. `1310nm, 1550nm`.
    pub fn wavelengths_label(&self) -> String {
        if self.wavelengths_nm.is_empty() {
            return NOT_AVAILABLE.to_string();
        }
        self.wavelengths_nm
            .iter()
            .map(|nm| format!("{nm}nm"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Label/value rows in panel order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Circuit", self.circuit_id.clone()),
            ("Fiber type", self.fiber_type.clone()),
            ("End-to-end loss", self.end_to_end_loss.label()),
            ("Length", self.length_label()),
            ("IOR", format!("{:.6}", self.ior)),
            ("Location A", self.location_a.clone()),
            ("Location B", self.location_b.clone()),
            ("Model", self.model.clone()),
            ("Operator", self.operator.clone()),
            ("Pulse width", self.pulse_width_label()),
            ("Range", self.range_label()),
            ("Resolution", self.resolution_label()),
            ("Wavelengths", self.wavelengths_label()),
        ]
    }
}
