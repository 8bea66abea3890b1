// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Distance-addressable traces built from `FxdParams` slots and `DataPts` blocks.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::blocks::{AcquisitionSlot, DataPoints, FixedParameters};

/// One sampled power trace at one wavelength.
///
/// Distances are not stored; [`Trace::distance_m`] derives them from the
/// slot resolution on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    wavelength_nm: f64,
    pulse_width_ns: u16,
    resolution_m: f64,
    declared_points: u32,
    samples_db: Vec<f64>,
}

impl Trace {
    /// Build a trace from already-scaled samples; the declared count is the
    /// number of samples given.
    pub fn new(
        wavelength_nm: f64,
        pulse_width_ns: u16,
        resolution_m: f64,
        samples_db: Vec<f64>,
    ) -> Self {
        Self {
            wavelength_nm,
            pulse_width_ns,
            resolution_m,
            declared_points: u32::try_from(samples_db.len()).unwrap_or(u32::MAX),
            samples_db,
        }
    }

    fn from_slot(slot: &AcquisitionSlot, data: DataPoints) -> Self {
        Self {
            wavelength_nm: slot.wavelength_nm,
            pulse_width_ns: slot.pulse_width_ns,
            resolution_m: slot.resolution_m,
            declared_points: slot.point_count,
            samples_db: data.samples_db,
        }
    }

    /// Wavelength, nm.
    pub const fn wavelength_nm(&self) -> f64 {
        self.wavelength_nm
    }

    /// Pulse width, ns.
    pub const fn pulse_width_ns(&self) -> u16 {
        self.pulse_width_ns
    }

    /// Distance between consecutive samples, meters.
    pub const fn resolution_m(&self) -> f64 {
        self.resolution_m
    }

    /// Point count the acquisition slot declared. It can differ from
    /// [`Trace::sample_count`] when the instrument wrote fewer samples.
    pub const fn declared_sample_count(&self) -> u32 {
        self.declared_points
    }

    /// Number of samples.
    pub fn sample_count(&self) -> usize {
        self.samples_db.len()
    }

    /// Whether the trace has no samples.
    pub fn is_empty(&self) -> bool {
        self.samples_db.is_empty()
    }

    /// Samples in dB, launch first.
    pub fn samples_db(&self) -> &[f64] {
        &self.samples_db
    }

    /// Distance from launch of sample `index`, or `None` past the end.
    #[allow(clippy::cast_precision_loss)] // sample counts stay far below 2^52
    pub fn distance_m(&self, index: usize) -> Option<f64> {
        (index < self.samples_db.len()).then(|| index as f64 * self.resolution_m)
    }

    /// Power of sample `index`, dB.
    pub fn power_db(&self, index: usize) -> Option<f64> {
        self.samples_db.get(index).copied()
    }

    /// Sample index nearest below `distance_m`, clamped to the trace.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn index_at(&self, distance_m: f64) -> Option<usize> {
        let last = self.samples_db.len().checked_sub(1)?;
        if self.resolution_m <= 0.0 || !distance_m.is_finite() || distance_m <= 0.0 {
            return Some(0);
        }
        // Saturating float-to-int cast; clamped below.
        let index = (distance_m / self.resolution_m).floor() as usize;
        Some(index.min(last))
    }

    /// `(distance_m, power_db)` for every sample.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.downsample(1)
    }

    /// `(distance_m, power_db)` for every `stride`-th sample from launch.
    ///
    /// A stride of zero is treated as one.
    #[allow(clippy::cast_precision_loss)]
    pub fn downsample(&self, stride: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        let resolution = self.resolution_m;
        self.samples_db
            .iter()
            .enumerate()
            .step_by(stride.max(1))
            .map(move |(i, &db)| (i as f64 * resolution, db))
    }
}

/// Pair data-points block *k* with acquisition slot *k* across all `FxdParams`
/// blocks, in file order.
///
/// Unpaired data blocks are skipped with a warning; no slots or no data give
/// an empty list.
pub fn assemble_traces(fixed: &[FixedParameters], data: Vec<DataPoints>) -> Vec<Trace> {
    let slots: Vec<&AcquisitionSlot> = fixed.iter().flat_map(|f| f.slots.iter()).collect();
    let mut traces = Vec::with_capacity(data.len().min(slots.len()));
    for (k, points) in data.into_iter().enumerate() {
        let Some(slot) = slots.get(k) else {
            warn!(
                block_index = k,
                slots = slots.len(),
                "data points block has no acquisition slot; skipped"
            );
            continue;
        };
        if u64::from(slot.point_count) != points.samples_db.len() as u64 {
            debug!(
                slot = k,
                slot_points = slot.point_count,
                samples = points.samples_db.len(),
                "slot point count differs from data block"
            );
        }
        traces.push(Trace::from_slot(slot, points));
    }
    traces
}
