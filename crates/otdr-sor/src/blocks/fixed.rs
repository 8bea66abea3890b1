// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `FxdParams`: acquisition settings.
//!
//! ```text
//! field                          type        scale     rev
//! timestamp                      u32         unix s    1, 2
//! distance units                 2 chr                 1, 2
//! actual wavelength              u16         /10 nm    1, 2
//! acquisition offset             i32                   1, 2
//! acquisition offset distance    i32                   2
//! pulse width count N            u16                   1, 2
//! pulse widths                   N x u16     ns        1, 2
//! data spacing                   N x u32     100 ps    1, 2
//! points per pulse width         N x u32               1, 2
//! group index                    u32         /100000   1, 2
//! backscatter coefficient        u16         /-10 dB   1, 2
//! number of averages             u32                   1, 2
//! averaging time                 u16         /10 s     2
//! acquisition range              u32         100 ps    1, 2
//! acquisition range distance     i32         units     2
//! front panel offset             i32                   1, 2
//! noise floor level              u16         /-1000 dB 1, 2
//! noise floor scale factor       i16                   1, 2
//! power offset first point       u16         /1000 dB  1, 2
//! loss threshold                 u16         /1000 dB  1, 2
//! reflectance threshold          u16         /-1000 dB 1, 2
//! end-of-fiber threshold         u16         /1000 dB  1, 2
//! trace type                     2 chr                 2
//! window coordinates             4 x i32     optional  2
//! ```

use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, CursorError, Scale};
use crate::map::FormatVersion;

/// Speed of light in vacuum, meters per microsecond.
pub const SPEED_OF_LIGHT_M_PER_US: f64 = 299.792_458;

/// Data spacing is stored in 100 ps per 10000 points: 1e-8 µs per unit.
const SPACING_TO_US: f64 = 1e-8;

/// Times of travel are stored in 100 ps units: 1e-4 µs.
const TIME_TO_US: f64 = 1e-4;

/// Distance unit system declared by the instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnit {
    /// `mt`
    #[default]
    Meters,
    /// `km`
    Kilometers,
    /// `mi`
    Miles,
    /// `ft`
    Feet,
    /// `kf`
    Kilofeet,
    /// Anything else, kept as written.
    Other(String),
}

impl DistanceUnit {
    /// Classify a two-letter code.
    pub fn from_code(code: &str) -> Self {
        match code {
            "mt" => Self::Meters,
            "km" => Self::Kilometers,
            "mi" => Self::Miles,
            "ft" => Self::Feet,
            "kf" => Self::Kilofeet,
            other => Self::Other(other.to_string()),
        }
    }

    /// Two-letter code.
    pub fn code(&self) -> &str {
        match self {
            Self::Meters => "mt",
            Self::Kilometers => "km",
            Self::Miles => "mi",
            Self::Feet => "ft",
            Self::Kilofeet => "kf",
            Self::Other(code) => code,
        }
    }

    /// Meters per one unit. Unknown units are taken as meters.
    pub fn meters_per_unit(&self) -> f64 {
        match self {
            Self::Meters | Self::Other(_) => 1.0,
            Self::Kilometers => 1_000.0,
            Self::Miles => 1_609.344,
            Self::Feet => 0.3048,
            Self::Kilofeet => 304.8,
        }
    }
}

/// One pulse-width / wavelength acquisition slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSlot {
    /// Wavelength of the owning block, nm.
    pub wavelength_nm: f64,
    /// Pulse width, ns.
    pub pulse_width_ns: u16,
    /// Raw data spacing (100 ps per 10000 points).
    pub data_spacing: u32,
    /// Declared number of points.
    pub point_count: u32,
    /// Sample spacing along the fiber, meters.
    pub resolution_m: f64,
}

/// Decoded `FxdParams` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedParameters {
    /// Acquisition time, unix seconds.
    pub timestamp: u32,
    /// Declared unit system.
    pub units: DistanceUnit,
    /// Actual wavelength, nm.
    pub wavelength_nm: f64,
    /// Acquisition offset, raw.
    pub acquisition_offset: i32,
    /// Acquisition offset distance, raw (revision 2).
    pub acquisition_offset_distance: i32,
    /// Pulse-width slots in declared order.
    pub slots: Vec<AcquisitionSlot>,
    /// Group index of refraction.
    pub group_index: f64,
    /// Backscatter coefficient, dB.
    pub backscatter_db: f64,
    /// Number of averages.
    pub averages: u32,
    /// Averaging time, seconds (revision 2).
    pub averaging_time_s: f64,
    /// Acquisition range, 100 ps.
    pub acquisition_range: u32,
    /// Acquisition range distance in declared units (revision 2).
    pub acquisition_range_distance: i32,
    /// Front panel offset, raw.
    pub front_panel_offset: i32,
    /// Noise floor level, dB.
    pub noise_floor_db: f64,
    /// Noise floor scale factor.
    pub noise_floor_scale: i16,
    /// Power offset of the first point, dB.
    pub power_offset_db: f64,
    /// Loss threshold, dB.
    pub loss_threshold_db: f64,
    /// Reflectance threshold, dB.
    pub reflectance_threshold_db: f64,
    /// End-of-fiber threshold, dB.
    pub eof_threshold_db: f64,
    /// Two-letter trace type (revision 2).
    pub trace_type: String,
    /// Window coordinates, when present.
    pub window: Option<[i32; 4]>,
}

/// Meters per sample for a raw data spacing.
pub(crate) fn resolution_m(data_spacing: u32, group_index: f64) -> f64 {
    if group_index <= 0.0 {
        return 0.0;
    }
    f64::from(data_spacing) * SPACING_TO_US * SPEED_OF_LIGHT_M_PER_US / group_index
}

impl FixedParameters {
    /// Convert a time of travel in 100 ps units to meters from launch.
    ///
    /// Returns 0 when the group index is not positive.
    pub fn time_to_meters(&self, time_100ps: f64) -> f64 {
        if self.group_index <= 0.0 {
            return 0.0;
        }
        time_100ps * TIME_TO_US * SPEED_OF_LIGHT_M_PER_US / self.group_index
    }

    /// Acquisition range distance converted to meters.
    pub fn acquisition_range_distance_m(&self) -> f64 {
        f64::from(self.acquisition_range_distance) * self.units.meters_per_unit()
    }

    /// Acquisition range (a time) converted to meters.
    pub fn acquisition_range_m(&self) -> f64 {
        self.time_to_meters(f64::from(self.acquisition_range))
    }

    /// First slot, if any.
    pub fn primary_slot(&self) -> Option<&AcquisitionSlot> {
        self.slots.first()
    }
}

fn read_n<'a, T>(
    cur: &mut Cursor<'a>,
    n: usize,
    mut read: impl FnMut(&mut Cursor<'a>) -> Result<T, CursorError>,
) -> Result<Vec<T>, CursorError> {
    let mut out = Vec::with_capacity(n.min(cur.remaining()));
    for _ in 0..n {
        out.push(read(cur)?);
    }
    Ok(out)
}

pub(super) fn decode(
    cur: &mut Cursor<'_>,
    version: FormatVersion,
) -> Result<FixedParameters, CursorError> {
    let v2 = version == FormatVersion::V2;

    let timestamp = cur.read_u32()?;
    let units = DistanceUnit::from_code(&cur.read_fixed_str(2)?);
    let wavelength_nm = cur.read_fixed_u16(Scale::TENTHS)?;
    let acquisition_offset = cur.read_i32()?;
    let acquisition_offset_distance = if v2 { cur.read_i32()? } else { 0 };

    let n = usize::from(cur.read_u16()?);
    let pulses = read_n(cur, n, |c| c.read_u16())?;
    let spacings = read_n(cur, n, |c| c.read_u32())?;
    let counts = read_n(cur, n, |c| c.read_u32())?;

    let group_index = cur.read_fixed_u32(Scale::HUNDRED_THOUSANDTHS)?;
    let backscatter_db = -cur.read_fixed_u16(Scale::TENTHS)?;
    let averages = cur.read_u32()?;
    let averaging_time_s = if v2 {
        cur.read_fixed_u16(Scale::TENTHS)?
    } else {
        0.0
    };
    let acquisition_range = cur.read_u32()?;
    let acquisition_range_distance = if v2 { cur.read_i32()? } else { 0 };
    let front_panel_offset = cur.read_i32()?;
    let noise_floor_db = -cur.read_fixed_u16(Scale::THOUSANDTHS)?;
    let noise_floor_scale = cur.read_i16()?;
    let power_offset_db = cur.read_fixed_u16(Scale::THOUSANDTHS)?;
    let loss_threshold_db = cur.read_fixed_u16(Scale::THOUSANDTHS)?;
    let reflectance_threshold_db = -cur.read_fixed_u16(Scale::THOUSANDTHS)?;
    let eof_threshold_db = cur.read_fixed_u16(Scale::THOUSANDTHS)?;

    let (trace_type, window) = if v2 {
        let trace_type = cur.read_fixed_str(2)?;
        let window = if cur.remaining() >= 16 {
            Some([cur.read_i32()?, cur.read_i32()?, cur.read_i32()?, cur.read_i32()?])
        } else {
            None
        };
        (trace_type, window)
    } else {
        (String::new(), None)
    };

    let slots = pulses
        .into_iter()
        .zip(spacings)
        .zip(counts)
        .map(|((pulse_width_ns, data_spacing), point_count)| AcquisitionSlot {
            wavelength_nm,
            pulse_width_ns,
            data_spacing,
            point_count,
            resolution_m: resolution_m(data_spacing, group_index),
        })
        .collect();

    Ok(FixedParameters {
        timestamp,
        units,
        wavelength_nm,
        acquisition_offset,
        acquisition_offset_distance,
        slots,
        group_index,
        backscatter_db,
        averages,
        averaging_time_s,
        acquisition_range,
        acquisition_range_distance,
        front_panel_offset,
        noise_floor_db,
        noise_floor_scale,
        power_offset_db,
        loss_threshold_db,
        reflectance_threshold_db,
        eof_threshold_db,
        trace_type,
        window,
    })
}
