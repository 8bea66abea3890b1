// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Plot-ready series built from decoded traces.

use otdr_sor::{OtdrFile, Trace};
use serde::{Deserialize, Serialize};

const HUE_MIN_NM: f64 = 800.0;
const HUE_MAX_NM: f64 = 2_000.0;
const HUE_MAX_DEG: f64 = 360.0;

/// One trace, downsampled for plotting.
///
/// Points are `(distance_m, -power_db)` so attenuation reads downward.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    /// Legend label, e.g. `1550nm`.
    pub name: String,
    /// Wavelength, nm.
    pub wavelength_nm: f64,
    /// Series colour hue in degrees, derived from the wavelength.
    pub hue_deg: f64,
    /// Plot points.
    pub points: Vec<(f64, f64)>,
}

impl ChartSeries {
    /// Every `stride`-th sample from launch up to `len - stride`.
    ///
    /// A stride of zero is treated as one. A trace shorter than the stride
    /// gives no points.
    pub fn from_trace(trace: &Trace, stride: usize) -> Self {
        let stride = stride.max(1);
        let points = trace
            .sample_count()
            .checked_sub(stride)
            .map(|last| {
                (0..=last)
                    .step_by(stride)
                    .filter_map(|i| Some((trace.distance_m(i)?, -trace.power_db(i)?)))
                    .collect()
            })
            .unwrap_or_default();
        let wavelength_nm = trace.wavelength_nm();
        Self {
            name: format!("{wavelength_nm}nm"),
            wavelength_nm,
            hue_deg: hue_for_wavelength(wavelength_nm),
            points,
        }
    }

    /// One series per trace, in file order.
    pub fn for_file(file: &OtdrFile, stride: usize) -> Vec<Self> {
        file.traces()
            .iter()
            .map(|trace| Self::from_trace(trace, stride))
            .collect()
    }
}

/// Map 800..2000 nm onto 0..360 degrees, clamped.
pub fn hue_for_wavelength(wavelength_nm: f64) -> f64 {
    let t = (wavelength_nm - HUE_MIN_NM) / (HUE_MAX_NM - HUE_MIN_NM);
    (t * HUE_MAX_DEG).clamp(0.0, HUE_MAX_DEG)
}

#[cfg(test)]
mod tests {
    use super::*;
    use otdr_dry_tests::two_wavelength_file;
    use otdr_sor::decode;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn stride_stops_at_len_minus_stride() {
        let trace = Trace::new(1550.0, 100, 2.0, (0..64).map(f64::from).collect());
        let series = ChartSeries::from_trace(&trace, 10);
        let xs: Vec<f64> = series.points.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert!(close(series.points[1].1, -10.0));
        assert_eq!(series.name, "1550nm");
    }

    #[test]
    fn zero_stride_is_one() {
        let trace = Trace::new(1310.0, 100, 1.0, vec![1.0, 2.0, 3.0]);
        let series = ChartSeries::from_trace(&trace, 0);
        assert_eq!(series.points, vec![(0.0, -1.0), (1.0, -2.0), (2.0, -3.0)]);
    }

    #[test]
    fn short_trace_has_no_points() {
        let trace = Trace::new(1310.0, 100, 1.0, vec![1.0, 2.0]);
        assert!(ChartSeries::from_trace(&trace, 5).points.is_empty());
        let empty = Trace::new(1310.0, 100, 1.0, Vec::new());
        assert!(ChartSeries::from_trace(&empty, 1).points.is_empty());
    }

    #[test]
    fn hue_is_clamped() {
        assert!(close(hue_for_wavelength(800.0), 0.0));
        assert!(close(hue_for_wavelength(1400.0), 180.0));
        assert!(close(hue_for_wavelength(650.0), 0.0));
        assert!(close(hue_for_wavelength(2_400.0), 360.0));
    }

    #[test]
    fn one_series_per_trace() {
        let file = decode(&two_wavelength_file()).unwrap();
        let series = ChartSeries::for_file(&file, 1);
        let names: Vec<&str> = series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["1310nm", "1550nm"]);
        assert_eq!(series[0].points.len(), 64);
        assert!(series[0].hue_deg < series[1].hue_deg);
    }
}
