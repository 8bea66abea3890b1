// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Block fixtures and the SR-4731 file assembler.
//!
//! Each fixture struct mirrors one standard block and serializes its body in
//! the field order the decoder expects for the chosen [`LayoutVersion`].
//! [`SorBuilder`] then prepends the directory block and, if requested,
//! appends a `Cksum` block with a correct CRC-16/CCITT-FALSE value.

use crate::writer::ByteWriter;

/// File layout generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutVersion {
    /// Revision 1.x: no `Map` marker, no per-block name headers.
    V1,
    /// Revision 2.x: `"Map\0"` marker, every block body starts with its name.
    V2,
}

impl LayoutVersion {
    /// Default revision number written to the map and each block.
    pub const fn default_revision(self) -> u16 {
        match self {
            Self::V1 => 100,
            Self::V2 => 200,
        }
    }
}

/// CRC-16/CCITT-FALSE (poly 0x1021, init 0xFFFF), as written by instruments.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// `GenParams` block contents.
#[derive(Debug, Clone)]
pub struct GeneralFixture {
    /// Two-letter language code.
    pub language: String,
    /// Cable identifier.
    pub cable_id: String,
    /// Fiber identifier.
    pub fiber_id: String,
    /// ITU-T fiber type code (V2 only).
    pub fiber_type: u16,
    /// Nominal wavelength in nm.
    pub wavelength_nm: u16,
    /// Originating location.
    pub location_a: String,
    /// Terminating location.
    pub location_b: String,
    /// Cable code.
    pub cable_code: String,
    /// Two-letter build condition.
    pub build_condition: String,
    /// User offset (raw).
    pub user_offset: i32,
    /// User offset distance (V2 only, raw).
    pub user_offset_distance: i32,
    /// Operator name.
    pub operator: String,
    /// Free-text comment.
    pub comment: String,
}

impl Default for GeneralFixture {
    fn default() -> Self {
        Self {
            language: "EN".into(),
            cable_id: "CABLE-07".into(),
            fiber_id: "F012".into(),
            fiber_type: 652,
            wavelength_nm: 1550,
            location_a: "Exchange North".into(),
            location_b: "Cabinet 14".into(),
            cable_code: "SM-48".into(),
            build_condition: "BC".into(),
            user_offset: 0,
            user_offset_distance: 0,
            operator: "A. Splicer".into(),
            comment: "acceptance test".into(),
        }
    }
}

impl GeneralFixture {
    /// Serialize the block body (without the V2 name header).
    pub fn body(&self, layout: LayoutVersion) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.fixed(&self.language, 2)
            .cstr(&self.cable_id)
            .cstr(&self.fiber_id);
        if layout == LayoutVersion::V2 {
            w.u16(self.fiber_type);
        }
        w.u16(self.wavelength_nm)
            .cstr(&self.location_a)
            .cstr(&self.location_b)
            .cstr(&self.cable_code)
            .fixed(&self.build_condition, 2)
            .i32(self.user_offset);
        if layout == LayoutVersion::V2 {
            w.i32(self.user_offset_distance);
        }
        w.cstr(&self.operator).cstr(&self.comment);
        w.into_vec()
    }
}

/// `SupParams` block contents.
#[derive(Debug, Clone)]
pub struct SupplierFixture {
    /// Supplier (vendor) name.
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

impl Default for SupplierFixture {
    fn default() -> Self {
        Self {
            supplier: "Acme Photonics".into(),
            otdr_name: "OT-9000".into(),
            otdr_serial: "SN123456".into(),
            module_name: "QUAD-SM".into(),
            module_serial: "MOD-77".into(),
            software_version: "4.2.1".into(),
            other: String::new(),
        }
    }
}

impl SupplierFixture {
    /// Serialize the block body (identical for both layouts).
    pub fn body(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.cstr(&self.supplier)
            .cstr(&self.otdr_name)
            .cstr(&self.otdr_serial)
            .cstr(&self.module_name)
            .cstr(&self.module_serial)
            .cstr(&self.software_version)
            .cstr(&self.other);
        w.into_vec()
    }
}

/// `FxdParams` block contents.
#[derive(Debug, Clone)]
pub struct FixedFixture {
    /// Acquisition time (unix seconds).
    pub timestamp: u32,
    /// Two-letter distance unit code.
    pub units: String,
    /// Actual wavelength in 0.1 nm.
    pub wavelength_tenths_nm: u16,
    /// Acquisition offset (raw).
    pub acquisition_offset: i32,
    /// Acquisition offset distance (V2 only, raw).
    pub acquisition_offset_distance: i32,
    /// Pulse widths in ns, one per slot.
    pub pulse_widths: Vec<u16>,
    /// Data spacing per slot (100 ps per 10000 points).
    pub data_spacing: Vec<u32>,
    /// Number of points per slot.
    pub point_counts: Vec<u32>,
    /// Group index times 100000.
    pub group_index: u32,
    /// Backscatter coefficient in -0.1 dB.
    pub backscatter: u16,
    /// Number of averages.
    pub averages: u32,
    /// Averaging time in 0.1 s (V2 only).
    pub averaging_time: u16,
    /// Acquisition range (100 ps).
    pub acquisition_range: u32,
    /// Acquisition range distance (V2 only, raw).
    pub acquisition_range_distance: i32,
    /// Front panel offset (raw).
    pub front_panel_offset: i32,
    /// Noise floor level in -0.001 dB.
    pub noise_floor: u16,
    /// Noise floor scale factor.
    pub noise_floor_scale: i16,
    /// Power offset of the first point in 0.001 dB.
    pub power_offset: u16,
    /// Loss threshold in 0.001 dB.
    pub loss_threshold: u16,
    /// Reflectance threshold in -0.001 dB.
    pub reflectance_threshold: u16,
    /// End-of-fiber threshold in 0.001 dB.
    pub eof_threshold: u16,
    /// Two-letter trace type (V2 only).
    pub trace_type: String,
    /// Window coordinates (V2 only). `None` omits them.
    pub window: Option<[i32; 4]>,
}

impl Default for FixedFixture {
    fn default() -> Self {
        Self {
            timestamp: 1_700_000_000,
            units: "km".into(),
            wavelength_tenths_nm: 15500,
            acquisition_offset: 0,
            acquisition_offset_distance: 0,
            pulse_widths: vec![100],
            // 146800 * 1e-8 us * 299.792458 m/us / 1.468 = 0.29979... m
            data_spacing: vec![146_800],
            point_counts: vec![64],
            group_index: 146_800,
            backscatter: 800,
            averages: 1024,
            averaging_time: 150,
            acquisition_range: 2_000_000,
            acquisition_range_distance: 40,
            front_panel_offset: 0,
            noise_floor: 30_000,
            noise_floor_scale: 1,
            power_offset: 0,
            loss_threshold: 50,
            reflectance_threshold: 65_000,
            eof_threshold: 3_000,
            trace_type: "ST".into(),
            window: Some([0, 0, 0, 0]),
        }
    }
}

impl FixedFixture {
    /// Fixture for one wavelength with a single pulse-width slot.
    pub fn at_wavelength(tenths_nm: u16, points: u32) -> Self {
        Self {
            wavelength_tenths_nm: tenths_nm,
            point_counts: vec![points],
            ..Self::default()
        }
    }

    /// Serialize the block body (without the V2 name header).
    pub fn body(&self, layout: LayoutVersion) -> Vec<u8> {
        let v2 = layout == LayoutVersion::V2;
        let slots = u16::try_from(self.pulse_widths.len()).unwrap_or(u16::MAX);
        let mut w = ByteWriter::new();
        w.u32(self.timestamp)
            .fixed(&self.units, 2)
            .u16(self.wavelength_tenths_nm)
            .i32(self.acquisition_offset);
        if v2 {
            w.i32(self.acquisition_offset_distance);
        }
        w.u16(slots);
        for pw in &self.pulse_widths {
            w.u16(*pw);
        }
        for ds in &self.data_spacing {
            w.u32(*ds);
        }
        for n in &self.point_counts {
            w.u32(*n);
        }
        w.u32(self.group_index)
            .u16(self.backscatter)
            .u32(self.averages);
        if v2 {
            w.u16(self.averaging_time);
        }
        w.u32(self.acquisition_range);
        if v2 {
            w.i32(self.acquisition_range_distance);
        }
        w.i32(self.front_panel_offset)
            .u16(self.noise_floor)
            .i16(self.noise_floor_scale)
            .u16(self.power_offset)
            .u16(self.loss_threshold)
            .u16(self.reflectance_threshold)
            .u16(self.eof_threshold);
        if v2 {
            w.fixed(&self.trace_type, 2);
            if let Some(window) = self.window {
                for coord in window {
                    w.i32(coord);
                }
            }
        }
        w.into_vec()
    }
}

/// One key event record.
#[derive(Debug, Clone)]
pub struct EventFixture {
    /// Event number.
    pub number: u16,
    /// Time of travel (100 ps).
    pub time_of_travel: u32,
    /// Slope in 0.001 dB/km.
    pub slope: i16,
    /// Splice loss in 0.001 dB.
    pub splice_loss: i16,
    /// Reflectance in 0.001 dB.
    pub reflection_loss: i32,
    /// Eight-character event code.
    pub code: String,
    /// V2 marker positions.
    pub markers: [u32; 5],
    /// Comment text.
    pub comment: String,
}

impl EventFixture {
    /// A non-reflective event (splice) at `time_of_travel`.
    pub fn splice(number: u16, time_of_travel: u32, splice_loss: i16) -> Self {
        Self {
            number,
            time_of_travel,
            slope: 200,
            splice_loss,
            reflection_loss: 0,
            code: "0F9999LS".into(),
            markers: [0; 5],
            comment: String::new(),
        }
    }

    /// A reflective event (connector) at `time_of_travel`.
    pub fn connector(number: u16, time_of_travel: u32, splice_loss: i16) -> Self {
        Self {
            reflection_loss: -45_000,
            code: "1F9999LS".into(),
            ..Self::splice(number, time_of_travel, splice_loss)
        }
    }

    /// An end-of-fiber event at `time_of_travel`.
    pub fn end_of_fiber(number: u16, time_of_travel: u32) -> Self {
        Self {
            reflection_loss: -14_000,
            code: "1E9999LS".into(),
            ..Self::splice(number, time_of_travel, 0)
        }
    }
}

/// `KeyEvents` block contents.
#[derive(Debug, Clone)]
pub struct KeyEventsFixture {
    /// Event records in file order.
    pub events: Vec<EventFixture>,
    /// Declared count override (defaults to `events.len()`).
    pub declared_count: Option<u16>,
    /// End-to-end loss in 0.001 dB.
    pub total_loss: i32,
    /// Loss start position (raw).
    pub loss_start: i32,
    /// Loss finish position (raw).
    pub loss_finish: u32,
    /// Optical return loss in 0.001 dB.
    pub orl: u16,
    /// ORL start position (raw).
    pub orl_start: i32,
    /// ORL finish position (raw).
    pub orl_finish: u32,
    /// Whether to write the trailing summary fields.
    pub include_summary: bool,
}

impl Default for KeyEventsFixture {
    fn default() -> Self {
        Self {
            events: Vec::new(),
            declared_count: None,
            total_loss: 0,
            loss_start: 0,
            loss_finish: 0,
            orl: 0,
            orl_start: 0,
            orl_finish: 0,
            include_summary: true,
        }
    }
}

impl KeyEventsFixture {
    /// Serialize the block body (without the V2 name header).
    pub fn body(&self, layout: LayoutVersion) -> Vec<u8> {
        let count = self
            .declared_count
            .unwrap_or_else(|| u16::try_from(self.events.len()).unwrap_or(u16::MAX));
        let mut w = ByteWriter::new();
        w.u16(count);
        for ev in &self.events {
            w.u16(ev.number)
                .u32(ev.time_of_travel)
                .i16(ev.slope)
                .i16(ev.splice_loss)
                .i32(ev.reflection_loss)
                .fixed(&ev.code, 8);
            if layout == LayoutVersion::V2 {
                for m in ev.markers {
                    w.u32(m);
                }
            }
            w.cstr(&ev.comment);
        }
        if self.include_summary {
            w.i32(self.total_loss)
                .i32(self.loss_start)
                .u32(self.loss_finish)
                .u16(self.orl)
                .i32(self.orl_start)
                .u32(self.orl_finish);
        }
        w.into_vec()
    }
}

/// One landmark record of the `LnkParams` block.
#[derive(Debug, Clone)]
pub struct LandmarkFixture {
    /// Landmark number.
    pub number: u16,
    /// Two-letter landmark code.
    pub code: String,
    /// Location (100 ps).
    pub location: i32,
    /// Related key event number.
    pub event_number: u16,
    /// GPS longitude in 1e-6 degrees.
    pub longitude: i32,
    /// GPS latitude in 1e-6 degrees.
    pub latitude: i32,
    /// Fiber correction factor (raw).
    pub fiber_correction: i16,
    /// Sheath marker entering the landmark.
    pub sheath_in: i32,
    /// Sheath marker leaving the landmark.
    pub sheath_out: i32,
    /// Two-letter sheath marker unit code.
    pub sheath_units: String,
    /// Mode field diameter (raw).
    pub mode_field_diameter: i16,
    /// Comment text.
    pub comment: String,
}

impl Default for LandmarkFixture {
    fn default() -> Self {
        Self {
            number: 1,
            code: "MH".into(),
            location: 10_000,
            event_number: 1,
            longitude: -122_419_400,
            latitude: 37_774_900,
            fiber_correction: 0,
            sheath_in: 1200,
            sheath_out: 1205,
            sheath_units: "mt".into(),
            mode_field_diameter: 92,
            comment: "manhole 3".into(),
        }
    }
}

/// `LnkParams` block contents.
#[derive(Debug, Clone, Default)]
pub struct LinkFixture {
    /// Landmarks in file order.
    pub landmarks: Vec<LandmarkFixture>,
}

impl LinkFixture {
    /// Serialize the block body (without the V2 name header).
    pub fn body(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.u16(u16::try_from(self.landmarks.len()).unwrap_or(u16::MAX));
        for lm in &self.landmarks {
            w.u16(lm.number)
                .fixed(&lm.code, 2)
                .i32(lm.location)
                .u16(lm.event_number)
                .i32(lm.longitude)
                .i32(lm.latitude)
                .i16(lm.fiber_correction)
                .i32(lm.sheath_in)
                .i32(lm.sheath_out)
                .fixed(&lm.sheath_units, 2)
                .i16(lm.mode_field_diameter)
                .cstr(&lm.comment);
        }
        w.into_vec()
    }
}

/// `DataPts` block contents: one or more scale-factor segments.
#[derive(Debug, Clone, Default)]
pub struct DataPointsFixture {
    /// `(scale_factor, raw_points)` segments in file order.
    pub segments: Vec<(u16, Vec<u16>)>,
    /// Declared total override (defaults to the sum of segment lengths).
    pub declared_total: Option<u32>,
}

impl DataPointsFixture {
    /// Single-segment trace with scale factor 1000 (1.0).
    pub fn single(points: Vec<u16>) -> Self {
        Self {
            segments: vec![(1000, points)],
            declared_total: None,
        }
    }

    /// Linear backscatter slope: `start + i * step` raw units.
    pub fn linear(count: u16, start: u16, step: u16) -> Self {
        let points = (0..count)
            .map(|i| start.saturating_add(i.saturating_mul(step)))
            .collect();
        Self::single(points)
    }

    /// Serialize the block body (without the V2 name header).
    pub fn body(&self) -> Vec<u8> {
        let total = self.declared_total.unwrap_or_else(|| {
            let sum: usize = self.segments.iter().map(|(_, p)| p.len()).sum();
            u32::try_from(sum).unwrap_or(u32::MAX)
        });
        let mut w = ByteWriter::new();
        w.u32(total)
            .u16(u16::try_from(self.segments.len()).unwrap_or(u16::MAX));
        for (scale, points) in &self.segments {
            w.u32(u32::try_from(points.len()).unwrap_or(u32::MAX))
                .u16(*scale);
            for p in points {
                w.u16(*p);
            }
        }
        w.into_vec()
    }
}

#[derive(Debug, Clone)]
struct PendingBlock {
    id: String,
    revision: u16,
    body: Vec<u8>,
    name_header: bool,
}

/// Assembles a complete trace file from block fixtures in insertion order.
///
/// # Example
///
/// ```
/// use otdr_dry_tests::{DataPointsFixture, FixedFixture, SorBuilder};
///
/// let bytes = SorBuilder::v2()
///     .fixed(&FixedFixture::at_wavelength(13100, 8))
///     .data_points(&DataPointsFixture::linear(8, 1000, 10))
///     .with_checksum()
///     .build();
/// assert_eq!(&bytes[..4], b"Map\0");
/// ```
#[derive(Debug, Clone)]
pub struct SorBuilder {
    layout: LayoutVersion,
    map_revision: u16,
    blocks: Vec<PendingBlock>,
    checksum: bool,
}

impl SorBuilder {
    /// Start a revision 2 file.
    pub fn v2() -> Self {
        Self::new(LayoutVersion::V2)
    }

    /// Start a revision 1 file.
    pub fn v1() -> Self {
        Self::new(LayoutVersion::V1)
    }

    /// Start a file with the given layout.
    pub fn new(layout: LayoutVersion) -> Self {
        Self {
            layout,
            map_revision: layout.default_revision(),
            blocks: Vec::new(),
            checksum: false,
        }
    }

    /// Override the revision written into the map header.
    pub fn map_revision(mut self, revision: u16) -> Self {
        self.map_revision = revision;
        self
    }

    fn push(mut self, id: &str, body: Vec<u8>) -> Self {
        let revision = self.layout.default_revision();
        self.blocks.push(PendingBlock {
            id: id.to_string(),
            revision,
            body,
            name_header: self.layout == LayoutVersion::V2,
        });
        self
    }

    /// Append a `GenParams` block.
    pub fn general(self, fixture: &GeneralFixture) -> Self {
        let body = fixture.body(self.layout);
        self.push("GenParams", body)
    }

    /// Append a `SupParams` block.
    pub fn supplier(self, fixture: &SupplierFixture) -> Self {
        self.push("SupParams", fixture.body())
    }

    /// Append a `FxdParams` block.
    pub fn fixed(self, fixture: &FixedFixture) -> Self {
        let body = fixture.body(self.layout);
        self.push("FxdParams", body)
    }

    /// Append a `KeyEvents` block.
    pub fn key_events(self, fixture: &KeyEventsFixture) -> Self {
        let body = fixture.body(self.layout);
        self.push("KeyEvents", body)
    }

    /// Append a `LnkParams` block.
    pub fn link(self, fixture: &LinkFixture) -> Self {
        self.push("LnkParams", fixture.body())
    }

    /// Append a `DataPts` block.
    pub fn data_points(self, fixture: &DataPointsFixture) -> Self {
        self.push("DataPts", fixture.body())
    }

    /// Append an arbitrary block; `body` is written verbatim with no name header.
    pub fn raw_block(mut self, id: &str, revision: u16, body: Vec<u8>) -> Self {
        self.blocks.push(PendingBlock {
            id: id.to_string(),
            revision,
            body,
            name_header: false,
        });
        self
    }

    /// Override the revision of the most recently appended block.
    pub fn revision(mut self, revision: u16) -> Self {
        if let Some(last) = self.blocks.last_mut() {
            last.revision = revision;
        }
        self
    }

    /// Append a trailing `Cksum` block carrying a correct CRC.
    pub fn with_checksum(mut self) -> Self {
        self.checksum = true;
        self
    }

    /// Directory entries as `(id, revision, length)`, for assertions.
    pub fn directory(&self) -> Vec<(String, u16, u32)> {
        self.materialize()
            .into_iter()
            .map(|(id, rev, bytes)| {
                (id, rev, u32::try_from(bytes.len()).unwrap_or(u32::MAX))
            })
            .collect()
    }

    fn materialize(&self) -> Vec<(String, u16, Vec<u8>)> {
        let mut out: Vec<(String, u16, Vec<u8>)> = self
            .blocks
            .iter()
            .map(|b| {
                let mut w = ByteWriter::new();
                if b.name_header {
                    w.cstr(&b.id);
                }
                w.bytes(&b.body);
                (b.id.clone(), b.revision, w.into_vec())
            })
            .collect();
        if self.checksum {
            let mut w = ByteWriter::new();
            if self.layout == LayoutVersion::V2 {
                w.cstr("Cksum");
            }
            w.u16(0);
            out.push((
                "Cksum".to_string(),
                self.layout.default_revision(),
                w.into_vec(),
            ));
        }
        out
    }

    /// Serialize the directory and all blocks.
    pub fn build(self) -> Vec<u8> {
        let blocks = self.materialize();

        let mut entries = ByteWriter::new();
        for (id, revision, bytes) in &blocks {
            entries
                .cstr(id)
                .u16(*revision)
                .u32(u32::try_from(bytes.len()).unwrap_or(u32::MAX));
        }

        let marker_len = if self.layout == LayoutVersion::V2 { 4 } else { 0 };
        let map_size = marker_len + 2 + 4 + 2 + entries.len();
        let block_count = u16::try_from(blocks.len() + 1).unwrap_or(u16::MAX);

        let mut w = ByteWriter::new();
        if self.layout == LayoutVersion::V2 {
            w.cstr("Map");
        }
        w.u16(self.map_revision)
            .u32(u32::try_from(map_size).unwrap_or(u32::MAX))
            .u16(block_count)
            .bytes(&entries.into_vec());
        for (_, _, bytes) in &blocks {
            w.bytes(bytes);
        }

        let mut out = w.into_vec();
        if self.checksum && out.len() >= 2 {
            let split = out.len() - 2;
            let crc = crc16_ccitt_false(&out[..split]);
            out[split..].copy_from_slice(&crc.to_le_bytes());
        }
        out
    }
}
