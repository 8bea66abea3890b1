// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `KeyEvents`: instrument-detected events and the link summary.
//!
//! ```text
//! event count                    u16
//! per event:
//!   number                       u16
//!   time of travel               u32      100 ps
//!   slope                        i16      /1000 dB/km
//!   splice loss                  i16      /1000 dB
//!   reflectance                  i32      /1000 dB
//!   event code                   8 chr
//!   markers (rev 2 only)         5 x u32
//!   comment                      string
//! summary (optional):
//!   end-to-end loss              i32      /1000 dB
//!   loss start, finish           i32, u32
//!   optical return loss          u16      /1000 dB
//!   ORL start, finish            i32, u32
//! ```
//!
//! The block decoder keeps times raw. [`KeyEvents::normalize`] converts them
//! to meters once the group index from `FxdParams` is known.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fixed::FixedParameters;
use super::optional_text;
use crate::cursor::{Cursor, CursorError, Scale};
use crate::map::FormatVersion;

const SUMMARY_LEN: usize = 4 + 4 + 4 + 2 + 4 + 4;
const MIN_RECORD_LEN: usize = 2 + 4 + 2 + 2 + 4 + 8;

/// Revision 2 marker positions around an event, raw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMarkers {
    /// End of the previous event.
    pub end_of_previous: u32,
    /// Start of this event.
    pub start_of_current: u32,
    /// End of this event.
    pub end_of_current: u32,
    /// Start of the next event.
    pub start_of_next: u32,
    /// Peak of this event.
    pub peak: u32,
}

/// Event classification from the first two characters of the event code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// `0x`: splice, bend or other loss-only event.
    NonReflective,
    /// `1x`: connector, mechanical splice, crack.
    Reflective,
    /// `2x`: reflective event whose peak saturated the receiver.
    Saturated,
    /// `xE`: end of fiber.
    EndOfFiber,
    /// Anything else.
    Other,
}

impl EventKind {
    /// Classify an eight-character event code.
    pub fn from_code(code: &str) -> Self {
        let mut chars = code.chars();
        let kind = chars.next();
        let mode = chars.next();
        if mode == Some('E') {
            return Self::EndOfFiber;
        }
        match kind {
            Some('0') => Self::NonReflective,
            Some('1') => Self::Reflective,
            Some('2') => Self::Saturated,
            _ => Self::Other,
        }
    }

    /// Short label for tables.
    pub const fn label(self) -> &'static str {
        match self {
            Self::NonReflective => "non-reflective",
            Self::Reflective => "reflective",
            Self::Saturated => "saturated",
            Self::EndOfFiber => "end of fiber",
            Self::Other => "other",
        }
    }
}

/// One event as stored in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEventRecord {
    /// Event number.
    pub number: u16,
    /// Time of travel, 100 ps.
    pub time_of_travel: u32,
    /// Slope, dB/km.
    pub slope_db_per_km: f64,
    /// Splice loss, dB.
    pub splice_loss_db: f64,
    /// Reflectance, dB.
    pub reflectance_db: f64,
    /// Eight-character event code.
    pub code: String,
    /// Marker positions (revision 2).
    pub markers: Option<EventMarkers>,
    /// Comment.
    pub comment: String,
}

/// Trailing link summary of the `KeyEvents` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEventSummary {
    /// Declared number of events.
    pub count: u16,
    /// End-to-end loss, dB. Zero means the instrument did not report it.
    pub end_to_end_loss_db: f64,
    /// Loss measurement start, raw.
    pub loss_start: i32,
    /// Loss measurement finish, raw.
    pub loss_finish: u32,
    /// Optical return loss, dB.
    pub optical_return_loss_db: f64,
    /// ORL measurement start, raw.
    pub orl_start: i32,
    /// ORL measurement finish, raw.
    pub orl_finish: u32,
}

impl KeyEventSummary {
    /// Whether the instrument filled in the end-to-end loss.
    pub fn reports_end_to_end_loss(&self) -> bool {
        self.end_to_end_loss_db != 0.0
    }
}

/// Decoded `KeyEvents` block, times still raw.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEventBlock {
    /// Records in file order.
    pub records: Vec<KeyEventRecord>,
    /// Summary; zeroed when the block omits it.
    pub summary: KeyEventSummary,
}

/// A key event with its distance resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyEvent {
    /// Event number.
    pub number: u16,
    /// Time of travel, 100 ps.
    pub time_of_travel: u32,
    /// Distance from launch, meters.
    pub distance_m: f64,
    /// Eight-character event code.
    pub code: String,
    /// Classification derived from the code.
    pub kind: EventKind,
    /// Slope, dB/km.
    pub slope_db_per_km: f64,
    /// Splice loss, dB.
    pub splice_loss_db: f64,
    /// Reflectance, dB.
    pub reflectance_db: f64,
    /// Running sum of splice losses up to and including this event, dB.
    pub cumulative_loss_db: f64,
    /// Marker positions (revision 2).
    pub markers: Option<EventMarkers>,
    /// Comment.
    pub comment: String,
}

impl KeyEvent {
    /// Reflective event whose peak saturated the receiver (code `2x`).
    pub fn is_saturated(&self) -> bool {
        self.kind == EventKind::Saturated
    }

    /// Event added (`xA`) or moved (`xM`) by the operator.
    pub fn is_manual(&self) -> bool {
        matches!(self.code.chars().nth(1), Some('A' | 'M'))
    }
}

/// Summary plus events in file order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyEvents {
    /// Link summary.
    pub summary: KeyEventSummary,
    /// Events in file order.
    pub events: Vec<KeyEvent>,
}

impl KeyEvents {
    /// Resolve raw records against the acquisition's group index.
    pub fn normalize(block: KeyEventBlock, fixed: &FixedParameters) -> Self {
        let mut cumulative = 0.0;
        let events = block
            .records
            .into_iter()
            .map(|rec| {
                cumulative += rec.splice_loss_db;
                KeyEvent {
                    number: rec.number,
                    time_of_travel: rec.time_of_travel,
                    distance_m: fixed.time_to_meters(f64::from(rec.time_of_travel)),
                    kind: EventKind::from_code(&rec.code),
                    code: rec.code,
                    slope_db_per_km: rec.slope_db_per_km,
                    splice_loss_db: rec.splice_loss_db,
                    reflectance_db: rec.reflectance_db,
                    cumulative_loss_db: cumulative,
                    markers: rec.markers,
                    comment: rec.comment,
                }
            })
            .collect();
        Self {
            summary: block.summary,
            events,
        }
    }

    /// Number of decoded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events were decoded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The end-of-fiber event, if any.
    pub fn end_of_fiber(&self) -> Option<&KeyEvent> {
        self.events.iter().find(|e| e.kind == EventKind::EndOfFiber)
    }
}

fn decode_record(
    cur: &mut Cursor<'_>,
    version: FormatVersion,
) -> Result<KeyEventRecord, CursorError> {
    let number = cur.read_u16()?;
    let time_of_travel = cur.read_u32()?;
    let slope_db_per_km = cur.read_fixed_i16(Scale::THOUSANDTHS)?;
    let splice_loss_db = cur.read_fixed_i16(Scale::THOUSANDTHS)?;
    let reflectance_db = cur.read_fixed_i32(Scale::THOUSANDTHS)?;
    let code = cur.read_fixed_str(8)?;
    let markers = if version == FormatVersion::V2 {
        Some(EventMarkers {
            end_of_previous: cur.read_u32()?,
            start_of_current: cur.read_u32()?,
            end_of_current: cur.read_u32()?,
            start_of_next: cur.read_u32()?,
            peak: cur.read_u32()?,
        })
    } else {
        None
    };
    let comment = optional_text(cur)?;
    Ok(KeyEventRecord {
        number,
        time_of_travel,
        slope_db_per_km,
        splice_loss_db,
        reflectance_db,
        code,
        markers,
        comment,
    })
}

pub(super) fn decode(
    cur: &mut Cursor<'_>,
    version: FormatVersion,
) -> Result<KeyEventBlock, CursorError> {
    let count = cur.read_u16()?;
    let mut records = Vec::with_capacity(usize::from(count).min(cur.remaining() / MIN_RECORD_LEN));
    for _ in 0..count {
        records.push(decode_record(cur, version)?);
    }

    let summary = if cur.remaining() >= SUMMARY_LEN {
        KeyEventSummary {
            count,
            end_to_end_loss_db: cur.read_fixed_i32(Scale::THOUSANDTHS)?,
            loss_start: cur.read_i32()?,
            loss_finish: cur.read_u32()?,
            optical_return_loss_db: cur.read_fixed_u16(Scale::THOUSANDTHS)?,
            orl_start: cur.read_i32()?,
            orl_finish: cur.read_u32()?,
        }
    } else {
        debug!(remaining = cur.remaining(), "key event summary absent");
        KeyEventSummary {
            count,
            ..KeyEventSummary::default()
        }
    };

    Ok(KeyEventBlock { records, summary })
}
