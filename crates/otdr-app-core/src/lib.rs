// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for OpenOTDR tools (trace records, link
//! summary, chart series, config, prefs, notices).
//! Keeps CLI and UI adapters thin and framework-agnostic.

pub mod chart;
pub mod config;
pub mod notice;
pub mod prefs;
pub mod record;
pub mod summary;

pub use chart::ChartSeries;
pub use notice::{Notice, NoticeKind, NoticeQueue};
pub use prefs::{InspectorPrefs, TraceFormat, PREFS_KEY};
pub use record::{decode_file, RecordError, TraceRecord};
pub use summary::{DistanceDisplay, EndToEndLoss, LinkSummary};
